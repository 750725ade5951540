//! `[token]` replacement inside tag text.

use crate::data::TokenData;
use crate::fallback::show_fallback;
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tagfit_core::{Document, RuntimeHost, TagId, TagTree};

/// Result of substituting one text against the token data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substitution {
    /// The text holds no tokens.
    Untouched,
    Replaced(String),
    /// At least one token has no value; names are listed in order of appearance.
    Missing(Vec<String>),
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([0-9A-Za-z_\s.-]+)\]").expect("valid regex"))
}

/// Token names in `text`, in order, duplicates included.
pub fn tokens(text: &str) -> Vec<&str> {
    token_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

pub fn substitute_text(text: &str, data: &TokenData) -> Substitution {
    let names = tokens(text);
    if names.is_empty() {
        return Substitution::Untouched;
    }
    let missing: Vec<String> = names
        .into_iter()
        .filter(|name| !data.get(*name).is_some_and(|v| v.is_present()))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Substitution::Missing(missing);
    }
    let replaced = token_regex().replace_all(text, |caps: &Captures<'_>| {
        data.get(&caps[1])
            .map(ToString::to_string)
            .unwrap_or_default()
    });
    Substitution::Replaced(replaced.into_owned())
}

/// Replaces tokens in each tag's text and element content. A tag with any unresolved token keeps
/// its text and is switched to its fallback instead.
pub fn substitute(
    tree: &mut TagTree,
    doc: &mut Document,
    host: &dyn RuntimeHost,
    tags: &[TagId],
    data: &TokenData,
) {
    for &id in tags {
        let Some(text) = tree.get(id).and_then(|t| t.text.clone()) else {
            continue;
        };
        match substitute_text(&text, data) {
            Substitution::Untouched => {}
            Substitution::Replaced(value) => {
                match tree.element(id, doc) {
                    Some(el) => doc.set_inner_html(el, value.clone()),
                    None => host.log("replace tag is missing element"),
                }
                if let Some(tag) = tree.get_mut(id) {
                    tracing::debug!(tag = %tag.id, text = %value, "tokens replaced");
                    tag.text = Some(value);
                }
            }
            Substitution::Missing(names) => {
                for name in &names {
                    host.log(&format!("missing replacement value for {name}"));
                }
                show_fallback(tree, doc, host, id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataValue, token_data};

    #[test]
    fn token_names_allow_spaces_dots_and_dashes() {
        assert_eq!(
            tokens("[a] and [first name] [x.y-z] [no!]"),
            ["a", "first name", "x.y-z"]
        );
        assert!(tokens("[]").is_empty());
    }

    #[test]
    fn text_without_tokens_is_untouched() {
        assert_eq!(
            substitute_text("plain", &TokenData::new()),
            Substitution::Untouched
        );
    }

    #[test]
    fn every_occurrence_is_replaced() {
        let data = token_data([("n", DataValue::from(3.0))]);
        assert_eq!(
            substitute_text("[n] of [n]", &data),
            Substitution::Replaced("3 of 3".to_string())
        );
    }

    #[test]
    fn empty_string_counts_as_a_value() {
        let data = token_data([("n", "")]);
        assert_eq!(
            substitute_text("x[n]y", &data),
            Substitution::Replaced("xy".to_string())
        );
    }

    #[test]
    fn absent_values_are_reported_in_order() {
        let data = token_data([("b", DataValue::Null), ("c", DataValue::from("ok"))]);
        assert_eq!(
            substitute_text("[a] [b] [c]", &data),
            Substitution::Missing(vec!["a".to_string(), "b".to_string()])
        );
    }
}
