//! Single-step font shrinking for tags whose text overflows its box.

use crate::fallback::show_fallback;
use crate::text::{TextMeasurer, TextStyle, collapse_whitespace};
use serde::Serialize;
use tagfit_core::geom::{parse_css_number, px};
use tagfit_core::{Document, NodeId, RuntimeHost, TagId, TagTree};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FitOutcome {
    MissingElement,
    Fits,
    Shrunk { from: f64, to: f64 },
    Fallback,
}

/// How many times wider the element's unwrapped content is than the room it has.
///
/// `white-space` is forced to `nowrap` for the measurement and restored afterwards. Margins
/// count, padding does not.
pub fn overflow_ratio(doc: &mut Document, measurer: &dyn TextMeasurer, element: NodeId) -> f64 {
    let original = doc
        .style_property(element, "white-space")
        .map(str::to_string);
    doc.set_style_property(element, "white-space", "nowrap");

    let margin = margin_px(doc, element, "margin-left") + margin_px(doc, element, "margin-right");
    let ratio = scroll_width(doc, measurer, element) / (doc.client_width(element) - margin);

    match original {
        Some(value) => doc.set_style_property(element, "white-space", value),
        None => {
            doc.remove_style_property(element, "white-space");
        }
    }
    ratio
}

/// Margins are read as whole pixels; anything unparseable is `0`.
fn margin_px(doc: &Document, element: NodeId, property: &str) -> f64 {
    doc.style_property(element, property)
        .and_then(parse_css_number)
        .map(f64::trunc)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Content width of the element, never less than its client width.
pub fn scroll_width(doc: &Document, measurer: &dyn TextMeasurer, element: NodeId) -> f64 {
    if !doc.is_rendered(element) {
        return 0.0;
    }
    let client = doc.client_width(element);
    let single_line = matches!(
        doc.style_property(element, "white-space").map(str::trim),
        Some("nowrap" | "pre")
    );
    if !single_line {
        return client;
    }
    let style = TextStyle {
        font_family: doc.style_property(element, "font-family").map(str::to_string),
        font_size: doc.font_size(element),
        font_weight: doc.style_property(element, "font-weight").map(str::to_string),
    };
    let text = collapse_whitespace(&doc.text_content(element));
    measurer.measure(&text, &style).width.max(client)
}

pub fn fit_one(
    tree: &TagTree,
    doc: &mut Document,
    host: &dyn RuntimeHost,
    measurer: &dyn TextMeasurer,
    id: TagId,
) -> FitOutcome {
    let Some(tag) = tree.get(id) else {
        return FitOutcome::MissingElement;
    };
    let Some(el) = tree.element(id, doc) else {
        tracing::warn!(tag = %tag.id, "resize skipped: no element");
        host.log("resize tag is missing element");
        return FitOutcome::MissingElement;
    };

    let minimum = tag.minimum_font_size.filter(|v| !v.is_nan()).unwrap_or(0.0);
    let starting = tag.font_size.unwrap_or_else(|| doc.font_size(el));
    let ratio = overflow_ratio(doc, measurer, el);
    if ratio.is_nan() || ratio <= 1.0 {
        return FitOutcome::Fits;
    }

    let candidate = (starting / ratio).floor();
    if candidate > minimum {
        tracing::debug!(tag = %tag.id, ratio, from = starting, to = candidate, "shrinking font");
        doc.set_style_property(el, "font-size", px(candidate));
        FitOutcome::Shrunk {
            from: starting,
            to: candidate,
        }
    } else {
        tracing::debug!(tag = %tag.id, ratio, candidate, minimum, "below minimum font size");
        show_fallback(tree, doc, host, id);
        FitOutcome::Fallback
    }
}

/// Fits every tag in `tags` that opted into autoresize.
pub fn autosize(
    tree: &TagTree,
    doc: &mut Document,
    host: &dyn RuntimeHost,
    measurer: &dyn TextMeasurer,
    tags: &[TagId],
) -> Vec<(TagId, FitOutcome)> {
    tags.iter()
        .copied()
        .filter(|id| tree.get(*id).is_some_and(|t| t.autoresize))
        .map(|id| (id, fit_one(tree, doc, host, measurer, id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::DeterministicTextMeasurer;
    use tagfit_core::RecordingHost;

    fn text_box(doc: &mut Document, text: &str) -> NodeId {
        let body = doc.body();
        let el = doc.create_element("div");
        doc.append_child(body, el);
        doc.set_style_property(el, "width", "100px");
        doc.set_style_property(el, "font-size", "40px");
        doc.set_inner_html(el, text);
        el
    }

    #[test]
    fn ratio_restores_original_white_space() {
        let mut doc = Document::new();
        let m = DeterministicTextMeasurer::default();
        let el = text_box(&mut doc, "too long");
        let ratio = overflow_ratio(&mut doc, &m, el);
        assert!((ratio - 1.92).abs() < 1e-9);
        assert_eq!(doc.style_property(el, "white-space"), None);

        doc.set_style_property(el, "white-space", "normal");
        overflow_ratio(&mut doc, &m, el);
        assert_eq!(doc.style_property(el, "white-space"), Some("normal"));
    }

    #[test]
    fn short_text_is_bounded_by_client_width() {
        let mut doc = Document::new();
        let m = DeterministicTextMeasurer::default();
        let el = text_box(&mut doc, "ok");
        assert_eq!(overflow_ratio(&mut doc, &m, el), 1.0);
    }

    #[test]
    fn margins_shrink_the_available_width() {
        let mut doc = Document::new();
        let m = DeterministicTextMeasurer::default();
        let el = text_box(&mut doc, "ok");
        doc.set_style_property(el, "margin-left", "10.9px");
        doc.set_style_property(el, "margin-right", "auto");
        assert_eq!(overflow_ratio(&mut doc, &m, el), 100.0 / 90.0);
    }

    #[test]
    fn hidden_element_never_shrinks() {
        let mut doc = Document::new();
        let m = DeterministicTextMeasurer::default();
        let el = text_box(&mut doc, "far far far too long");
        doc.set_style_property(el, "display", "none");
        assert!(overflow_ratio(&mut doc, &m, el).is_nan());
    }
}
