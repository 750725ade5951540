use tagfit_core::{Document, RuntimeHost, TagId, TagTree};

/// One tag or a collection of tags.
pub trait IntoTagSet {
    fn into_tag_set(self) -> Vec<TagId>;
}

impl IntoTagSet for TagId {
    fn into_tag_set(self) -> Vec<TagId> {
        vec![self]
    }
}

impl IntoTagSet for Option<TagId> {
    fn into_tag_set(self) -> Vec<TagId> {
        self.into_iter().collect()
    }
}

impl IntoTagSet for &[TagId] {
    fn into_tag_set(self) -> Vec<TagId> {
        self.to_vec()
    }
}

impl IntoTagSet for Vec<TagId> {
    fn into_tag_set(self) -> Vec<TagId> {
        self
    }
}

impl IntoTagSet for &Vec<TagId> {
    fn into_tag_set(self) -> Vec<TagId> {
        self.clone()
    }
}

impl<const N: usize> IntoTagSet for [TagId; N] {
    fn into_tag_set(self) -> Vec<TagId> {
        self.to_vec()
    }
}

/// Shows each tag's fallback text, or hides the tag when it has none.
pub fn show_fallback(
    tree: &TagTree,
    doc: &mut Document,
    host: &dyn RuntimeHost,
    tags: impl IntoTagSet,
) {
    for id in tags.into_tag_set() {
        let Some(tag) = tree.get(id) else {
            continue;
        };
        let Some(el) = tree.element(id, doc) else {
            tracing::warn!(tag = %tag.id, "fallback skipped: no element");
            host.log("fallback tag is missing element");
            continue;
        };
        match tag.fallback() {
            Some(text) => {
                tracing::debug!(tag = %tag.id, "showing fallback text");
                doc.set_inner_html(el, text);
            }
            None => {
                tracing::debug!(tag = %tag.id, "hiding tag without fallback");
                doc.set_inner_html(el, "");
                doc.set_style_property(el, "display", "none");
            }
        }
    }
}
