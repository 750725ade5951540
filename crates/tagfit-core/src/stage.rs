//! Headless stage: materializes a serialized tag array as the document a creative ships with.

use crate::dom::{Document, NodeId};
use crate::geom::px;
use crate::tag::{TagKind, TagSource};
use crate::{DEFAULT_BINDING_ATTRIBUTE, DEFAULT_CONTAINER_ID, DEFAULT_SOURCE_CLASS};

#[derive(Debug, Clone)]
pub struct StageOptions {
    pub container_id: String,
    pub binding_attribute: String,
    pub source_class: String,
    pub width: f64,
    pub height: f64,
    pub top: f64,
    pub left: f64,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            container_id: DEFAULT_CONTAINER_ID.to_string(),
            binding_attribute: DEFAULT_BINDING_ATTRIBUTE.to_string(),
            source_class: DEFAULT_SOURCE_CLASS.to_string(),
            width: 300.0,
            height: 250.0,
            top: 0.0,
            left: 0.0,
        }
    }
}

/// Appends a creative container under `parent` and returns it.
///
/// The container holds a hidden source element with `tags_json` verbatim and one element per tag
/// (subtags nested inside their parent's element). When `tags_json` is not a tag array only the
/// container and the source element are created; the session reports the parse error.
pub fn build_stage(
    doc: &mut Document,
    parent: NodeId,
    tags_json: &str,
    options: &StageOptions,
) -> NodeId {
    let container = doc.create_element("div");
    doc.set_attribute(container, "id", options.container_id.as_str());
    doc.set_attribute(container, "width", px_number(options.width));
    doc.set_attribute(container, "height", px_number(options.height));
    doc.set_style_property(container, "position", "absolute");
    doc.set_style_property(container, "top", px(options.top));
    doc.set_style_property(container, "left", px(options.left));
    doc.set_style_property(container, "width", px(options.width));
    doc.set_style_property(container, "height", px(options.height));
    doc.append_child(parent, container);

    let source = doc.create_element("script");
    doc.set_attribute(source, "type", "application/json");
    doc.set_attribute(source, "class", options.source_class.as_str());
    doc.set_style_property(source, "display", "none");
    doc.set_inner_html(source, tags_json);
    doc.append_child(container, source);

    match serde_json::from_str::<Vec<TagSource>>(tags_json) {
        Ok(tags) => {
            for tag in &tags {
                append_tag(doc, container, tag, options);
            }
        }
        Err(err) => tracing::debug!(error = %err, "stage built without tag elements"),
    }
    container
}

fn append_tag(doc: &mut Document, parent: NodeId, tag: &TagSource, options: &StageOptions) {
    let el = doc.create_element("div");
    doc.set_attribute(el, options.binding_attribute.as_str(), tag.id.as_str());
    doc.set_style_property(el, "position", "absolute");
    doc.set_style_property(el, "top", px(tag.top));
    doc.set_style_property(el, "left", px(tag.left));
    doc.set_style_property(el, "width", px(tag.width));
    doc.set_style_property(el, "height", px(tag.height));
    if let Some(size) = tag.font_size {
        doc.set_style_property(el, "font-size", px(size));
    }
    if let Some(url) = tag
        .background_image
        .as_deref()
        .filter(|u| !u.is_empty() && *u != "none")
    {
        doc.set_style_property(el, "background-image", format!("url(\"{url}\")"));
    }
    if let Some(text) = &tag.text {
        doc.set_inner_html(el, text.as_str());
    }
    if tag.kind == Some(TagKind::Image) {
        if let Some(src) = tag.extra.get("src").and_then(|v| v.as_str()) {
            let img = doc.create_element("img");
            doc.set_attribute(img, "src", src);
            doc.append_child(el, img);
        }
    }
    doc.append_child(parent, el);

    for sub in &tag.subtags {
        append_tag(doc, el, sub, options);
    }
}

fn px_number(value: f64) -> String {
    px(value).trim_end_matches("px").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_nests_subtags_and_keeps_source() {
        let mut doc = Document::new();
        let body = doc.body();
        let raw = r#"[{"id":"a","text":"hi","top":10,"left":5,"width":40,"height":20,
            "subtags":[{"id":"b","text":"x","top":2,"left":1,"width":4,"height":4}]}]"#;
        let container = build_stage(&mut doc, body, raw, &StageOptions::default());

        assert_eq!(doc.attribute(container, "id"), Some("mi_size_container"));
        assert_eq!(doc.attribute(container, "width"), Some("300"));
        let source = doc.query_by_class(container, "mi-attributes").unwrap();
        assert_eq!(doc.text_content(source), raw);

        let a = doc.query_by_attribute(container, "mi-tag", "a").unwrap();
        let b = doc.query_by_attribute(container, "mi-tag", "b").unwrap();
        assert_eq!(doc.parent(b), Some(a));
        assert!(doc.inner_html(a).starts_with("hi"));
        let r = doc.bounding_client_rect(b);
        assert_eq!((r.origin.x, r.origin.y), (6.0, 12.0));
    }

    #[test]
    fn malformed_source_still_builds_container() {
        let mut doc = Document::new();
        let body = doc.body();
        let container = build_stage(&mut doc, body, "{not json", &StageOptions::default());
        assert_eq!(doc.children(container).len(), 1);
    }
}
