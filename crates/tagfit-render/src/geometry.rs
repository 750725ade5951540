//! Container-relative bounding boxes, container fitting and tag removal.

use serde::{Deserialize, Serialize};
use tagfit_core::geom::{parse_css_number, px};
use tagfit_core::{Document, NodeId, TagId, TagTree};

/// Box relative to the container's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

/// Extra room around the tags when fitting the container. Missing sides are `0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// Bounding box of the given tags' elements. Recomputed from the document on every call; tags
/// without a live element do not contribute.
pub fn bounding_box(
    tree: &TagTree,
    doc: &Document,
    container: NodeId,
    tags: &[TagId],
) -> BoundingBox {
    let container_top = doc.offset_top(container);
    let container_left = doc.offset_left(container);

    let mut top = f64::INFINITY;
    let mut left = f64::INFINITY;
    let mut right = f64::NEG_INFINITY;
    let mut bottom = f64::NEG_INFINITY;
    let mut any = false;

    for el in tags.iter().filter_map(|id| tree.element(*id, doc)) {
        let r = doc.bounding_client_rect(el);
        top = top.min(r.min_y() - container_top);
        left = left.min(r.min_x() - container_left);
        bottom = bottom.max(r.max_y() - container_top);
        right = right.max(r.max_x() - container_left);
        any = true;
    }

    if !any {
        return BoundingBox::default();
    }
    BoundingBox {
        top,
        left,
        right,
        bottom,
        width: right - left,
        height: bottom - top,
    }
}

/// Resizes the container to the tags' bounding box plus `padding`. Returns the new size as
/// `(width, height)`.
pub fn fit_container_to_tags(
    tree: &TagTree,
    doc: &mut Document,
    container: NodeId,
    padding: Padding,
) -> (f64, f64) {
    let bbox = bounding_box(tree, doc, container, tree.tags());
    let width = bbox.width + padding.left + padding.right;
    let height = bbox.height + padding.top + padding.bottom;

    doc.remove_attribute(container, "width");
    doc.remove_attribute(container, "height");
    doc.set_style_property(container, "width", px(width));
    doc.set_style_property(container, "height", px(height));
    tracing::debug!(width, height, "container fitted to tags");
    (width, height)
}

/// Padding between the authored container size and the tags' box.
pub fn original_padding(doc: &Document, container: NodeId, bbox: &BoundingBox) -> Padding {
    let attr = |name: &str| {
        doc.attribute(container, name)
            .and_then(parse_css_number)
            .unwrap_or(0.0)
    };
    Padding {
        top: bbox.top,
        left: bbox.left,
        bottom: attr("height") - bbox.height,
        right: attr("width") - bbox.width,
    }
}

/// Removes a top-level tag and closes the gap it leaves: every top-level tag whose top is at or
/// below the removed tag's bottom edge moves up by the removed tag's height.
///
/// Returns `false` when the tag is unknown.
pub fn remove_tag(tree: &mut TagTree, doc: &mut Document, id: TagId) -> bool {
    let Some(tag) = tree.get(id) else {
        return false;
    };
    let height = tag.height;
    let bottom = tag.bottom();
    let element = tree.element(id, doc);
    tracing::debug!(tag = %tag.id, height, "slicing out tag");

    let below: Vec<TagId> = tree
        .tags()
        .iter()
        .copied()
        .filter(|t| *t != id && tree.get(*t).is_some_and(|t| t.top >= bottom))
        .collect();
    for t in below {
        let el = tree.element(t, doc);
        if let Some(tag) = tree.get_mut(t) {
            tag.top -= height;
            if let Some(el) = el {
                doc.set_style_property(el, "top", px(tag.top));
            }
        }
    }

    if let Some(el) = element {
        doc.detach(el);
    }
    tree.remove(id);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_deserializes_partial_objects() {
        let p: Padding = serde_json::from_str(r#"{ "top": 5, "left": 10 }"#).unwrap();
        assert_eq!(p, Padding::new(5.0, 0.0, 0.0, 10.0));
    }

    #[test]
    fn empty_tag_list_is_a_zero_box() {
        let mut doc = Document::new();
        let body = doc.body();
        let container = doc.create_element("div");
        doc.append_child(body, container);
        let tree = TagTree::default();
        assert_eq!(
            bounding_box(&tree, &doc, container, &[]),
            BoundingBox::default()
        );
    }
}
