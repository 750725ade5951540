use tagfit_core::{Document, NodeId, RuntimeHost, TagId, TagTree};

fn first_img(doc: &Document, tag_element: NodeId) -> Option<NodeId> {
    doc.query_all_by_tag_name(tag_element, "img")
        .into_iter()
        .next()
}

/// Lets the image keep its natural size so the tag box crops it. `false` if there is no `img`.
pub fn crop_image_element(doc: &mut Document, tag_element: NodeId) -> bool {
    let Some(img) = first_img(doc, tag_element) else {
        return false;
    };
    doc.set_style_property(img, "width", "auto");
    doc.set_style_property(img, "height", "auto");
    true
}

/// Scales the image down to fit inside the tag box. `false` if there is no `img`.
pub fn contain_image_element(doc: &mut Document, tag_element: NodeId) -> bool {
    let Some(img) = first_img(doc, tag_element) else {
        return false;
    };
    doc.set_style_property(img, "max-width", "100%");
    doc.set_style_property(img, "max-height", "100%");
    true
}

pub fn classify_images(tree: &TagTree, doc: &mut Document, host: &dyn RuntimeHost, tags: &[TagId]) {
    for &id in tags {
        let Some(tag) = tree.get(id).filter(|t| t.is_image()) else {
            continue;
        };
        let Some(el) = tree.element(id, doc) else {
            host.log("image tag is missing element");
            continue;
        };
        let applied = if tag.is_cropped {
            crop_image_element(doc, el)
        } else {
            contain_image_element(doc, el)
        };
        if !applied {
            tracing::warn!(tag = %tag.id, "image tag has no img element");
            host.log(&format!("image tag {} has no img element", tag.id));
        }
    }
}
