use tagfit_core::{Document, NodeId, RuntimeHost, TagTree};

/// Image URLs the creative depends on: background images of every tag in pre-order, then the
/// `src` of every `img` inside `scope`.
pub fn image_urls(tree: &TagTree, doc: &Document, scope: NodeId) -> Vec<String> {
    let backgrounds = tree
        .all_tags()
        .iter()
        .filter_map(|id| tree.get(*id)?.background_image_url().map(str::to_string));
    let sources = doc
        .query_all_by_tag_name(scope, "img")
        .into_iter()
        .filter_map(|img| doc.attribute(img, "src"))
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    backgrounds.chain(sources).collect()
}

/// Tells the host to hold the render until each image URL has loaded. Returns the URLs.
pub fn wait_for_image_assets(
    tree: &TagTree,
    doc: &Document,
    scope: NodeId,
    host: &dyn RuntimeHost,
) -> Vec<String> {
    let urls = image_urls(tree, doc, scope);
    for url in &urls {
        host.wait_for_asset(url);
    }
    tracing::debug!(count = urls.len(), "waiting for image assets");
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagfit_core::{RecordingHost, StageOptions, build_stage};

    fn run(raw: &str) -> (Vec<String>, RecordingHost) {
        let mut doc = Document::new();
        let body = doc.body();
        let container = build_stage(&mut doc, body, raw, &StageOptions::default());
        let host = RecordingHost::new();
        let tree = TagTree::parse(raw, &doc, container, "mi-tag", &host);
        let urls = wait_for_image_assets(&tree, &doc, container, &host);
        (urls, host)
    }

    #[test]
    fn no_images() {
        let (urls, host) = run(r#"[{ "id": "a", "text": "x" }]"#);
        assert!(urls.is_empty());
        assert!(host.awaited_assets().is_empty());
    }

    #[test]
    fn backgrounds_come_before_img_sources() {
        let (urls, host) = run(
            r#"[
              { "id": "pic", "type": "image", "src": "https://cdn.test/pic.png" },
              { "id": "bg", "backgroundImage": "https://cdn.test/bg.png",
                "subtags": [ { "id": "none", "backgroundImage": "none" },
                             { "id": "nested", "backgroundImage": "https://cdn.test/nested.png" } ] }
            ]"#,
        );
        let expected = [
            "https://cdn.test/bg.png",
            "https://cdn.test/nested.png",
            "https://cdn.test/pic.png",
        ];
        assert_eq!(urls, expected);
        assert_eq!(host.awaited_assets(), expected);
    }
}
