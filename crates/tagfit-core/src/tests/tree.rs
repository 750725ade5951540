use crate::*;

const NESTED: &str = r#"[
  { "id": "a", "text": "[seconds]", "top": 10, "height": 20,
    "subtags": [
      { "id": "a1", "text": "s" },
      { "id": "a2", "subtags": [ { "id": "a2x" } ] }
    ] },
  { "id": "b", "text": "hours", "top": 40, "height": 20 }
]"#;

fn ids(tree: &TagTree, list: &[TagId]) -> Vec<String> {
    list.iter()
        .map(|id| tree.get(*id).unwrap().id.clone())
        .collect()
}

fn staged(raw: &str) -> (Document, NodeId) {
    let mut doc = Document::new();
    let body = doc.body();
    let container = build_stage(&mut doc, body, raw, &StageOptions::default());
    (doc, container)
}

#[test]
fn tree_views_are_top_level_and_preorder() {
    let tree = TagTree::try_parse(NESTED).unwrap();
    assert_eq!(ids(&tree, tree.tags()), ["a", "b"]);
    assert_eq!(ids(&tree, tree.all_tags()), ["a", "a1", "a2", "a2x", "b"]);

    let a2 = tree.find_by_id("a2").unwrap();
    assert_eq!(ids(&tree, tree.children(a2)), ["a2x"]);
    assert_eq!(tree.parent(a2), tree.find_by_id("a"));
}

#[test]
fn parse_binds_elements_inside_the_container() {
    let (doc, container) = staged(NESTED);
    let host = RecordingHost::new();
    let tree = TagTree::parse(NESTED, &doc, container, "mi-tag", &host);

    for (_, tag) in tree.iter() {
        let el = tag.element.expect("every staged tag has an element");
        assert_eq!(doc.attribute(el, "mi-tag"), Some(tag.id.as_str()));
    }
    let a = tree.find_by_id("a").unwrap();
    assert!(doc.inner_html(tree.element(a, &doc).unwrap()).starts_with("[seconds]"));
    assert!(host.logs().is_empty());
}

#[test]
fn lookups_never_cross_into_a_sibling_container() {
    let mut doc = Document::new();
    let body = doc.body();
    let first = build_stage(&mut doc, body, NESTED, &StageOptions::default());
    let second = build_stage(
        &mut doc,
        body,
        r#"[{ "id": "a", "text": "other" }]"#,
        &StageOptions {
            container_id: "second".to_string(),
            ..Default::default()
        },
    );

    let host = RecordingHost::new();
    let raw_second = r#"[{ "id": "a" }, { "id": "b" }]"#;
    let tree = TagTree::parse(raw_second, &doc, second, "mi-tag", &host);
    let a = tree.find_by_id("a").unwrap();
    let b = tree.find_by_id("b").unwrap();
    let el = tree.element(a, &doc).unwrap();
    assert!(doc.contains(second, el));
    assert!(!doc.contains(first, el));
    assert_eq!(tree.element(b, &doc), None, "b only exists in the first container");
}

#[test]
fn malformed_source_yields_empty_tree_and_a_diagnostic() {
    let (doc, container) = staged("{oops");
    let host = RecordingHost::new();
    let tree = TagTree::parse("{oops", &doc, container, "mi-tag", &host);
    assert!(tree.is_empty());
    assert!(tree.tags().is_empty());

    let logs = host.logs();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].starts_with("Error parsing the attributes element:"));
}

#[test]
fn wrong_shape_is_a_parse_error() {
    let err = TagTree::try_parse(r#"{ "id": "a" }"#).unwrap_err();
    assert!(matches!(err, Error::TagParse(_)));
}

#[test]
fn tag_without_id_parses_but_stays_unbound() {
    let raw = r#"[
      { "text": "no id", "fallbackText": 5 },
      { "id": "b", "text": "bound" }
    ]"#;
    let (doc, container) = staged(raw);
    let host = RecordingHost::new();
    let tree = TagTree::parse(raw, &doc, container, "mi-tag", &host);
    assert!(host.logs().is_empty());
    assert_eq!(ids(&tree, tree.tags()), ["", "b"]);

    let anonymous = tree.tags()[0];
    assert_eq!(tree.get(anonymous).unwrap().fallback(), Some("5"));
    assert_eq!(tree.element(anonymous, &doc), None);
    assert_eq!(tree.find_by_id(""), None);
    assert!(tree.element(tree.find_by_id("b").unwrap(), &doc).is_some());
}

#[test]
fn element_binding_degrades_when_node_leaves_document() {
    let (mut doc, container) = staged(NESTED);
    let host = RecordingHost::new();
    let tree = TagTree::parse(NESTED, &doc, container, "mi-tag", &host);
    let b = tree.find_by_id("b").unwrap();
    let el = tree.element(b, &doc).unwrap();

    doc.detach(el);
    assert_eq!(tree.element(b, &doc), None);
    assert_eq!(tree.get(b).unwrap().element, Some(el));
}

#[test]
fn bind_can_be_repeated_after_document_changes() {
    let (mut doc, container) = staged(NESTED);
    let host = RecordingHost::new();
    let mut tree = TagTree::parse(NESTED, &doc, container, "mi-tag", &host);
    let b = tree.find_by_id("b").unwrap();
    let old = tree.element(b, &doc).unwrap();
    doc.detach(old);

    let replacement = doc.create_element("div");
    doc.set_attribute(replacement, "mi-tag", "b");
    doc.append_child(container, replacement);
    tree.bind(&doc, container, "mi-tag");
    assert_eq!(tree.element(b, &doc), Some(replacement));
}

#[test]
fn remove_drops_subtree_from_both_views() {
    let mut tree = TagTree::try_parse(NESTED).unwrap();
    let a = tree.find_by_id("a").unwrap();
    let removed = tree.remove(a);
    assert_eq!(removed.len(), 4);
    assert_eq!(ids(&tree, tree.tags()), ["b"]);
    assert_eq!(ids(&tree, tree.all_tags()), ["b"]);
    assert!(tree.get(a).is_none());
    assert!(tree.find_by_id("a1").is_none());
    assert!(tree.remove(a).is_empty(), "second removal is a no-op");
}

#[test]
fn removing_a_subtag_detaches_it_from_its_parent() {
    let mut tree = TagTree::try_parse(NESTED).unwrap();
    let a = tree.find_by_id("a").unwrap();
    let a1 = tree.find_by_id("a1").unwrap();
    tree.remove(a1);
    assert_eq!(ids(&tree, tree.children(a)), ["a2"]);
    assert_eq!(ids(&tree, tree.tags()), ["a", "b"]);
    assert_eq!(ids(&tree, tree.all_tags()), ["a", "a2", "a2x", "b"]);
}

#[test]
fn sources_round_trip_the_current_shape() {
    let mut tree = TagTree::try_parse(NESTED).unwrap();
    let a2 = tree.find_by_id("a2").unwrap();
    tree.remove(a2);
    let sources = tree.to_sources();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].subtags.len(), 1);
    assert_eq!(sources[0].subtags[0].id, "a1");
}
