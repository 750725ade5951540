//! Headless document model.
//!
//! Just enough of a DOM for the rendering engine: an arena of elements with attributes, inline
//! style, raw inner markup and children. Elements are absolutely positioned by their `top`,
//! `left`, `width` and `height` style properties relative to their parent, which is how creative
//! templates lay out their tags.

use crate::geom::{Rect, parse_css_number, rect};
use indexmap::IndexMap;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt::Write as _;

const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Elements whose content is raw text (never parsed as markup).
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

const VOID_ELEMENTS: &[&str] = &["img", "br", "hr", "input", "meta", "link"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ordered inline style declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Style(IndexMap<String, String>);

impl Style {
    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(String::as_str)
    }

    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.0.insert(property.into(), value.into());
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.0.shift_remove(property)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialized form used for the `style` attribute (`top: 4px; left: 2px`).
    pub fn css_text(&self) -> String {
        let mut out = String::new();
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{k}: {v};");
        }
        out
    }
}

#[derive(Debug, Clone)]
struct Node {
    tag_name: String,
    attributes: IndexMap<String, String>,
    style: Style,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attributes: IndexMap::new(),
            style: Style::default(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("body")],
            body: NodeId(0),
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(tag_name));
        id
    }

    /// Appends `child` to `parent`, moving it out of its previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.contains(child, parent) {
            tracing::warn!(?parent, ?child, "refusing to append an ancestor into its descendant");
            return;
        }
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Takes `node` out of the tree. The node stays valid but is no longer connected.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.node_mut(node).parent.take() else {
            return;
        };
        self.node_mut(parent).children.retain(|c| *c != node);
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    /// Whether `node` is reachable from the document body.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.body, node)
    }

    /// Whether `node` is `scope` or one of its descendants.
    pub fn contains(&self, scope: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == scope {
                return true;
            }
            cur = self.node(n).parent;
        }
        false
    }

    pub fn tag_name(&self, node: NodeId) -> &str {
        &self.node(node).tag_name
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node).attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        self.node_mut(node)
            .attributes
            .insert(name.to_string(), value.into());
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Option<String> {
        self.node_mut(node).attributes.shift_remove(name)
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn style(&self, node: NodeId) -> &Style {
        &self.node(node).style
    }

    pub fn style_property(&self, node: NodeId, property: &str) -> Option<&str> {
        self.node(node).style.get(property)
    }

    pub fn set_style_property(&mut self, node: NodeId, property: &str, value: impl Into<String>) {
        self.node_mut(node).style.set(property, value);
    }

    pub fn remove_style_property(&mut self, node: NodeId, property: &str) -> Option<String> {
        self.node_mut(node).style.remove(property)
    }

    /// Own markup followed by the serialized child elements.
    pub fn inner_html(&self, node: NodeId) -> String {
        let n = self.node(node);
        let mut out = n.text.clone();
        for child in &n.children {
            self.write_html(*child, &mut out);
        }
        out
    }

    /// Replaces the element's content. Existing child elements are detached.
    pub fn set_inner_html(&mut self, node: NodeId, html: impl Into<String>) {
        let children = std::mem::take(&mut self.node_mut(node).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
        self.node_mut(node).text = html.into();
    }

    /// Rendered text: markup stripped and entities decoded. Raw-text elements (`script`, `style`)
    /// return their content untouched.
    pub fn text_content(&self, node: NodeId) -> String {
        let n = self.node(node);
        if RAW_TEXT_ELEMENTS.contains(&n.tag_name.as_str()) {
            return n.text.clone();
        }
        let stripped = strip_markup(&n.text);
        let mut out = htmlize::unescape(&*stripped).into_owned();
        for child in &n.children {
            out.push_str(&self.text_content(*child));
        }
        out
    }

    /// Pre-order descendants of `scope`, excluding `scope` itself.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(scope).children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.node(n).children.iter().rev().copied());
        }
        out
    }

    /// First descendant of `scope` whose attribute `name` equals `value`.
    pub fn query_by_attribute(&self, scope: NodeId, name: &str, value: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|n| self.attribute(*n, name) == Some(value))
    }

    pub fn query_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        self.query_by_attribute(scope, "id", id)
    }

    pub fn query_by_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|n| self.has_class(*n, class))
    }

    pub fn query_all_by_tag_name(&self, scope: NodeId, tag_name: &str) -> Vec<NodeId> {
        let tag_name = tag_name.to_ascii_lowercase();
        self.descendants(scope)
            .into_iter()
            .filter(|n| self.node(*n).tag_name == tag_name)
            .collect()
    }

    /// Numeric value of a px style property; `0` when unset or not numeric.
    pub fn style_px(&self, node: NodeId, property: &str) -> f64 {
        self.style_property(node, property)
            .and_then(parse_css_number)
            .unwrap_or(0.0)
    }

    /// Connected, and neither the element nor an ancestor has `display: none`.
    pub fn is_rendered(&self, node: NodeId) -> bool {
        if !self.is_connected(node) {
            return false;
        }
        let mut cur = Some(node);
        while let Some(n) = cur {
            if self.style_property(n, "display").map(str::trim) == Some("none") {
                return false;
            }
            cur = self.node(n).parent;
        }
        true
    }

    /// Vertical document position of the element's border box.
    pub fn offset_top(&self, node: NodeId) -> f64 {
        self.accumulate(node, "top")
    }

    /// Horizontal document position of the element's border box.
    pub fn offset_left(&self, node: NodeId) -> f64 {
        self.accumulate(node, "left")
    }

    fn accumulate(&self, node: NodeId, property: &str) -> f64 {
        let mut total = 0.0;
        let mut cur = Some(node);
        while let Some(n) = cur {
            total += self.style_px(n, property);
            cur = self.node(n).parent;
        }
        total
    }

    /// Document-space border box. Elements that are not rendered report an all-zero rect.
    pub fn bounding_client_rect(&self, node: NodeId) -> Rect {
        if !self.is_rendered(node) {
            return Rect::zero();
        }
        rect(
            self.offset_left(node),
            self.offset_top(node),
            self.style_px(node, "width"),
            self.style_px(node, "height"),
        )
    }

    pub fn client_width(&self, node: NodeId) -> f64 {
        if !self.is_rendered(node) {
            return 0.0;
        }
        self.style_px(node, "width")
    }

    /// `font-size` resolved through inheritance.
    pub fn font_size(&self, node: NodeId) -> f64 {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if let Some(size) = self.style_property(n, "font-size").and_then(parse_css_number) {
                return size;
            }
            cur = self.node(n).parent;
        }
        DEFAULT_FONT_SIZE
    }

    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let n = self.node(node);
        out.push('<');
        out.push_str(&n.tag_name);
        for (k, v) in &n.attributes {
            let _ = write!(out, " {k}=\"{}\"", htmlize::escape_attribute(v.as_str()));
        }
        if !n.style.is_empty() {
            let css = n.style.css_text();
            let _ = write!(out, " style=\"{}\"", htmlize::escape_attribute(css.as_str()));
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&n.tag_name.as_str()) {
            return;
        }
        out.push_str(&n.text);
        for child in &n.children {
            self.write_html(*child, out);
        }
        let _ = write!(out, "</{}>", n.tag_name);
    }
}

fn strip_markup(html: &str) -> Cow<'_, str> {
    if !html.contains('<') {
        return Cow::Borrowed(html);
    }
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match (in_tag, ch) {
            (false, '<') => in_tag = true,
            (true, '>') => in_tag = false,
            (false, c) => out.push(c),
            (true, _) => {}
        }
    }
    Cow::Owned(out)
}
