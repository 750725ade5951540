//! Tag tree: an arena of tags parsed once per rendering session.
//!
//! `tags` (top level) and `all_tags` (pre-order) are derived views over the arena. Removal is the
//! only shape change and updates both.

use crate::dom::{Document, NodeId};
use crate::host::RuntimeHost;
use crate::tag::{Tag, TagSource};
use crate::Result;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId(usize);

impl TagId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct TagNode {
    tag: Tag,
    parent: Option<TagId>,
    children: Vec<TagId>,
    removed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TagTree {
    nodes: Vec<TagNode>,
    roots: Vec<TagId>,
    all: Vec<TagId>,
    by_id: FxHashMap<String, TagId>,
}

impl TagTree {
    pub fn from_sources(sources: Vec<TagSource>) -> Self {
        let mut tree = Self::default();
        for source in sources {
            let id = tree.push(source, None);
            tree.roots.push(id);
        }
        tree
    }

    fn push(&mut self, source: TagSource, parent: Option<TagId>) -> TagId {
        let (tag, subtags) = Tag::from_source(source);
        let id = TagId(self.nodes.len());
        // First occurrence wins for id lookups, matching document-order element lookup.
        if !tag.id.is_empty() {
            self.by_id.entry(tag.id.clone()).or_insert(id);
        }
        self.nodes.push(TagNode {
            tag,
            parent,
            children: Vec::new(),
            removed: false,
        });
        self.all.push(id);
        for sub in subtags {
            let child = self.push(sub, Some(id));
            self.nodes[id.0].children.push(child);
        }
        id
    }

    /// Parses a serialized tag array. Malformed JSON or a non-array shape is an error.
    pub fn try_parse(raw: &str) -> Result<Self> {
        let sources: Vec<TagSource> = serde_json::from_str(raw)?;
        Ok(Self::from_sources(sources))
    }

    /// Parses and binds a serialized tag array. A malformed source is logged through the host and
    /// yields an empty tree so that the render pass can still run.
    pub fn parse(
        raw: &str,
        doc: &Document,
        scope: NodeId,
        binding_attribute: &str,
        host: &dyn RuntimeHost,
    ) -> Self {
        match Self::try_parse(raw) {
            Ok(mut tree) => {
                tree.bind(doc, scope, binding_attribute);
                tree
            }
            Err(err) => {
                tracing::warn!(error = %err, "tag source rejected; rendering an empty tree");
                host.log(&err.to_string());
                Self::default()
            }
        }
    }

    /// Resolves every tag's element inside `scope`. Safe to call again after the document
    /// changes; tags without a matching element are left unbound.
    pub fn bind(&mut self, doc: &Document, scope: NodeId, binding_attribute: &str) {
        let mut unbound = 0usize;
        for id in self.all.clone() {
            let node = &mut self.nodes[id.0];
            node.tag.element = if node.tag.id.is_empty() {
                None
            } else {
                doc.query_by_attribute(scope, binding_attribute, &node.tag.id)
            };
            if node.tag.element.is_none() {
                unbound += 1;
            }
        }
        tracing::debug!(tags = self.all.len(), unbound, "bound tag elements");
    }

    /// Top-level tags, in document order.
    pub fn tags(&self) -> &[TagId] {
        &self.roots
    }

    /// Every tag, parents before children.
    pub fn all_tags(&self) -> &[TagId] {
        &self.all
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn get(&self, id: TagId) -> Option<&Tag> {
        self.nodes
            .get(id.0)
            .filter(|n| !n.removed)
            .map(|n| &n.tag)
    }

    pub fn get_mut(&mut self, id: TagId) -> Option<&mut Tag> {
        self.nodes
            .get_mut(id.0)
            .filter(|n| !n.removed)
            .map(|n| &mut n.tag)
    }

    pub fn children(&self, id: TagId) -> &[TagId] {
        match self.nodes.get(id.0) {
            Some(n) if !n.removed => &n.children,
            _ => &[],
        }
    }

    pub fn parent(&self, id: TagId) -> Option<TagId> {
        self.nodes.get(id.0).filter(|n| !n.removed)?.parent
    }

    pub fn find_by_id(&self, tag_id: &str) -> Option<TagId> {
        self.by_id.get(tag_id).copied().filter(|id| !self.nodes[id.0].removed)
    }

    /// First tag in pre-order matching `pred`.
    pub fn find(&self, mut pred: impl FnMut(&Tag) -> bool) -> Option<TagId> {
        self.all
            .iter()
            .copied()
            .find(|id| pred(&self.nodes[id.0].tag))
    }

    /// Top-level tags matching `pred`.
    pub fn filter_tags(&self, mut pred: impl FnMut(&Tag) -> bool) -> Vec<TagId> {
        self.roots
            .iter()
            .copied()
            .filter(|id| pred(&self.nodes[id.0].tag))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TagId, &Tag)> {
        self.all.iter().map(|id| (*id, &self.nodes[id.0].tag))
    }

    /// The tag's element, provided it is still part of the document.
    pub fn element(&self, id: TagId, doc: &Document) -> Option<NodeId> {
        self.get(id)?.element.filter(|el| doc.is_connected(*el))
    }

    /// Removes `id` and its subtree from both views. Returns the removed ids, `id` first.
    pub fn remove(&mut self, id: TagId) -> Vec<TagId> {
        if self.get(id).is_none() {
            return Vec::new();
        }
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            removed.push(cur);
            stack.extend(self.nodes[cur.0].children.iter().rev().copied());
        }
        for r in &removed {
            self.nodes[r.0].removed = true;
        }
        if let Some(parent) = self.nodes[id.0].parent {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
        self.roots.retain(|r| *r != id);
        self.all.retain(|a| !removed.contains(a));
        self.by_id.retain(|_, v| !removed.contains(v));
        removed
    }

    /// Serializes the current shape back to nested sources.
    pub fn to_sources(&self) -> Vec<TagSource> {
        self.roots.iter().map(|id| self.source_of(*id)).collect()
    }

    fn source_of(&self, id: TagId) -> TagSource {
        let node = &self.nodes[id.0];
        let subtags = node.children.iter().map(|c| self.source_of(*c)).collect();
        node.tag.to_source(subtags)
    }
}
