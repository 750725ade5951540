//! Rendering session: one container, one tag tree, one render pass at a time.
//!
//! The session never owns the document. Every operation that reads or writes elements takes the
//! document explicitly, so several sessions can share one document as long as their containers
//! are disjoint.

use crate::assets;
use crate::autosize::{self, FitOutcome};
use crate::data::{TokenData, token_data};
use crate::fallback::{self, IntoTagSet};
use crate::geometry::{self, BoundingBox, Padding};
use crate::images;
use crate::substitute;
use crate::{Error, RenderOptions, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::rc::Rc;
use tagfit_core::geom::parse_css_number;
use tagfit_core::host::raise;
use tagfit_core::{
    Document, NodeId, ParamRequest, ParamValue, RuntimeHost, StudioOptions, Tag, TagId, TagTree,
    resolve_param,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    Unrendered,
    Substituting,
    Autosizing,
    AwaitingAssets,
    Rendered,
}

pub struct RenderSession {
    container: NodeId,
    tree: TagTree,
    options: StudioOptions,
    fields: IndexMap<String, String>,
    host: Rc<dyn RuntimeHost>,
    render_options: RenderOptions,
    state: RenderState,
    original_bounding: BoundingBox,
    original_padding: Padding,
    assets: Vec<String>,
}

impl RenderSession {
    /// Parses the tag source for `container` and binds tags to their elements.
    ///
    /// The source element is looked up inside the container only. Without one the session has no
    /// tags.
    pub fn new(
        doc: &Document,
        container: NodeId,
        options: StudioOptions,
        host: Rc<dyn RuntimeHost>,
        render_options: RenderOptions,
    ) -> Self {
        let source = doc.query_by_class(container, &render_options.source_class);
        let tree = match source {
            Some(source) => TagTree::parse(
                &doc.text_content(source),
                doc,
                container,
                &render_options.binding_attribute,
                host.as_ref(),
            ),
            None => {
                tracing::debug!("no tag source element; session has no tags");
                TagTree::default()
            }
        };

        let original_bounding = geometry::bounding_box(&tree, doc, container, tree.tags());
        let original_padding = geometry::original_padding(doc, container, &original_bounding);
        let fields = options.fields();
        tracing::debug!(
            tags = tree.tags().len(),
            all_tags = tree.all_tags().len(),
            fields = fields.len(),
            "render session created"
        );

        Self {
            container,
            tree,
            options,
            fields,
            host,
            render_options,
            state: RenderState::Unrendered,
            original_bounding,
            original_padding,
            assets: Vec::new(),
        }
    }

    /// Like [`RenderSession::new`], locating the container by its `id` attribute.
    pub fn from_container_id(
        doc: &Document,
        container_id: &str,
        options: StudioOptions,
        host: Rc<dyn RuntimeHost>,
        render_options: RenderOptions,
    ) -> Result<Self> {
        let container = doc
            .query_by_id(doc.body(), container_id)
            .ok_or_else(|| Error::ContainerNotFound {
                id: container_id.to_string(),
            })?;
        Ok(Self::new(doc, container, options, host, render_options))
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn tree(&self) -> &TagTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut TagTree {
        &mut self.tree
    }

    /// Top-level tags.
    pub fn tags(&self) -> &[TagId] {
        self.tree.tags()
    }

    /// Every tag, pre-order.
    pub fn all_tags(&self) -> &[TagId] {
        self.tree.all_tags()
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.tree.get(id)
    }

    pub fn find_tag(&self, tag_id: &str) -> Option<TagId> {
        self.tree.find_by_id(tag_id)
    }

    pub fn options(&self) -> &StudioOptions {
        &self.options
    }

    /// `fields` option flattened to `name -> value`.
    pub fn fields(&self) -> &IndexMap<String, String> {
        &self.fields
    }

    pub fn host(&self) -> &Rc<dyn RuntimeHost> {
        &self.host
    }

    pub fn render_options(&self) -> &RenderOptions {
        &self.render_options
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Tags' bounding box when the session was created.
    pub fn original_bounding(&self) -> BoundingBox {
        self.original_bounding
    }

    /// Room between the authored container size and the tags when the session was created.
    pub fn original_padding(&self) -> Padding {
        self.original_padding
    }

    /// URLs announced by the last asset wait.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn param(&self, key: &str, request: &ParamRequest) -> Result<ParamValue> {
        Ok(resolve_param(self.host.as_ref(), key, request)?)
    }

    /// Reports `message` as fatal to the host and returns the error for the caller to propagate.
    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::Core(raise(
            self.host.as_ref(),
            tagfit_core::Error::fatal(message),
        ))
    }

    pub fn replace_tokens(&mut self, doc: &mut Document, tags: &[TagId], data: &TokenData) {
        substitute::substitute(&mut self.tree, doc, self.host.as_ref(), tags, data);
    }

    pub fn show_fallback_text(&self, doc: &mut Document, tags: impl IntoTagSet) {
        fallback::show_fallback(&self.tree, doc, self.host.as_ref(), tags);
    }

    /// Substitutes the top-level tags with the host's params.
    pub fn fill_elements(&mut self, doc: &mut Document) {
        let data = token_data(self.host.params());
        let tags = self.tree.tags().to_vec();
        self.replace_tokens(doc, &tags, &data);
    }

    /// Fits the top-level tags that opted into autoresize.
    pub fn autoresize_tags(&mut self, doc: &mut Document) -> Vec<(TagId, FitOutcome)> {
        autosize::autosize(
            &self.tree,
            doc,
            self.host.as_ref(),
            self.render_options.text_measurer.as_ref(),
            self.tree.tags(),
        )
    }

    pub fn resize_tag(&self, doc: &mut Document, id: TagId) -> FitOutcome {
        autosize::fit_one(
            &self.tree,
            doc,
            self.host.as_ref(),
            self.render_options.text_measurer.as_ref(),
            id,
        )
    }

    pub fn overflow_ratio(&self, doc: &mut Document, element: NodeId) -> f64 {
        autosize::overflow_ratio(doc, self.render_options.text_measurer.as_ref(), element)
    }

    /// Runs the full pass: substitution, autosize, then the asset wait. Returns the awaited URLs.
    /// Can be run again once rendered.
    pub fn render(&mut self, doc: &mut Document) -> Vec<String> {
        self.transition(RenderState::Substituting);
        self.fill_elements(doc);

        self.transition(RenderState::Autosizing);
        self.autoresize_tags(doc);

        self.transition(RenderState::AwaitingAssets);
        let urls = self.wait_for_image_assets(doc);

        self.transition(RenderState::Rendered);
        urls
    }

    pub fn wait_for_image_assets(&mut self, doc: &Document) -> Vec<String> {
        let urls = assets::wait_for_image_assets(&self.tree, doc, self.container, self.host.as_ref());
        self.assets = urls.clone();
        urls
    }

    /// Removes a tag and shifts the top-level tags below it up by its height.
    pub fn slice_out_tag(&mut self, doc: &mut Document, id: TagId) -> bool {
        geometry::remove_tag(&mut self.tree, doc, id)
    }

    pub fn fit_to_tags(&self, doc: &mut Document, padding: Padding) -> (f64, f64) {
        geometry::fit_container_to_tags(&self.tree, doc, self.container, padding)
    }

    /// Bounding box of the top-level tags.
    pub fn inner_bounding_box(&self, doc: &Document) -> BoundingBox {
        geometry::bounding_box(&self.tree, doc, self.container, self.tree.tags())
    }

    pub fn inner_bounding_box_of(&self, doc: &Document, tags: &[TagId]) -> BoundingBox {
        geometry::bounding_box(&self.tree, doc, self.container, tags)
    }

    /// Applies crop/contain styling to every image tag.
    pub fn classify_images(&self, doc: &mut Document) {
        images::classify_images(&self.tree, doc, self.host.as_ref(), self.tree.all_tags());
    }

    pub fn snapshot(&self, doc: &Document) -> RenderSnapshot {
        let tags = self
            .tree
            .iter()
            .map(|(id, tag)| {
                let element = self.tree.element(id, doc);
                TagSnapshot {
                    id: tag.id.clone(),
                    parent: self
                        .tree
                        .parent(id)
                        .and_then(|p| self.tree.get(p))
                        .map(|p| p.id.clone()),
                    text: tag.text.clone(),
                    html: element.map(|el| doc.inner_html(el)),
                    hidden: element.is_none_or(|el| !doc.is_rendered(el)),
                    font_size: element.and_then(|el| {
                        doc.style_property(el, "font-size").and_then(parse_css_number)
                    }),
                    top: tag.top,
                    left: tag.left,
                    width: tag.width,
                    height: tag.height,
                }
            })
            .collect();

        RenderSnapshot {
            state: self.state,
            width: doc.style_px(self.container, "width"),
            height: doc.style_px(self.container, "height"),
            bounding: self.inner_bounding_box(doc),
            original_padding: self.original_padding,
            tags,
            assets: self.assets.clone(),
        }
    }

    fn transition(&mut self, next: RenderState) {
        tracing::debug!(from = ?self.state, to = ?next, "render state");
        self.state = next;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TagSnapshot {
    pub id: String,
    pub parent: Option<String>,
    pub text: Option<String>,
    /// Element content, `None` when the tag has no live element.
    pub html: Option<String>,
    pub hidden: bool,
    pub font_size: Option<f64>,
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// Serializable view of a session after (or before) a render pass.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub state: RenderState,
    pub width: f64,
    pub height: f64,
    pub bounding: BoundingBox,
    pub original_padding: Padding,
    pub tags: Vec<TagSnapshot>,
    pub assets: Vec<String>,
}
