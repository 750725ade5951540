#![forbid(unsafe_code)]

//! `tagfit` renders data-driven tag templates headlessly.
//!
//! A creative is a container element plus a serialized array of positioned tags. A render pass
//! substitutes `[token]`s from the host's params, shrinks overflowing text, and waits for images.
//!
//! # Features
//!
//! - `render`: enable the rendering session (`tagfit::render`)

pub use tagfit_core::*;

#[cfg(feature = "render")]
pub mod render {
    use std::rc::Rc;
    use tagfit_core::{Document, RuntimeHost, StageOptions, StudioOptions, build_stage};

    pub use tagfit_render::assets::{image_urls, wait_for_image_assets};
    pub use tagfit_render::autosize::{autosize, fit_one, overflow_ratio};
    pub use tagfit_render::fallback::show_fallback;
    pub use tagfit_render::geometry::{bounding_box, fit_container_to_tags, remove_tag};
    pub use tagfit_render::images::{classify_images, contain_image_element, crop_image_element};
    pub use tagfit_render::substitute::{Substitution, substitute, substitute_text};
    pub use tagfit_render::text::{DeterministicTextMeasurer, TextMeasurer, TextStyle};
    pub use tagfit_render::{
        BoundingBox, DataValue, FitOutcome, IntoTagSet, Padding, RenderOptions, RenderSession,
        RenderSnapshot, RenderState, TagSnapshot, TokenData, token_data,
    };

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Core(#[from] tagfit_core::Error),
        #[error(transparent)]
        Render(#[from] tagfit_render::Error),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Stages `tags_json` in a fresh document and runs one render pass over it.
    ///
    /// `options_json` is the creative's options object; `None` means no options.
    pub fn render_headless(
        tags_json: &str,
        options_json: Option<&str>,
        host: Rc<dyn RuntimeHost>,
        stage: &StageOptions,
        render_options: RenderOptions,
    ) -> Result<(Document, RenderSession)> {
        let options = match options_json {
            Some(raw) => StudioOptions::from_json_str(raw)?,
            None => StudioOptions::default(),
        };
        let mut doc = Document::new();
        let body = doc.body();
        build_stage(&mut doc, body, tags_json, stage);
        let mut session = RenderSession::from_container_id(
            &doc,
            &stage.container_id,
            options,
            host,
            render_options,
        )?;
        session.render(&mut doc);
        Ok((doc, session))
    }
}
