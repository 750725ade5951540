#![forbid(unsafe_code)]

pub mod assets;
pub mod autosize;
pub mod data;
pub mod fallback;
pub mod geometry;
pub mod images;
pub mod session;
pub mod substitute;
pub mod text;

use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use std::sync::Arc;

pub use autosize::FitOutcome;
pub use data::{DataValue, TokenData, token_data};
pub use fallback::IntoTagSet;
pub use geometry::{BoundingBox, Padding};
pub use session::{RenderSession, RenderSnapshot, RenderState, TagSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tagfit_core::Error),
    #[error("container not found: #{id}")]
    ContainerNotFound { id: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct RenderOptions {
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
    /// Attribute carrying a tag's id on its element.
    pub binding_attribute: String,
    /// Class of the element holding the serialized tag array.
    pub source_class: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
            binding_attribute: tagfit_core::DEFAULT_BINDING_ATTRIBUTE.to_string(),
            source_class: tagfit_core::DEFAULT_SOURCE_CLASS.to_string(),
        }
    }
}
