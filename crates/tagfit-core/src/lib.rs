#![forbid(unsafe_code)]

//! Tag tree model + headless document (tagfit core).
//!
//! Design goals:
//! - the tag tree is parsed once per session and addressed by copyable [`TagId`] handles
//! - elements are bound weakly by attribute lookup inside one container scope
//! - everything the engine reports or needs from its host goes through [`RuntimeHost`]

pub mod data_source;
pub mod dom;
pub mod error;
pub mod geom;
pub mod host;
pub mod options;
pub mod params;
pub mod stage;
pub mod tag;
pub mod tree;

pub use data_source::{DataFetcher, DataSource, Environment};
pub use dom::{Document, NodeId, Style};
pub use error::{Error, Result};
pub use host::{HostEvent, RecordingHost, RuntimeHost, TracingHost};
pub use options::StudioOptions;
pub use params::{ParamDefault, ParamKind, ParamRequest, ParamValue, resolve_param};
pub use stage::{StageOptions, build_stage};
pub use tag::{Tag, TagKind, TagSource};
pub use tree::{TagId, TagTree};

/// Attribute that carries a tag id on its rendered element.
pub const DEFAULT_BINDING_ATTRIBUTE: &str = "mi-tag";

/// Class of the element whose text content holds the serialized tag array.
pub const DEFAULT_SOURCE_CLASS: &str = "mi-attributes";

/// Id of the creative's root container.
pub const DEFAULT_CONTAINER_ID: &str = "mi_size_container";

#[cfg(test)]
mod tests;
