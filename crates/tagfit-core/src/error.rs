pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error parsing the attributes element: {0}")]
    TagParse(#[from] serde_json::Error),

    #[error("invalid options JSON: {0}")]
    InvalidOptions(serde_json::Error),

    #[error("parameters need a default if they are not required")]
    ParamNeedsDefault { key: String },

    #[error("missing required query param: {key}")]
    MissingRequiredParam { key: String },

    #[error("{message}")]
    Fatal { message: String },

    #[error("data source request failed ({url}): {message}")]
    Fetch { url: String, message: String },
}

impl Error {
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    /// Errors that the hosting environment must see on its fatal-error channel.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ParamNeedsDefault { .. } | Self::MissingRequiredParam { .. } | Self::Fatal { .. }
        )
    }
}
