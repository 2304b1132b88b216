/// Convenience result alias used throughout the crate.
pub type LaminateResult<T> = Result<T, LaminateError>;

/// Fatal errors: the operation that produced one did not complete.
///
/// Per-layer failures that a render recovers from are reported as
/// [`RenderWarning`](crate::RenderWarning)s instead.
#[derive(thiserror::Error, Debug)]
pub enum LaminateError {
    /// Structurally invalid document or argument.
    #[error("validation error: {0}")]
    Validation(String),

    /// JSON parse or serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Image asset could not be produced.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// A filter rejected its input or produced an unusable buffer.
    #[error("filter error: {0}")]
    Filter(String),

    /// Drawing surface failure.
    #[error("render error: {0}")]
    Render(String),

    /// Anything else, with context.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LaminateError {
    /// Build a [`LaminateError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LaminateError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`LaminateError::Filter`].
    pub fn filter(msg: impl Into<String>) -> Self {
        Self::Filter(msg.into())
    }

    /// Build a [`LaminateError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

impl From<serde_json::Error> for LaminateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

/// Failure to load or decode an image asset.
///
/// Cloneable so a single failed in-flight load can be reported to every waiter.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// The loader could not find or read the asset.
    #[error("unable to load image '{url}': {reason}")]
    Load {
        /// Requested URL.
        url: String,
        /// Loader-specific reason.
        reason: String,
    },

    /// The bytes were read but could not be decoded.
    #[error("unable to decode image '{url}': {reason}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decoder message.
        reason: String,
    },
}

impl AssetError {
    /// Build an [`AssetError::Load`].
    pub fn load(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Build an [`AssetError::Decode`].
    pub fn decode(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// URL the failure refers to.
    pub fn url(&self) -> &str {
        match self {
            Self::Load { url, .. } | Self::Decode { url, .. } => url,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
