//! Error types for the fallible edges of the crate.
//!
//! Rendering itself never fails; these cover configuration, chat history
//! and request handling.

/// Error from loading configuration or handling chat records.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML configuration.
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// Malformed chat JSON.
    #[error("invalid chat JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A chat request with neither text nor an image attached.
    #[error("message or image is required")]
    EmptyMessage,
}

pub type Result<T> = std::result::Result<T, Error>;
