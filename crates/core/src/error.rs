/// Result alias that carries the custom [`BeatDeckError`] type.
pub type Result<T> = std::result::Result<T, BeatDeckError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum BeatDeckError {
    /// Free-form error used for conditions that do not warrant their own
    /// variant, such as lock poisoning in embedder glue code.
    #[error("{0}")]
    Message(String),
    /// A beat map failed validation (unsorted, negative or non-finite
    /// timestamps).
    #[error("invalid beat map: {0}")]
    BeatMap(String),
    /// A video catalog was constructed without any candidate ids.
    #[error("video catalog is empty")]
    EmptyCatalog,
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON decoding errors raised while loading a beat map.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl BeatDeckError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for BeatDeckError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for BeatDeckError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
