/// Errors raised while moving events on and off the wire.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The event carries a `type` this build does not know how to send.
    #[error("event type is not recognised")]
    UnknownType,
}

impl CoreError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::UnknownType => "unknown_type",
        }
    }
}
