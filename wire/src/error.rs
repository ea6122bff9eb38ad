use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection closed mid-message (expected {expected} more bytes)")]
    Truncated { expected: u32 },
    #[error("failed to decode message body: {0}")]
    Decode(#[from] bincode::Error),
}

impl WireError {
    /// Truncation and plain I/O failure both mean "the peer is gone" to a
    /// caller; only `Decode` indicates a framing bug worth distinguishing.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, WireError::Io(_) | WireError::Truncated { .. })
    }
}
