use thiserror::Error;

/// Errors surfaced by response parsing and the lookup service.
///
/// Callers should map every variant except [`SifenError::InvalidInput`] to a
/// generic server error; the messages describe the failing stage, not data
/// intended for end users.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SifenError {
    /// The response text is not well-formed XML.
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    /// Well-formed XML that lacks an element required by the protocol.
    #[error("unexpected response shape: {0}")]
    ProtocolShape(String),

    /// Network, TLS or HTTP failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// A lookup identifier (RUC or CDC) failed validation before any request.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Numeric text could not be coerced.
    #[error("numeric error: {0}")]
    Numeric(String),
}

impl SifenError {
    /// `true` for errors caused by the remote side or its payload rather than the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::MalformedXml(_) | Self::ProtocolShape(_) | Self::Transport(_)
        )
    }
}
