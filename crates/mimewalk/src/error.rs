//! Error types for MIME tree construction.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a parse.
///
/// Every variant is fatal: a document either yields a complete tree or one
/// of these. A malformed `Content-Disposition` is not an error, see
/// [`DispositionStatus`](crate::DispositionStatus).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Header block unreadable or truncated.
    #[error("Header read error: {0}")]
    HeaderRead(String),

    /// Content-Type value does not parse.
    #[error("Media type syntax error: {0}")]
    MediaTypeSyntax(String),

    /// Multipart content type without a boundary parameter.
    #[error("Missing boundary in multipart content type")]
    MissingBoundary,

    /// Transfer-encoded body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Boundary framing is broken or the input ended mid-part.
    #[error("Multipart enumeration error: {0}")]
    Enumeration(String),

    /// Multipart nesting exceeds the configured limit.
    #[error("Multipart nesting depth {depth} exceeds limit of {max}")]
    NestingTooDeep {
        /// Depth at which the limit was hit.
        depth: usize,
        /// Configured maximum.
        max: usize,
    },

    /// I/O error while reading the document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if the error came from a transfer-encoding decoder.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Base64Decode(_))
    }
}
