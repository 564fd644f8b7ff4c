//! Error types for the identity probe.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("identity request failed: {0}")]
    Transport(String),

    #[error("identity endpoint returned status {0}")]
    Status(u16),

    #[error(transparent)]
    Malformed(#[from] MalformedResponseError),
}

/// The response arrived but is not a valid identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedResponseError {
    #[error("identity body is not valid JSON: {0}")]
    Decode(String),

    #[error("identity body is not a JSON object")]
    NotAnObject,

    #[error("identity field `{0}` is missing")]
    MissingField(&'static str),

    #[error("identity field `{0}` is not a non-empty string")]
    InvalidField(&'static str),

    #[error("identity body exceeds {0} bytes")]
    TooLarge(usize),
}

impl ProbeError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}
