//! Protocol error taxonomy.
//!
//! Nothing here is fatal to the process. A `ProtocolError` is scoped to a
//! single inbound frame: the frame is dropped, the connection stays open,
//! and no broadcast occurs. Transport write failures are swallowed at the
//! send site, and registry lookups of absent rooms or members are benign
//! no-ops — neither gets an error type of its own.

/// A malformed inbound frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The frame is not valid JSON.
    #[error("frame is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// The frame parsed, but is not a JSON object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// The frame has no `action` discriminator field.
    #[error("frame is missing the \"action\" discriminator")]
    MissingDiscriminator,

    /// A `join` frame carries no usable `peer` name.
    #[error("join frame is missing a string \"peer\" field")]
    MissingPeer,
}

impl ProtocolError {
    /// Short classification string for logging/metrics.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::MalformedJson(_) => "malformed_json",
            Self::NotAnObject => "not_an_object",
            Self::MissingDiscriminator => "missing_discriminator",
            Self::MissingPeer => "missing_peer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("not json").unwrap_err()
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(
            ProtocolError::MalformedJson(json_error()).error_kind(),
            "malformed_json"
        );
        assert_eq!(ProtocolError::NotAnObject.error_kind(), "not_an_object");
        assert_eq!(
            ProtocolError::MissingDiscriminator.error_kind(),
            "missing_discriminator"
        );
        assert_eq!(ProtocolError::MissingPeer.error_kind(), "missing_peer");
    }

    #[test]
    fn display_mentions_discriminator() {
        let msg = ProtocolError::MissingDiscriminator.to_string();
        assert!(msg.contains("action"));
    }

    #[test]
    fn from_serde_error() {
        let err: ProtocolError = json_error().into();
        assert_eq!(err.error_kind(), "malformed_json");
    }
}
