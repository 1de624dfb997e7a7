use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Protocol { url: String, status: StatusCode },

    #[error("could not decode {what}: {reason}")]
    Decode {
        what: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{name} failed verification: expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("login server answered with unknown outcome {0:?}")]
    UnknownOutcome(String),

    #[error("could not start game {}: {reason}", path.display())]
    Launch { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl LauncherError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn decode(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            what: what.into(),
            reason: reason.to_string(),
            source: None,
        }
    }

    /// Like [`LauncherError::decode`], keeping `source` in the error chain.
    pub fn decode_from<E>(what: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Decode {
            what: what.into(),
            reason: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}

pub type Result<T> = std::result::Result<T, LauncherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_name_the_path_and_action() {
        let err = LauncherError::io(
            "create directory",
            "/games/ttr/phase_3.mf",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            err.to_string(),
            "failed to create directory /games/ttr/phase_3.mf: denied"
        );
    }

    #[test]
    fn protocol_errors_carry_status() {
        let err = LauncherError::Protocol {
            url: "https://cdn.example/manifest".into(),
            status: StatusCode::SERVICE_UNAVAILABLE,
        };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn decode_errors_keep_their_cause() {
        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = LauncherError::decode_from("manifest", cause);
        assert!(err.to_string().starts_with("could not decode manifest: "));
        assert!(std::error::Error::source(&err).is_some());

        let err = LauncherError::decode("plan item", "destination has no parent");
        assert!(std::error::Error::source(&err).is_none());
    }
}
