//! Error taxonomy for the execution-context protocol.

use reqwest::StatusCode;
use thiserror::Error;

use crate::context::Language;

#[derive(Error, Debug)]
pub enum Error {
    /// The remote API answered with a non-2xx status.
    #[error("remote protocol error: {} {status_text}{}", .status.as_u16(), with_description(.description))]
    RemoteProtocol {
        status: StatusCode,
        status_text: String,
        description: String,
    },
    /// The remote runtime reported a command-level failure.
    #[error("remote execution error: {message}")]
    RemoteExecution { message: String },
    /// A response body, or a recovered blob, could not be parsed.
    #[error("failed to decode remote response: {reason}")]
    Decode {
        reason: String,
        raw: String,
        cleaned: Option<String>,
    },
    #[error("Timeout exceeded for script\n{script}")]
    Timeout { script: String },
    #[error("{language} context {context_id} was destroyed while a command was still pending")]
    ContextDestroyed {
        language: Language,
        context_id: String,
    },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn decode(reason: impl ToString, raw: impl Into<String>) -> Self {
        Error::Decode {
            reason: reason.to_string(),
            raw: raw.into(),
            cleaned: None,
        }
    }

    /// HTTP status for protocol errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::RemoteProtocol { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn with_description(description: &str) -> String {
    if description.is_empty() {
        String::new()
    } else {
        format!("\n{}", description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_display_includes_body_only_when_present() {
        let bare = Error::RemoteProtocol {
            status: StatusCode::FORBIDDEN,
            status_text: "Forbidden".into(),
            description: String::new(),
        };
        assert_eq!(bare.to_string(), "remote protocol error: 403 Forbidden");

        let with_body = Error::RemoteProtocol {
            status: StatusCode::BAD_REQUEST,
            status_text: "Bad Request".into(),
            description: "{\"error\":\"no such cluster\"}".into(),
        };
        assert!(with_body.to_string().ends_with("\n{\"error\":\"no such cluster\"}"));
        assert_eq!(with_body.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn timeout_names_the_script() {
        let err = Error::Timeout { script: "DROP TABLE t".into() };
        assert!(err.to_string().contains("DROP TABLE t"));
        assert_eq!(err.status(), None);
    }
}
