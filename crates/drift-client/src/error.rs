use std::fmt;

use drift_pages::FetchError;

#[derive(Debug)]
pub enum ClientError {
    /// Connection or protocol failure before a response was produced.
    Transport(String),
    /// The remote answered with a non-success status.
    Status { status: u16, message: String },
    /// The response body was not the expected JSON shape.
    Decode(serde_json::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(message) => write!(f, "transport error: {message}"),
            ClientError::Status { status, message } => {
                write!(f, "remote returned {status}: {message}")
            }
            ClientError::Decode(e) => write!(f, "decode error: {e}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl ClientError {
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            ClientError::Status { status, .. } => http::StatusCode::from_u16(*status)
                .unwrap_or(http::StatusCode::BAD_GATEWAY),
            ClientError::Transport(_) => http::StatusCode::BAD_GATEWAY,
            ClientError::Decode(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e)
    }
}

impl From<ureq::Error> for ClientError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(status) => ClientError::Status {
                status,
                message: "request rejected".to_string(),
            },
            other => ClientError::Transport(other.to_string()),
        }
    }
}

impl From<ClientError> for FetchError {
    fn from(e: ClientError) -> Self {
        match &e {
            ClientError::Status { status, .. } => FetchError::with_status(*status, e.to_string()),
            _ => FetchError::new(e.to_string()),
        }
    }
}
