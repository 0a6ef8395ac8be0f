use thiserror::Error;

/// Coarse classification of a failed API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 401/403: the session is missing, expired or rejected.
    Unauthorized,
    NotFound,
    /// Any other 4xx.
    BadRequest,
    /// 5xx and unexpected statuses.
    ServerError,
    /// No response was received.
    Network,
}

impl ErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorKind::Unauthorized,
            404 => ErrorKind::NotFound,
            400..=499 => ErrorKind::BadRequest,
            _ => ErrorKind::ServerError,
        }
    }
}

/// Errors raised by the API client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Request {
        kind: ErrorKind,
        status: u16,
        message: String,
    },

    /// The server answered 2xx with a body of the wrong shape.
    #[error("Invalid response from server (status {status}): {reason}")]
    InvalidResponse { status: u16, reason: String },

    /// The request never got a response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ApiError {
    /// Builds the error for a non-2xx response, preferring the body's `error`
    /// field, then `reason`, then a generic message carrying the status.
    pub fn from_response(status: u16, body: Option<&serde_json::Value>) -> Self {
        let server_message = body.and_then(|b| {
            ["error", "reason"]
                .iter()
                .find_map(|field| b.get(field).and_then(|v| v.as_str()))
        });

        let message = match server_message {
            Some(msg) => msg.to_string(),
            None => format!("HTTP error, status {}", status),
        };

        ApiError::Request {
            kind: ErrorKind::from_status(status),
            status,
            message,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Request { kind, .. } => *kind,
            ApiError::InvalidResponse { .. } => ErrorKind::ServerError,
            ApiError::Network(_) => ErrorKind::Network,
        }
    }

    /// HTTP status, absent for network failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } | ApiError::InvalidResponse { status, .. } => {
                Some(*status)
            }
            ApiError::Network(_) => None,
        }
    }

    pub fn is_session_failure(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }
}

/// Outcome of a view controller operation that did not succeed. The
/// controller has already updated its view state when one of these is
/// returned.
#[derive(Error, Debug)]
pub enum ViewError {
    /// No session; the user was sent back to the landing route.
    #[error("Authentication required")]
    AuthRequired,

    /// Input rejected before any network call.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}
