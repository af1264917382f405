use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub const NOT_AUTHENTICATED: &str = "Not authenticated";
pub const NETWORK_ERROR: &str = "Network error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// No usable access token, or the backend rejected the one we sent.
    Unauthenticated,
    /// The request never produced an HTTP response.
    Network,
    /// The backend answered with a list of human-readable messages.
    Validation,
    /// Any other backend failure, including undecodable bodies.
    Application,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Network => "network",
            Self::Validation => "validation",
            Self::Application => "application",
        };
        f.write_str(s)
    }
}

/// Every backend-facing failure, normalized at the HTTP boundary so callers
/// never branch on payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.describe())]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: Option<u16>,
    pub messages: Vec<String>,
}

impl ApiError {
    pub fn unauthenticated() -> Self {
        Self {
            kind: ApiErrorKind::Unauthenticated,
            status: None,
            messages: vec![],
        }
    }

    pub fn network() -> Self {
        Self {
            kind: ApiErrorKind::Network,
            status: None,
            messages: vec![],
        }
    }

    pub fn application(status: Option<u16>) -> Self {
        Self {
            kind: ApiErrorKind::Application,
            status,
            messages: vec![],
        }
    }

    pub fn invalid_response() -> Self {
        Self {
            kind: ApiErrorKind::Application,
            status: None,
            messages: vec![],
        }
    }

    /// Classifies a non-success HTTP response. A non-empty `error` list wins
    /// over the status code.
    pub fn from_response(status: u16, body: Option<&Value>) -> Self {
        let messages = body.map(error_messages).unwrap_or_default();
        if !messages.is_empty() {
            return Self {
                kind: ApiErrorKind::Validation,
                status: Some(status),
                messages,
            };
        }
        let kind = match status {
            401 | 403 => ApiErrorKind::Unauthenticated,
            _ => ApiErrorKind::Application,
        };
        Self {
            kind,
            status: Some(status),
            messages,
        }
    }

    fn describe(&self) -> String {
        if let Some(first) = self.first_message() {
            return first.to_string();
        }
        match (self.kind, self.status) {
            (ApiErrorKind::Unauthenticated, _) => NOT_AUTHENTICATED.to_string(),
            (ApiErrorKind::Network, _) => NETWORK_ERROR.to_string(),
            (kind, Some(status)) => format!("{kind} error ({status})"),
            (kind, None) => format!("{kind} error"),
        }
    }

    pub fn first_message(&self) -> Option<&str> {
        self.messages.first().map(String::as_str)
    }

    /// Lines a screen shows for this failure. Validation messages are shown
    /// verbatim; everything else collapses to a single line.
    pub fn screen_lines(&self, fallback: &str) -> Vec<String> {
        match self.kind {
            ApiErrorKind::Validation => self.messages.clone(),
            ApiErrorKind::Unauthenticated => vec![NOT_AUTHENTICATED.to_string()],
            ApiErrorKind::Network | ApiErrorKind::Application => vec![fallback.to_string()],
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::invalid_response();
        }
        if let Some(status) = err.status() {
            return Self::application(Some(status.as_u16()));
        }
        Self::network()
    }
}

/// Reads the backend's `error` list. Non-string entries are kept as their
/// JSON text so nothing the backend said is dropped.
pub fn error_messages(body: &Value) -> Vec<String> {
    let Some(list) = body.get("error").and_then(Value::as_array) else {
        return vec![];
    };
    list.iter()
        .filter_map(|v| match v {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}
