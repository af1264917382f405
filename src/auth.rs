use crate::error::{error_messages, ApiError, ApiErrorKind, NETWORK_ERROR};
use crate::http::{is_success, join_url, read_response};
use crate::redact::redact_secrets;
use crate::types::{Credentials, LoginData};
use serde_json::{json, Value};

pub const LOGIN_PATH: &str = "/api/users/login/";
pub const REFRESH_PATH: &str = "/api/users/token/refresh/";
pub const LOGIN_FAILED: &str = "Login failed";

const STATUS_SUCCESS: &str = "SUCCESS";

fn is_success_envelope(body: &Value) -> bool {
    body.get("status").and_then(Value::as_str) == Some(STATUS_SUCCESS)
}

/// Failure for an envelope that did not report success, whatever the HTTP
/// status was.
fn envelope_error(status: u16, body: Option<&Value>) -> ApiError {
    let messages = body.map(error_messages).unwrap_or_default();
    let kind = if !messages.is_empty() {
        ApiErrorKind::Validation
    } else if matches!(status, 401 | 403) {
        ApiErrorKind::Unauthenticated
    } else {
        ApiErrorKind::Application
    };
    ApiError {
        kind,
        status: Some(status),
        messages,
    }
}

/// Message the login form shows for a failed attempt.
pub fn login_error_message(err: &ApiError) -> String {
    if err.kind == ApiErrorKind::Network {
        return NETWORK_ERROR.to_string();
    }
    err.first_message().unwrap_or(LOGIN_FAILED).to_string()
}

/// The two unauthenticated endpoints.
#[derive(Debug, Clone)]
pub struct AuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl AuthApi {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: crate::http::normalize_base_url(base_url),
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<(u16, Option<Value>), ApiError> {
        let res = self
            .http
            .post(join_url(&self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(path, error = %redact_secrets(&e.to_string()), "auth request failed");
                ApiError::from(e)
            })?;
        read_response(res).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<LoginData, ApiError> {
        let body = json!({
            "username": credentials.username,
            "password": credentials.password,
        });
        let (status, payload) = self.post(LOGIN_PATH, &body).await?;

        match payload {
            Some(mut payload) if is_success(status) && is_success_envelope(&payload) => {
                let data = payload.get_mut("data").map(Value::take).unwrap_or(Value::Null);
                serde_json::from_value::<LoginData>(data)
                    .ok()
                    .filter(|d| !d.access.trim().is_empty() && !d.refresh.trim().is_empty())
                    .ok_or_else(ApiError::invalid_response)
            }
            other => Err(envelope_error(status, other.as_ref())),
        }
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let (status, payload) = self
            .post(REFRESH_PATH, &json!({ "refresh": refresh_token }))
            .await?;

        match payload {
            Some(payload) if is_success(status) && is_success_envelope(&payload) => payload
                .get("data")
                .and_then(|d| d.get("access"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(ApiError::invalid_response),
            other => Err(envelope_error(status, other.as_ref())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_error_prefers_backend_messages() {
        let body = json!({"status": "FAILED", "error": ["Invalid credentials"]});
        let err = envelope_error(200, Some(&body));
        assert_eq!(err.kind, ApiErrorKind::Validation);
        assert_eq!(login_error_message(&err), "Invalid credentials");
    }

    #[test]
    fn login_error_message_falls_back() {
        let err = envelope_error(500, None);
        assert_eq!(login_error_message(&err), LOGIN_FAILED);
        assert_eq!(login_error_message(&ApiError::network()), NETWORK_ERROR);
    }

    #[test]
    fn success_envelope_requires_exact_status() {
        assert!(is_success_envelope(&json!({"status": "SUCCESS"})));
        assert!(!is_success_envelope(&json!({"status": "success"})));
        assert!(!is_success_envelope(&json!({"data": {}})));
    }
}
