use crate::error::ApiError;
use crate::redact::redact_secrets;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub fn build_client(timeout: Duration, connect_timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .default_headers(common_headers())
        .build()
}

fn common_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("verlo-admin/", env!("CARGO_PKG_VERSION"))),
    );
    headers
}

pub fn bearer_headers(access_token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&format!("Bearer {access_token}")) {
        headers.insert(AUTHORIZATION, value);
    }
    headers
}

pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}/{path}")
    }
}

/// Status plus the body parsed as JSON when it is JSON. Empty bodies (204,
/// DELETE) come back as `None`.
pub async fn read_response(res: reqwest::Response) -> Result<(u16, Option<Value>), ApiError> {
    let status = res.status().as_u16();
    let text = res.text().await.map_err(|e| {
        tracing::debug!(status, error = %redact_secrets(&e.to_string()), "failed to read response body");
        ApiError::from(e)
    })?;
    if text.trim().is_empty() {
        return Ok((status, None));
    }
    Ok((status, serde_json::from_str(&text).ok()))
}

pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
