use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use serde_json::Value;
use time::OffsetDateTime;

/// Reads the `exp` claim (Unix seconds) from a JWT-shaped token without
/// verifying its signature.
pub fn token_expiry(token: &str) -> Option<f64> {
    let payload = token.trim().split('.').nth(1)?;
    // Accept both the URL-safe and the standard alphabet, padded or not.
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let bytes = STANDARD_NO_PAD.decode(normalized).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_f64().filter(|exp| exp.is_finite())
}

/// A token is usable iff `now` is strictly before its expiry. Anything we
/// cannot read counts as expired.
pub fn is_token_expired_at(token: Option<&str>, now: OffsetDateTime) -> bool {
    let Some(exp) = token.and_then(token_expiry) else {
        return true;
    };
    let now_seconds = now.unix_timestamp_nanos() as f64 / 1e9;
    now_seconds >= exp
}

pub fn is_token_expired(token: Option<&str>) -> bool {
    is_token_expired_at(token, OffsetDateTime::now_utc())
}

#[cfg(test)]
pub(crate) fn make_token(exp: i64) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"user_id":1,"exp":{exp}}}"#));
    format!("{header}.{claims}.signature")
}
