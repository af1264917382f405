use std::borrow::Cow;

const REDACTED: &str = "REDACTED";

fn is_token_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '+' | '/' | '=')
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let nee = needle.as_bytes();
    if nee.is_empty() {
        return Some(0);
    }
    if nee.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - nee.len()).find(|&i| hay[i..i + nee.len()].eq_ignore_ascii_case(nee))
}

/// Replaces whatever follows each occurrence of `marker` (up to the end of
/// the token) with `REDACTED`. The marker itself is kept as written.
fn redact_after(text: &str, marker: &str, stop: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = find_ascii_case_insensitive(rest, marker) {
        let end = idx + marker.len();
        out.push_str(&rest[..end]);
        rest = &rest[end..];

        let consumed: usize = rest
            .chars()
            .take_while(|&ch| !stop(ch))
            .map(char::len_utf8)
            .sum();
        if consumed > 0 {
            out.push_str(REDACTED);
        }
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    out
}

/// JWTs always start with the base64 of `{"`.
fn redact_jwts(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find("eyJ") {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        let consumed: usize = rest
            .chars()
            .take_while(|&ch| is_token_char(ch))
            .map(char::len_utf8)
            .sum();
        let candidate = &rest[..consumed];
        if candidate.matches('.').count() >= 2 {
            out.push_str(REDACTED);
        } else {
            out.push_str(candidate);
        }
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    out
}

/// Strips bearer tokens, JWTs and credential fields from text that is about
/// to be logged or shown.
pub fn redact_secrets(input: &str) -> Cow<'_, str> {
    let mut value = redact_after(input, "Bearer ", |ch| !is_token_char(ch));
    for field in [r#""password":""#, r#""refresh":""#, r#""access":""#] {
        value = redact_after(&value, field, |ch| ch == '"');
    }
    value = redact_jwts(&value);

    if value == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(value)
    }
}
