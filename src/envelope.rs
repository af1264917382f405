//! Normalization of the backend's response envelopes.
//!
//! List endpoints do not agree on where the records live. The adapter tries,
//! in order: `data.results`, `data`, `results`, the body itself, and gives up
//! with an empty page.

use crate::types::Page;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub fn extract_items(body: &Value) -> &[Value] {
    let data = body.get("data");
    let candidates = [
        data.and_then(|d| d.get("results")),
        data,
        body.get("results"),
        Some(body),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// `data.count` first, then a top-level `count`.
pub fn extract_count(body: &Value) -> Option<u64> {
    let count = body
        .get("data")
        .and_then(|d| d.get("count"))
        .or_else(|| body.get("count"))?;
    count
        .as_u64()
        .or_else(|| count.as_f64().filter(|c| *c >= 0.0).map(|c| c as u64))
}

/// The page size is inferred from the page we got back, so a short last page
/// inflates the result. A missing count or an empty page yields one page.
pub fn total_pages(count: Option<u64>, page_len: usize) -> u64 {
    match count {
        Some(count) if count > 0 && page_len > 0 => count.div_ceil(page_len as u64),
        _ => 1,
    }
}

pub fn normalize_page<T: DeserializeOwned>(body: &Value) -> Page<T> {
    let raw = extract_items(body);
    let count = extract_count(body);

    let mut items = Vec::with_capacity(raw.len());
    for (index, entry) in raw.iter().enumerate() {
        match serde_json::from_value::<T>(entry.clone()) {
            Ok(item) => items.push(item),
            Err(e) => tracing::warn!(index, error = %e, "skipping malformed list entry"),
        }
    }

    Page {
        items,
        total_count: count.unwrap_or(raw.len() as u64),
        total_pages: total_pages(count, raw.len()),
    }
}

/// Single-record responses may or may not be wrapped as
/// `{status, data: {...}}`.
pub fn unwrap_record(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("status") && map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Metric endpoints carry their value under `data`; a missing value renders
/// as empty.
pub fn metric_value(body: Value) -> Value {
    match body {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
