use serde::Serialize;
use serde_json::{Map, Value};

pub const EMPTY_VALUE: &str = "-";
pub const NO_DATA: &str = "No data";

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Human label for a JSON key: `trips_per_day` -> `Trips Per Day`,
/// `avgPricePerKg` -> `Avg Price Per Kg`.
pub fn format_key(key: &str) -> String {
    if key == "dauWauMau" || key == "dau_wau_mau" {
        return "DAU/WAU/MAU".to_string();
    }

    let mut spaced = String::with_capacity(key.len() + 8);
    let mut prev: Option<char> = None;
    for ch in key.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_ascii_uppercase() && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit()) {
            spaced.push(' ');
        }
        spaced.push(ch);
        prev = Some(ch);
    }

    let mut out = String::with_capacity(spaced.len());
    let mut prev_is_word = false;
    for ch in spaced.chars() {
        if is_word_char(ch) && !prev_is_word {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        prev_is_word = is_word_char(ch);
    }
    out
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(EMPTY_VALUE.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Table cells stay on one line; nested structures are shown as JSON.
fn cell(value: &Value) -> String {
    scalar(value).unwrap_or_else(|| value.to_string())
}

fn render_table(rows: &[Value]) -> String {
    let Some(Value::Object(first)) = rows.first() else {
        return rows.iter().map(cell).collect::<Vec<_>>().join(", ");
    };
    let keys: Vec<&String> = first.keys().collect();
    let header: Vec<String> = keys.iter().map(|k| format_key(k)).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            keys.iter()
                .map(|k| row.get(k.as_str()).map(cell).unwrap_or_else(|| EMPTY_VALUE.to_string()))
                .collect()
        })
        .collect();
    render_grid(&header, &body)
}

/// Left-aligned text table: header, a rule line, then one line per row.
pub fn render_grid(header: &[String], body: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in body {
        for (w, c) in widths.iter_mut().zip(row) {
            *w = (*w).max(c.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(header)];
    out.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));
    out.extend(body.iter().map(|row| line(row)));
    out.join("\n")
}

fn render_object(map: &Map<String, Value>) -> String {
    if map.len() == 1 {
        if let Some((_, only)) = map.iter().next() {
            match only {
                Value::Array(_) => return render_value(only),
                Value::Number(_) | Value::String(_) => return cell(only),
                _ => {}
            }
        }
    }

    let mut lines = Vec::with_capacity(map.len());
    for (key, value) in map {
        let label = format_key(key);
        let rendered = render_value(value);
        if rendered.contains('\n') {
            lines.push(format!("{label}:"));
            lines.extend(rendered.lines().map(|l| format!("  {l}")));
        } else {
            lines.push(format!("{label}: {rendered}"));
        }
    }
    lines.join("\n")
}

/// Text rendering for whatever JSON a metric endpoint returns.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Array(rows) if rows.is_empty() => NO_DATA.to_string(),
        Value::Array(rows) => render_table(rows),
        Value::Object(map) => render_object(map),
        other => cell(other),
    }
}

pub fn render_records<T: Serialize>(items: &[T]) -> String {
    match serde_json::to_value(items) {
        Ok(value) => render_value(&value),
        Err(_) => NO_DATA.to_string(),
    }
}
