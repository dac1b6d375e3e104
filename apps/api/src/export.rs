//! CSV rendering for `/api/reports/export/{type}`.
//!
//! Rows are serialized through `serde_json`, so the columns are exactly the
//! JSON field names clients already see. The header is the sorted union of
//! every row's top-level keys; nested objects and arrays are written as JSON.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

/// Renders `rows` as CSV. An empty slice renders as an empty string.
pub fn to_csv<T: Serialize>(rows: &[T]) -> Result<String, serde_json::Error> {
    let values = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<Value>, _>>()?;

    if values.is_empty() {
        return Ok(String::new());
    }

    let headers: BTreeSet<&str> = values
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|obj| obj.keys().map(String::as_str))
        .collect();

    let mut lines = Vec::with_capacity(values.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| escape(h))
            .collect::<Vec<_>>()
            .join(","),
    );

    for value in &values {
        let line = headers
            .iter()
            .map(|h| escape(&cell(value.get(*h))))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }

    Ok(lines.join("\n"))
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
