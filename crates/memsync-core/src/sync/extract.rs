//! Remote id extraction from a create response

use serde_json::Value;

use crate::{Error, Result};

/// Recover the remote id from a raw tool-call result.
///
/// Looks for an `id` in the JSON text of the first content entry, then for an
/// `id` at the top level of the result.
///
/// # Errors
///
/// Returns [`Error::Extraction`] when neither location carries an id.
pub fn extract_remote_id(result: &Value) -> Result<String> {
    let from_content = result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|content| content.first())
        .and_then(|entry| entry.get("text"))
        .and_then(Value::as_str)
        .and_then(|text| serde_json::from_str::<Value>(text).ok())
        .and_then(|data| data.get("id").and_then(id_to_string));

    from_content
        .or_else(|| result.get("id").and_then(id_to_string))
        .ok_or_else(|| Error::Extraction {
            message: result.to_string(),
        })
}

fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
