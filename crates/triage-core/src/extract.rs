//! Verdict extraction from free-form model output

use serde_json::Value;

use crate::error::TriageError;
use crate::types::{AnalysisResult, Urgency};

/// Pull the outermost `{ ... }` span out of `text` and parse it as JSON.
///
/// The span runs from the first `{` to the last `}`; braces are not balanced.
/// Prose and code fences around the object are ignored. An opening brace with
/// no closing brace after it is a truncated object, reported as `MalformedJson`.
pub fn extract_json(text: &str) -> Result<Value, TriageError> {
    let start = text.find('{').ok_or(TriageError::NoJsonFound)?;
    let span = match text.rfind('}') {
        Some(end) if end > start => &text[start..=end],
        _ => &text[start..],
    };

    serde_json::from_str(span).map_err(|e| TriageError::MalformedJson(e.to_string()))
}

/// Check that an extracted object is a complete verdict.
///
/// `urgency` must be one of the enumerated values and `reason` / `action` must
/// be non-empty strings. Extra keys are ignored.
pub fn validate(value: &Value) -> Result<AnalysisResult, TriageError> {
    let obj = value
        .as_object()
        .ok_or_else(|| TriageError::SchemaViolation("expected a JSON object".to_string()))?;

    let urgency = match obj.get("urgency").and_then(Value::as_str) {
        Some(raw) => Urgency::parse(raw.trim()).ok_or_else(|| {
            TriageError::SchemaViolation(format!("unknown urgency '{}'", raw))
        })?,
        None => {
            return Err(TriageError::SchemaViolation(
                "missing string field 'urgency'".to_string(),
            ));
        }
    };

    Ok(AnalysisResult {
        urgency,
        reason: required_text(obj, "reason")?,
        action: required_text(obj, "action")?,
    })
}

/// Extract and validate in one step
pub fn parse_verdict(text: &str) -> Result<AnalysisResult, TriageError> {
    validate(&extract_json(text)?)
}

fn required_text(obj: &serde_json::Map<String, Value>, key: &str) -> Result<String, TriageError> {
    match obj.get(key).and_then(Value::as_str).map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(TriageError::SchemaViolation(format!(
            "missing or empty field '{}'",
            key
        ))),
    }
}
