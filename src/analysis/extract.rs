//! Structured payload extraction from oracle responses.
//!
//! The oracle is asked for a JSON object but frequently wraps it in a
//! Markdown code fence. The first fenced region is located and decoded;
//! responses without fence markers are decoded as-is.

use crate::error::AnalysisError;
use crate::models::Verdict;
use serde::de::DeserializeOwned;
use serde_json::Value;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Return the structured payload embedded in an oracle response.
///
/// A ```` ```json ```` fence wins over a plain one. An unterminated fence
/// extends to the end of the response.
pub fn extract_payload(response: &str) -> &str {
    if let Some(start) = response.find(JSON_FENCE) {
        return fenced_body(response, start + JSON_FENCE.len());
    }

    if let Some(start) = response.find(FENCE) {
        let mut body_start = start + FENCE.len();

        // Skip a language tag such as ```JSON or ```javascript
        if let Some(line_end) = response[body_start..].find('\n') {
            let info = &response[body_start..body_start + line_end];
            if !info.contains('{') && !info.contains('[') {
                body_start += line_end + 1;
            }
        }

        return fenced_body(response, body_start);
    }

    response.trim()
}

fn fenced_body(response: &str, body_start: usize) -> &str {
    let rest = &response[body_start..];
    match rest.find(FENCE) {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

/// Extract and decode a JSON object from an oracle response.
pub fn decode<T: DeserializeOwned>(response: &str) -> Result<T, AnalysisError> {
    let payload = extract_payload(response);
    let value: Value = serde_json::from_str(payload)?;

    if !value.is_object() {
        return Err(AnalysisError::Decode(
            "expected a JSON object at the top level".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(Into::into)
}

/// Decode a whole-document verdict, rejecting answers without a usable stance.
pub fn decode_verdict(response: &str) -> Result<Verdict, AnalysisError> {
    let verdict: Verdict = decode(response)?;

    if verdict.stance.is_degraded() {
        return Err(AnalysisError::Decode(
            "oracle returned no recognizable stance".to_string(),
        ));
    }

    Ok(verdict)
}
