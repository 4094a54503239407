//! API error response parsing.
//!
//! Handles the envelopes the OpenAI-compatible Gemini endpoint returns:
//! - Standard: `{"error": {"message": "...", "type": "..."}}`
//! - Google:   `[{"error": {"message": "...", "status": "..."}}]` or the object form
//! - Flat:     `{"message": "...", "code": "..."}`

use serde_json::Value;

/// Parsed API error information.
pub struct ApiErrorInfo {
    /// Human-readable error message.
    pub message: String,
    /// Provider-specific error code (e.g. `"INVALID_ARGUMENT"`).
    pub code: Option<String>,
    /// Whether the request can be retried (429 or 5xx).
    pub retryable: bool,
}

/// Parse an API error response body into structured error info.
///
/// Falls back to the raw body text if no known envelope matches.
pub fn parse_api_error(body: &str, status: u16) -> ApiErrorInfo {
    let retryable = status == 429 || status >= 500;

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        // Google sometimes wraps the envelope in a one-element array.
        let json = match json {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };

        if let Some(msg) = json["error"]["message"].as_str() {
            let code = json["error"]["status"]
                .as_str()
                .or_else(|| json["error"]["type"].as_str())
                .map(String::from);
            return ApiErrorInfo {
                message: msg.to_string(),
                code,
                retryable,
            };
        }

        if let Some(msg) = json["message"].as_str() {
            return ApiErrorInfo {
                message: msg.to_string(),
                code: json["code"].as_str().map(String::from),
                retryable,
            };
        }
    }

    ApiErrorInfo {
        message: format!("HTTP {status}: {body}"),
        code: None,
        retryable,
    }
}

/// Parse a `Retry-After` header (seconds or HTTP date) into milliseconds.
pub fn parse_retry_after_header(value: &str) -> Option<u64> {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Some(seconds * 1000);
    }

    let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let delay_ms = date
        .signed_duration_since(chrono::Utc::now())
        .num_milliseconds();
    Some(u64::try_from(delay_ms).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_status_format() {
        let body = r#"{"error":{"status":"INVALID_ARGUMENT","message":"Function call is missing a thought_signature"}}"#;
        let info = parse_api_error(body, 400);
        assert!(info.message.contains("thought_signature"));
        assert_eq!(info.code.as_deref(), Some("INVALID_ARGUMENT"));
        assert!(!info.retryable);
    }

    #[test]
    fn google_array_envelope() {
        let body = r#"[{"error":{"code":429,"status":"RESOURCE_EXHAUSTED","message":"Quota exceeded"}}]"#;
        let info = parse_api_error(body, 429);
        assert_eq!(info.message, "Quota exceeded");
        assert_eq!(info.code.as_deref(), Some("RESOURCE_EXHAUSTED"));
        assert!(info.retryable);
    }

    #[test]
    fn flat_message_format() {
        let body = r#"{"message":"Invalid model","code":"model_not_found"}"#;
        let info = parse_api_error(body, 404);
        assert_eq!(info.message, "Invalid model");
        assert_eq!(info.code.as_deref(), Some("model_not_found"));
    }

    #[test]
    fn non_json_body() {
        let info = parse_api_error("Bad Gateway", 502);
        assert!(info.message.contains("502"));
        assert!(info.message.contains("Bad Gateway"));
        assert!(info.retryable);
    }

    #[test]
    fn retry_after_seconds() {
        assert_eq!(parse_retry_after_header("7"), Some(7000));
        assert_eq!(parse_retry_after_header("soon"), None);
    }

    #[test]
    fn retry_after_past_date_is_zero() {
        assert_eq!(
            parse_retry_after_header("Wed, 21 Oct 2015 07:28:00 GMT"),
            Some(0)
        );
    }
}
