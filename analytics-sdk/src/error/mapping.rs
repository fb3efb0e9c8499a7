//! Error mapping for the Google Analytics APIs
//!
//! Converts the Google JSON error envelope into a normalized [`ServiceError`]:
//!
//! ```json
//! {"error": {"code": 403, "message": "...", "status": "PERMISSION_DENIED",
//!            "errors": [{"domain": "usageLimits", "reason": "dailyLimitExceeded"}]}}
//! ```

use reqwest::StatusCode;
use serde_json::Value;

use super::{ErrorContext, ServiceError};

/// Error reasons the APIs use for quota exhaustion, regardless of status code
const QUOTA_REASONS: &[&str] = &[
    "dailyLimitExceeded",
    "userRateLimitExceeded",
    "rateLimitExceeded",
    "quotaExceeded",
];

/// Map a Google API error envelope to a ServiceError
pub fn map_google_error(
    status: StatusCode,
    json: &Value,
    context: &mut ErrorContext,
) -> ServiceError {
    let error = match json.get("error") {
        Some(error) if error.is_object() => error,
        // OAuth endpoints answer with {"error": "invalid_token", "error_description": ...}
        Some(Value::String(code)) => {
            context.reason = Some(code.clone());
            let message = json
                .get("error_description")
                .and_then(|m| m.as_str())
                .unwrap_or(code);
            return map_status(status, message);
        }
        _ => {
            let message = json
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown Google API error");
            return map_status(status, message);
        }
    };

    if let Some(api_status) = error.get("status").and_then(|s| s.as_str()) {
        context.insert_detail("api_status", api_status);
    }

    let reason = error
        .get("errors")
        .and_then(|e| e.as_array())
        .and_then(|errors| errors.first())
        .and_then(|first| first.get("reason"))
        .and_then(|r| r.as_str());

    if let Some(reason) = reason {
        context.reason = Some(reason.to_string());
    }

    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown Google API error");

    if reason.is_some_and(|r| QUOTA_REASONS.contains(&r)) {
        return ServiceError::quota_exceeded(message);
    }

    map_status(status, message)
}

/// Map a generic HTTP error response body to a ServiceError
pub fn map_http_error(status: StatusCode, body: &str, context: &mut ErrorContext) -> ServiceError {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        return map_google_error(status, &json, context);
    }

    let message = if body.is_empty() {
        status.to_string()
    } else if body.len() > 100 {
        format!("{}: {}", status, crate::util::truncate_string(body, 100))
    } else {
        format!("{}: {}", status, body)
    };

    map_status(status, message)
}

fn map_status(status: StatusCode, message: impl Into<String>) -> ServiceError {
    let message = message.into();
    match status {
        StatusCode::UNAUTHORIZED => ServiceError::authentication(message),
        StatusCode::FORBIDDEN => ServiceError::authorization(message),
        StatusCode::TOO_MANY_REQUESTS => ServiceError::quota_exceeded(message),
        StatusCode::BAD_REQUEST => ServiceError::validation(message),
        StatusCode::NOT_FOUND => ServiceError::not_found(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ServiceError::timeout(message),
        _ => ServiceError::service(message),
    }
}

/// Classify an HTTP status for log fields
pub fn classify_http_error(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "validation",
        401 => "authentication",
        403 => "authorization",
        404 => "not_found",
        408 => "timeout",
        429 => "quota",
        500..=599 => "server",
        _ => "unknown",
    }
}
