// Normalized API error shared by every request-issuing call
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Field name -> messages, as reported by validation failures
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Client-side view of a failed request: `{ message, status, errors? }`
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    // 400 / 422
    Validation {
        status: u16,
        message: String,
        errors: Option<FieldErrors>,
    },

    // 401
    Unauthorized(String),

    // 403
    Forbidden(String),

    // 404
    NotFound(String),

    // 409
    Conflict(String),

    // Any other non-success status
    Server { status: u16, message: String },

    // No response at all (connect, timeout, DNS)
    Network(String),

    // Success status but body did not match the expected shape
    Decode(String),
}

impl ApiError {
    /// HTTP status code, 0 when no response was received
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Validation { status, .. } => *status,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Server { status, .. } => *status,
            ApiError::Network(_) => 0,
            ApiError::Decode(_) => 0,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::Server { message, .. } => message,
            ApiError::Network(msg) => msg,
            ApiError::Decode(msg) => msg,
        }
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation { errors, .. } => errors.as_ref(),
            _ => None,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Server { .. } => "SERVER_ERROR",
            ApiError::Network(_) => "NETWORK_ERROR",
            ApiError::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Server-side failures worth another attempt for idempotent requests
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Server { status, .. } => matches!(status, 502 | 503 | 504),
            _ => false,
        }
    }

    /// Render as the normalized `{ message, status, errors? }` shape
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "message": self.message(),
            "status": self.status(),
        });

        if let Some(errors) = self.errors() {
            body["errors"] = json!(errors);
        }

        body
    }

    /// Build the error for a non-success response from its status and raw body
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let parsed: Option<Value> = serde_json::from_slice(body).ok();

        let message = parsed
            .as_ref()
            .and_then(extract_message)
            .unwrap_or_else(|| default_message(status));

        match status {
            400 | 422 => ApiError::Validation {
                status,
                message,
                errors: parsed.as_ref().and_then(extract_field_errors),
            },
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            _ => ApiError::Server { status, message },
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(message: impl Into<String>, errors: Option<FieldErrors>) -> Self {
        ApiError::Validation {
            status: 400,
            message: message.into(),
            errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        ApiError::Server {
            status,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ApiError::Decode(message.into())
    }
}

fn extract_message(body: &Value) -> Option<String> {
    if let Some(msg) = body.get("message").and_then(Value::as_str) {
        return Some(msg.to_string());
    }
    // OpenID Connect token endpoint failures
    if let Some(desc) = body.get("error_description").and_then(Value::as_str) {
        return Some(desc.to_string());
    }
    // `{ "error": "..." }` style bodies; `{ "error": true }` is ignored
    body.get("error").and_then(Value::as_str).map(str::to_string)
}

fn extract_field_errors(body: &Value) -> Option<FieldErrors> {
    let raw = body
        .get("errors")
        .or_else(|| body.get("field_errors"))?
        .as_object()?;

    let mut errors = FieldErrors::new();
    for (field, value) in raw {
        let messages = match value {
            Value::String(msg) => vec![msg.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            other => vec![other.to_string()],
        };
        errors.insert(field.clone(), messages);
    }

    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}

fn default_message(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {}", status))
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            tracing::error!("Response decode error: {}", err);
            ApiError::decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::server(status.as_u16(), err.to_string())
        } else {
            ApiError::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON decode error: {}", err);
        ApiError::decode(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status() {
            0 => write!(f, "{}", self.message()),
            status => write!(f, "{} ({})", self.message(), status),
        }
    }
}

impl std::error::Error for ApiError {}
