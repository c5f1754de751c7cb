use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
///
/// Every variant is terminal for the request that produced it; nothing here
/// is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// One or more required lead fields could not be resolved.
    Validation {
        /// Missing logical field names, in check order.
        missing: Vec<String>,
    },
    /// Malformed input that is not a missing-field problem.
    BadRequest(String),
    /// No usable credential set, or otherwise unusable configuration.
    Configuration(String),
    /// Entrata answered with a non-success status.
    UpstreamRejected {
        /// HTTP status returned by Entrata.
        status: u16,
        /// Raw response body, untouched.
        body: String,
    },
    /// Entrata could not be reached (connect error, DNS, timeout).
    UpstreamUnreachable(String),
}

impl AppError {
    /// Builds a validation error from the missing field names.
    pub fn missing_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AppError::Validation {
            missing: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation { missing } => write!(f, "Missing: {}", missing.join(", ")),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            AppError::UpstreamRejected { status, body } => {
                write!(f, "Entrata rejected the lead ({}): {}", status, body)
            }
            AppError::UpstreamUnreachable(msg) => write!(f, "Entrata unreachable: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Missing content type, malformed JSON and similar body defects.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Client defects map to 400, upstream rejections to 502 with the raw
    /// upstream body, everything else to 500.
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation { missing } => {
                tracing::warn!("Lead rejected: {}", self);
                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error": self.to_string(),
                        "missing": missing,
                    }),
                )
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Service misconfigured" }),
                )
            }
            AppError::UpstreamRejected { status, body } => {
                tracing::error!("Entrata error ({}): {}", status, body);
                let message = if body.is_empty() {
                    "Entrata rejected the lead"
                } else {
                    body.as_str()
                };
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "error": message,
                        "upstream_status": status,
                        "upstream_body": body,
                    }),
                )
            }
            AppError::UpstreamUnreachable(msg) => {
                tracing::error!("Handler error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Failed to send lead" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_fields_in_order() {
        let err = AppError::missing_fields(["phone", "propertyId"]);
        assert_eq!(err.to_string(), "Missing: phone, propertyId");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::missing_fields(["email"]).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::UpstreamRejected {
                status: 502,
                body: "bad org".to_string()
            }
            .into_response()
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::UpstreamUnreachable("timeout".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Configuration("no credentials".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
