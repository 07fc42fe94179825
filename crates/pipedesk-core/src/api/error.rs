use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Session expired - please sign in again")]
    SessionExpired,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid dragging large payloads into logs
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Pull the `detail` field out of a FastAPI-style error body, falling
    /// back to the (truncated) raw body.
    pub(crate) fn detail_from_body(body: &str) -> String {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            detail: String,
        }

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed.detail,
            Err(_) => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::SessionExpired,
            403 => ApiError::AccessDenied(Self::detail_from_body(body)),
            404 => ApiError::NotFound(Self::detail_from_body(body)),
            500..=599 => ApiError::ServerError(Self::truncate_body(body)),
            _ => ApiError::InvalidResponse(format!(
                "Status {}: {}",
                status,
                Self::truncate_body(body)
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::SessionExpired
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, r#"{"detail": "Not enough permissions"}"#),
            ApiError::AccessDenied(msg) if msg == "Not enough permissions"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, r#"{"detail": "Company not found"}"#),
            ApiError::NotFound(msg) if msg == "Company not found"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            ApiError::ServerError(msg) if msg == "boom"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_detail_falls_back_to_raw_body() {
        assert_eq!(ApiError::detail_from_body("plain text"), "plain text");
        assert_eq!(
            ApiError::detail_from_body(r#"{"detail": "Email already registered"}"#),
            "Email already registered"
        );
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        let rendered = match ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, &body) {
            ApiError::ServerError(msg) => msg,
            other => panic!("unexpected variant: {:?}", other),
        };
        assert!(rendered.len() < body.len());
        assert!(rendered.contains("truncated"));
    }
}
