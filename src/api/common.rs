use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub request_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub execution_time_ms: Option<u64>,
    pub cached: bool,
}

/// Standard API error structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, request_id: String, execution_time_ms: Option<u64>, cached: bool) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            request_id,
            timestamp: chrono::Utc::now(),
            execution_time_ms,
            cached,
        }
    }

    pub fn error(error: ApiError, request_id: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
            request_id,
            timestamp: chrono::Utc::now(),
            execution_time_ms: None,
            cached: false,
        }
    }
}

impl ApiError {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn validation_error(message: &str) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn database_error(message: &str) -> Self {
        Self::new("DATABASE_ERROR", message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new("NOT_FOUND", &format!("{} not found", resource))
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn internal_server_error(message: &str) -> Self {
        Self::new("INTERNAL_SERVER_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "VALIDATION_ERROR" | "BAD_REQUEST" => StatusCode::BAD_REQUEST,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "DATABASE_ERROR" | "INTERNAL_SERVER_ERROR" => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let response = ApiResponse::<()>::error(self, Uuid::new_v4().to_string());
        (status, Json(response)).into_response()
    }
}

/// Request id from the `x-request-id` header, or a fresh one.
pub fn request_id_from(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_maps_to_400() {
        let response = ApiError::validation_error("bad input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError::not_found("Invoice").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn database_error_maps_to_500() {
        let response = ApiError::database_error("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn request_id_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "req-123".parse().unwrap());
        assert_eq!(request_id_from(&headers), "req-123");
        assert!(!request_id_from(&HeaderMap::new()).is_empty());
    }
}
