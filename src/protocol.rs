use serde::Serialize;

/// Greeting placed in every successful response.
pub const GREETING: &str = "Hello from Frontend!";

/// Error message returned whenever the backend call fails.
pub const BACKEND_UNREACHABLE: &str = "Backend is unreachable";

/// Successful response: the greeting plus the backend's raw payload.
#[derive(Debug, Serialize)]
pub struct GreetingResponse {
    pub message: &'static str,
    pub backend_says: serde_json::Value,
}

impl GreetingResponse {
    pub fn new(backend_says: serde_json::Value) -> Self {
        Self {
            message: GREETING,
            backend_says,
        }
    }
}

/// Error response returned by the API.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
