//! Response bodies for the webhook endpoint.

use serde::Serialize;

/// Acknowledgment returned for accepted, duplicate and rejected deliveries.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AckResponse {
    pub received: bool,
}

impl AckResponse {
    pub fn received() -> Self {
        Self { received: true }
    }
}

/// Acknowledgment returned when our own processing failed.
///
/// Deliberately generic; details stay in the logs.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProcessingErrorResponse {
    pub error: &'static str,
}

impl ProcessingErrorResponse {
    pub fn new() -> Self {
        Self {
            error: "Processing error",
        }
    }
}

impl Default for ProcessingErrorResponse {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_serializes_as_received_true() {
        let json = serde_json::to_string(&AckResponse::received()).unwrap();
        assert_eq!(json, r#"{"received":true}"#);
    }

    #[test]
    fn processing_error_serializes_generic_message() {
        let json = serde_json::to_string(&ProcessingErrorResponse::new()).unwrap();
        assert_eq!(json, r#"{"error":"Processing error"}"#);
    }
}
