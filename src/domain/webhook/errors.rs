//! Webhook error types for PayPal webhook handling.
//!
//! Every component in the verification pipeline returns one of these
//! errors. They are only collapsed into the uniform "acknowledge" response
//! at the HTTP boundary, so callers and tests can inspect the exact kind.

use thiserror::Error;

/// Errors that occur during webhook verification and processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Body was not valid JSON or lacked required event fields.
    #[error("Malformed delivery: {0}")]
    MalformedDelivery(String),

    /// A required transmission header was absent or empty.
    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    /// The certificate URL does not point at a trusted PayPal host.
    #[error("Untrusted certificate URL: {0}")]
    UntrustedCertificateUrl(String),

    /// The signing certificate could not be downloaded and none was cached.
    #[error("Certificate fetch failed: {0}")]
    CertificateFetch(String),

    /// The transmission signature did not verify against the certificate.
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// An event reached the dispatcher without a verified signature.
    #[error("Event signature has not been verified")]
    UnverifiedEvent,

    /// A business handler returned an error or panicked.
    #[error("Handler for {event_type} failed: {reason}")]
    HandlerFailure { event_type: String, reason: String },

    /// The processed-event log could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Processing did not finish in time or was aborted.
    #[error("Processing incomplete: {0}")]
    ProcessingIncomplete(String),
}

/// Coarse classification used for log fields and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    MalformedDelivery,
    CertificateFetchError,
    SignatureMismatch,
    HandlerFailure,
    Internal,
}

impl ErrorCategory {
    /// Stable snake_case name used as the `category` log field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::MalformedDelivery => "malformed_delivery",
            ErrorCategory::CertificateFetchError => "certificate_fetch",
            ErrorCategory::SignatureMismatch => "signature_mismatch",
            ErrorCategory::HandlerFailure => "handler_failure",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl WebhookError {
    /// Maps the error onto the failure taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            WebhookError::MalformedDelivery(_) | WebhookError::MissingHeader(_) => {
                ErrorCategory::MalformedDelivery
            }

            WebhookError::CertificateFetch(_) => ErrorCategory::CertificateFetchError,

            // Forged or misdirected deliveries
            WebhookError::SignatureMismatch | WebhookError::UntrustedCertificateUrl(_) => {
                ErrorCategory::SignatureMismatch
            }

            WebhookError::HandlerFailure { .. } => ErrorCategory::HandlerFailure,

            WebhookError::UnverifiedEvent
            | WebhookError::Storage(_)
            | WebhookError::ProcessingIncomplete(_) => ErrorCategory::Internal,
        }
    }

    /// Returns true if the error may indicate a forged delivery attempt.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            WebhookError::SignatureMismatch | WebhookError::UntrustedCertificateUrl(_)
        )
    }

    /// Returns true if the delivery was refused before business processing.
    ///
    /// Rejections are a normal outcome of verification; everything else is
    /// a failure inside our own processing.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            WebhookError::MalformedDelivery(_)
                | WebhookError::MissingHeader(_)
                | WebhookError::UntrustedCertificateUrl(_)
                | WebhookError::CertificateFetch(_)
                | WebhookError::SignatureMismatch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // Display Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn missing_header_displays_header_name() {
        let err = WebhookError::MissingHeader("paypal-transmission-id");
        assert_eq!(format!("{}", err), "Missing header: paypal-transmission-id");
    }

    #[test]
    fn signature_mismatch_displays_correctly() {
        assert_eq!(format!("{}", WebhookError::SignatureMismatch), "Signature mismatch");
    }

    #[test]
    fn handler_failure_displays_type_and_reason() {
        let err = WebhookError::HandlerFailure {
            event_type: "BILLING.SUBSCRIPTION.ACTIVATED".to_string(),
            reason: "db down".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Handler for BILLING.SUBSCRIPTION.ACTIVATED failed: db down"
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Classification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn header_and_body_problems_are_malformed_deliveries() {
        assert_eq!(
            WebhookError::MissingHeader("paypal-cert-url").category(),
            ErrorCategory::MalformedDelivery
        );
        assert_eq!(
            WebhookError::MalformedDelivery("bad json".to_string()).category(),
            ErrorCategory::MalformedDelivery
        );
    }

    #[test]
    fn fetch_failure_is_distinct_from_signature_mismatch() {
        let fetch = WebhookError::CertificateFetch("timeout".to_string());
        let forged = WebhookError::SignatureMismatch;

        assert_ne!(fetch.category(), forged.category());
        assert!(!fetch.is_security_event());
        assert!(forged.is_security_event());
    }

    #[test]
    fn untrusted_certificate_url_is_security_event() {
        let err = WebhookError::UntrustedCertificateUrl("https://evil.example".to_string());
        assert!(err.is_security_event());
        assert!(err.is_rejection());
    }

    #[test]
    fn handler_failure_is_not_a_rejection() {
        let err = WebhookError::HandlerFailure {
            event_type: "PAYMENT.SALE.COMPLETED".to_string(),
            reason: "boom".to_string(),
        };
        assert!(!err.is_rejection());
        assert_eq!(err.category(), ErrorCategory::HandlerFailure);
    }

    #[test]
    fn incomplete_processing_is_internal_failure() {
        let err = WebhookError::ProcessingIncomplete("exceeded 30s".to_string());
        assert!(!err.is_rejection());
        assert_eq!(err.category(), ErrorCategory::Internal);
    }

    #[test]
    fn storage_error_is_internal() {
        let err = WebhookError::Storage("lock poisoned".to_string());
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert_eq!(err.category().as_str(), "internal");
    }
}
