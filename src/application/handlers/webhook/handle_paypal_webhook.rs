//! HandlePaypalWebhookHandler - Authenticates and processes one PayPal delivery.
//!
//! Drives a delivery through
//! `Received → BodyParsed → CertResolved → SignatureChecked → Dispatched`.
//! Any failure moves it to `Rejected` (verification refused it) or ends it
//! as `Errored` (our own processing failed). Every path is acknowledged;
//! the outcome exists for logging and tests only.
//!
//! Business processing runs on its own task and is bounded by the
//! processing timeout. A delivery that overruns is answered as errored while
//! the task finishes and records its result.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::domain::webhook::{
    CanonicalMessage, CertificateCache, IdempotentWebhookProcessor, PaypalEvent,
    SignatureVerifier, TransmissionMetadata, VerifiedEvent, WebhookDelivery, WebhookError,
    TRANSMISSION_ID_HEADER,
};
use crate::ports::WebhookResult;

/// Stages a delivery moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookStage {
    Received,
    BodyParsed,
    CertResolved,
    SignatureChecked,
    Dispatched,
    Rejected,
    Acknowledged,
}

impl WebhookStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookStage::Received => "received",
            WebhookStage::BodyParsed => "body_parsed",
            WebhookStage::CertResolved => "cert_resolved",
            WebhookStage::SignatureChecked => "signature_checked",
            WebhookStage::Dispatched => "dispatched",
            WebhookStage::Rejected => "rejected",
            WebhookStage::Acknowledged => "acknowledged",
        }
    }
}

/// Internal result of handling a delivery.
///
/// `reached` is the last stage completed before the delivery was
/// acknowledged.
#[derive(Debug)]
pub enum WebhookOutcome {
    /// Verified and dispatched (or deliberately ignored as an unknown type).
    Accepted { reached: WebhookStage },
    /// Verified, but the event id was processed before.
    Duplicate { reached: WebhookStage },
    /// Refused before business processing.
    Rejected {
        reached: WebhookStage,
        error: WebhookError,
    },
    /// Verified, but processing failed.
    Errored {
        reached: WebhookStage,
        error: WebhookError,
    },
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Accepted { .. } => "accepted",
            WebhookOutcome::Duplicate { .. } => "duplicate",
            WebhookOutcome::Rejected { .. } => "rejected",
            WebhookOutcome::Errored { .. } => "errored",
        }
    }

    pub fn reached(&self) -> WebhookStage {
        match self {
            WebhookOutcome::Accepted { reached }
            | WebhookOutcome::Duplicate { reached }
            | WebhookOutcome::Rejected { reached, .. }
            | WebhookOutcome::Errored { reached, .. } => *reached,
        }
    }

    pub fn error(&self) -> Option<&WebhookError> {
        match self {
            WebhookOutcome::Rejected { error, .. } | WebhookOutcome::Errored { error, .. } => {
                Some(error)
            }
            _ => None,
        }
    }

    /// Rejected if verification refused the delivery, errored otherwise.
    fn failed(reached: WebhookStage, error: WebhookError) -> Self {
        if error.is_rejection() {
            WebhookOutcome::Rejected { reached, error }
        } else {
            WebhookOutcome::Errored { reached, error }
        }
    }
}

/// Values the verification step needs from configuration.
#[derive(Debug, Clone)]
pub struct WebhookVerificationSettings {
    /// Webhook id registered with PayPal; part of the signed message.
    pub webhook_id: String,
    /// Hosts (and their subdomains) allowed to serve signing certificates.
    pub allowed_cert_hosts: Vec<String>,
}

impl WebhookVerificationSettings {
    /// Returns true if `cert_url` is https on an allowed host.
    pub fn is_trusted_cert_url(&self, cert_url: &str) -> bool {
        let Ok(url) = reqwest::Url::parse(cert_url) else {
            return false;
        };
        if url.scheme() != "https" {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();

        self.allowed_cert_hosts.iter().any(|allowed| {
            let allowed = allowed.trim().trim_start_matches('.').to_ascii_lowercase();
            !allowed.is_empty()
                && (host == allowed || host.ends_with(&format!(".{}", allowed)))
        })
    }
}

/// Default bound on business processing of one delivery.
const DEFAULT_PROCESSING_TIMEOUT: Duration = Duration::from_secs(30);

/// Handler for inbound PayPal webhook deliveries.
pub struct HandlePaypalWebhookHandler {
    settings: WebhookVerificationSettings,
    certificates: Arc<CertificateCache>,
    verifier: SignatureVerifier,
    processor: Arc<IdempotentWebhookProcessor>,
    processing_timeout: Duration,
}

impl HandlePaypalWebhookHandler {
    pub fn new(
        settings: WebhookVerificationSettings,
        certificates: Arc<CertificateCache>,
        processor: Arc<IdempotentWebhookProcessor>,
    ) -> Self {
        Self {
            settings,
            certificates,
            verifier: SignatureVerifier::new(),
            processor,
            processing_timeout: DEFAULT_PROCESSING_TIMEOUT,
        }
    }

    pub fn with_processing_timeout(mut self, timeout: Duration) -> Self {
        self.processing_timeout = timeout;
        self
    }

    /// Handle one delivery. Never fails; the outcome records what happened.
    pub async fn handle(&self, delivery: WebhookDelivery) -> WebhookOutcome {
        let parsed = PaypalEvent::from_slice(delivery.body());

        tracing::info!(
            transmission_id = delivery.header(TRANSMISSION_ID_HEADER).unwrap_or("-"),
            event_id = parsed.as_ref().map(|e| e.id.as_str()).unwrap_or("-"),
            event_type = parsed.as_ref().map(|e| e.event_type.as_str()).unwrap_or("-"),
            body_bytes = delivery.body().len(),
            "PayPal webhook received"
        );

        let outcome = self.run(&delivery, parsed).await;
        log_outcome(&delivery, &outcome);
        outcome
    }

    /// Acknowledge a delivery whose body could not be read.
    ///
    /// `delivery` carries the headers only.
    pub fn reject_unreadable(&self, delivery: &WebhookDelivery, reason: String) -> WebhookOutcome {
        tracing::info!(
            transmission_id = delivery.header(TRANSMISSION_ID_HEADER).unwrap_or("-"),
            "PayPal webhook received with unreadable body"
        );

        let outcome = WebhookOutcome::failed(
            WebhookStage::Received,
            WebhookError::MalformedDelivery(reason),
        );
        log_outcome(delivery, &outcome);
        outcome
    }

    async fn run(
        &self,
        delivery: &WebhookDelivery,
        parsed: Result<PaypalEvent, WebhookError>,
    ) -> WebhookOutcome {
        // Received → BodyParsed
        let event = match parsed {
            Ok(event) => event,
            Err(e) => return WebhookOutcome::failed(WebhookStage::Received, e),
        };

        // BodyParsed → CertResolved
        let metadata = match TransmissionMetadata::from_delivery(delivery) {
            Ok(metadata) => metadata,
            Err(e) => return WebhookOutcome::failed(WebhookStage::BodyParsed, e),
        };

        if !self.settings.is_trusted_cert_url(&metadata.cert_url) {
            return WebhookOutcome::failed(
                WebhookStage::BodyParsed,
                WebhookError::UntrustedCertificateUrl(metadata.cert_url.clone()),
            );
        }

        let certificate_pem = match self.certificates.resolve(&metadata.cert_url).await {
            Ok(pem) => pem,
            Err(e) => return WebhookOutcome::failed(WebhookStage::BodyParsed, e),
        };

        // CertResolved → SignatureChecked
        let message = CanonicalMessage::build(
            delivery.body(),
            &metadata.transmission_id,
            &metadata.transmission_time,
            &self.settings.webhook_id,
        );

        if let Err(reason) = self
            .verifier
            .check(&message, &metadata.signature, &certificate_pem)
        {
            tracing::debug!(
                transmission_id = %metadata.transmission_id,
                reason = %reason,
                "Signature check failed"
            );
            return WebhookOutcome::failed(
                WebhookStage::CertResolved,
                WebhookError::SignatureMismatch,
            );
        }

        // SignatureChecked → Dispatched
        match self.process(event, &metadata.transmission_id).await {
            Ok(WebhookResult::Processed) => WebhookOutcome::Accepted {
                reached: WebhookStage::Dispatched,
            },
            Ok(WebhookResult::AlreadyProcessed) => WebhookOutcome::Duplicate {
                reached: WebhookStage::SignatureChecked,
            },
            Err(error) => WebhookOutcome::failed(WebhookStage::SignatureChecked, error),
        }
    }

    async fn process(
        &self,
        event: PaypalEvent,
        transmission_id: &str,
    ) -> Result<WebhookResult, WebhookError> {
        let processor = self.processor.clone();
        let transmission_id = transmission_id.to_string();
        let task = tokio::spawn(async move {
            processor
                .process(VerifiedEvent::verified(event), &transmission_id)
                .await
        });

        match tokio::time::timeout(self.processing_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(WebhookError::ProcessingIncomplete(format!(
                "processing task aborted: {}",
                join_error
            ))),
            Err(_) => Err(WebhookError::ProcessingIncomplete(format!(
                "exceeded {:?}; processing continues in the background",
                self.processing_timeout
            ))),
        }
    }
}

fn log_outcome(delivery: &WebhookDelivery, outcome: &WebhookOutcome) {
    let transmission_id = delivery.header(TRANSMISSION_ID_HEADER).unwrap_or("-");
    let reached = outcome.reached().as_str();
    let elapsed_ms = (Utc::now() - delivery.received_at()).num_milliseconds();

    if let Some(error) = outcome.error() {
        let category = match error {
            WebhookError::UntrustedCertificateUrl(_) => "untrusted_certificate",
            other => other.category().as_str(),
        };

        // A certificate we could not fetch is a rejection, but an operational one.
        let operational = !error.is_rejection()
            || matches!(error, WebhookError::CertificateFetch(_));

        if operational {
            tracing::error!(
                category,
                transmission_id,
                reached,
                error = %error,
                "PayPal webhook not processed"
            );
        } else if error.is_security_event() {
            tracing::warn!(
                category,
                security = true,
                transmission_id,
                reached,
                error = %error,
                "PayPal webhook rejected"
            );
        } else {
            tracing::warn!(
                category,
                transmission_id,
                reached,
                error = %error,
                "PayPal webhook rejected"
            );
        }
    }

    tracing::info!(
        transmission_id,
        outcome = outcome.as_str(),
        reached,
        elapsed_ms,
        stage = WebhookStage::Acknowledged.as_str(),
        "PayPal webhook acknowledged"
    );
}
