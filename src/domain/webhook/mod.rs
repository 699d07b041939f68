//! PayPal webhook authentication and routing.
//!
//! A delivery is trusted only after its transmission signature verifies
//! against the certificate PayPal names in the delivery headers:
//!
//! 1. [`TransmissionMetadata`] pulls the four transmission headers
//! 2. [`CertificateCache`] resolves the signing certificate
//! 3. [`CanonicalMessage`] rebuilds the signed string from the raw body
//! 4. [`SignatureVerifier`] checks SHA256withRSA against the certificate
//! 5. [`IdempotentWebhookProcessor`] dispatches each event id at most once

mod canonical;
mod certificate_cache;
mod delivery;
mod dispatcher;
mod errors;
mod event;
mod processor;
mod signature;

pub use canonical::{body_checksum, CanonicalMessage};
pub use certificate_cache::{cache_key, CertificateCache};
pub use delivery::{
    TransmissionMetadata, WebhookDelivery, CERT_URL_HEADER, TRANSMISSION_ID_HEADER,
    TRANSMISSION_SIG_HEADER, TRANSMISSION_TIME_HEADER,
};
pub use dispatcher::{DispatchOutcome, EventDispatcher, HandlerError, PaypalEventHandler};
pub use errors::{ErrorCategory, WebhookError};
pub use event::{PaypalEvent, PaypalEventType, VerifiedEvent};
pub use processor::IdempotentWebhookProcessor;
pub use signature::{parse_leaf_certificate, SignatureError, SignatureVerifier};

#[cfg(test)]
pub use dispatcher::test_support;
#[cfg(test)]
pub use event::PaypalEventBuilder;
#[cfg(test)]
pub use signature::fixtures;
