//! Inbound delivery and its transmission metadata.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::errors::WebhookError;

/// Header carrying the per-attempt transmission identifier.
pub const TRANSMISSION_ID_HEADER: &str = "paypal-transmission-id";
/// Header carrying the provider's transmission timestamp.
pub const TRANSMISSION_TIME_HEADER: &str = "paypal-transmission-time";
/// Header carrying the signing certificate location.
pub const CERT_URL_HEADER: &str = "paypal-cert-url";
/// Header carrying the base64 transmission signature.
pub const TRANSMISSION_SIG_HEADER: &str = "paypal-transmission-sig";

/// One inbound HTTP notification, exactly as received.
///
/// The body is kept as raw bytes because the checksum in the signed
/// message is computed over them; it must never be rebuilt from parsed JSON.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    body: Vec<u8>,
    headers: HashMap<String, String>,
    received_at: DateTime<Utc>,
}

impl WebhookDelivery {
    /// Creates a delivery, lower-casing every header name.
    pub fn new<I, K, V>(body: impl Into<Vec<u8>>, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
            .collect();

        Self {
            body: body.into(),
            headers,
            received_at: Utc::now(),
        }
    }

    /// The raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

/// Provider-supplied identifiers accompanying one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionMetadata {
    /// Opaque id, unique per delivery attempt.
    pub transmission_id: String,
    /// Provider timestamp, used verbatim in the signed message.
    pub transmission_time: String,
    /// Where the signing certificate can be downloaded.
    pub cert_url: String,
    /// Base64-encoded signature over the canonical message.
    pub signature: String,
}

impl TransmissionMetadata {
    /// Extracts all four transmission headers from a delivery.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::MissingHeader` naming the first header that is
    /// absent or blank.
    pub fn from_delivery(delivery: &WebhookDelivery) -> Result<Self, WebhookError> {
        let required = |name: &'static str| -> Result<String, WebhookError> {
            delivery
                .header(name)
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
                .ok_or(WebhookError::MissingHeader(name))
        };

        Ok(Self {
            transmission_id: required(TRANSMISSION_ID_HEADER)?,
            transmission_time: required(TRANSMISSION_TIME_HEADER)?,
            cert_url: required(CERT_URL_HEADER)?,
            signature: required(TRANSMISSION_SIG_HEADER)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_headers() -> Vec<(&'static str, &'static str)> {
        vec![
            ("PayPal-Transmission-Id", "T1"),
            ("PayPal-Transmission-Time", "2024-01-01T00:00:00Z"),
            ("PayPal-Cert-Url", "https://api.paypal.com/cert.pem"),
            ("PayPal-Transmission-Sig", "c2lnbmF0dXJl"),
        ]
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let delivery = WebhookDelivery::new(b"{}".to_vec(), full_headers());

        assert_eq!(delivery.header("paypal-transmission-id"), Some("T1"));
        assert_eq!(delivery.header("PAYPAL-TRANSMISSION-ID"), Some("T1"));
    }

    #[test]
    fn body_is_kept_byte_for_byte() {
        let raw = b"{ \"id\" :  \"WH-1\" }\n".to_vec();
        let delivery = WebhookDelivery::new(raw.clone(), full_headers());

        assert_eq!(delivery.body(), raw.as_slice());
    }

    #[test]
    fn metadata_extracts_all_four_headers() {
        let delivery = WebhookDelivery::new(b"{}".to_vec(), full_headers());

        let meta = TransmissionMetadata::from_delivery(&delivery).unwrap();

        assert_eq!(meta.transmission_id, "T1");
        assert_eq!(meta.transmission_time, "2024-01-01T00:00:00Z");
        assert_eq!(meta.cert_url, "https://api.paypal.com/cert.pem");
        assert_eq!(meta.signature, "c2lnbmF0dXJl");
    }

    #[test]
    fn metadata_fails_closed_for_each_missing_header() {
        for missing in [
            TRANSMISSION_ID_HEADER,
            TRANSMISSION_TIME_HEADER,
            CERT_URL_HEADER,
            TRANSMISSION_SIG_HEADER,
        ] {
            let headers: Vec<_> = full_headers()
                .into_iter()
                .filter(|(k, _)| !k.eq_ignore_ascii_case(missing))
                .collect();
            let delivery = WebhookDelivery::new(b"{}".to_vec(), headers);

            let result = TransmissionMetadata::from_delivery(&delivery);

            assert!(
                matches!(result, Err(WebhookError::MissingHeader(name)) if name == missing),
                "expected missing {}",
                missing
            );
        }
    }

    #[test]
    fn transmission_time_is_kept_verbatim() {
        let mut headers = full_headers();
        headers[1] = ("PayPal-Transmission-Time", " 2024-01-01T00:00:00Z ");
        let delivery = WebhookDelivery::new(b"{}".to_vec(), headers);

        let meta = TransmissionMetadata::from_delivery(&delivery).unwrap();

        assert_eq!(meta.transmission_time, " 2024-01-01T00:00:00Z ");
    }

    #[test]
    fn blank_header_counts_as_missing() {
        let mut headers = full_headers();
        headers[3] = ("PayPal-Transmission-Sig", "   ");
        let delivery = WebhookDelivery::new(b"{}".to_vec(), headers);

        let result = TransmissionMetadata::from_delivery(&delivery);

        assert!(matches!(
            result,
            Err(WebhookError::MissingHeader(TRANSMISSION_SIG_HEADER))
        ));
    }
}
