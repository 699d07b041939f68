//! Reconstruction of the message PayPal signs for each transmission.
//!
//! PayPal signs `<transmission id>|<transmission time>|<webhook id>|<crc32>`
//! where the CRC32 is computed over the raw request body and rendered as a
//! signed 32-bit decimal. Field order and the use of raw bytes are fixed by
//! the provider; any deviation fails every verification.

/// Separator between canonical message fields.
const FIELD_SEPARATOR: char = '|';

/// CRC32 (IEEE) of the raw body in two's-complement form.
pub fn body_checksum(raw_body: &[u8]) -> i32 {
    crc32fast::hash(raw_body) as i32
}

/// The exact string signed by the provider for one transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalMessage(String);

impl CanonicalMessage {
    /// Builds the canonical message from a raw body and transmission fields.
    pub fn build(
        raw_body: &[u8],
        transmission_id: &str,
        timestamp: &str,
        webhook_id: &str,
    ) -> Self {
        Self::from_parts(transmission_id, timestamp, webhook_id, body_checksum(raw_body))
    }

    /// Joins already-computed fields in signing order.
    pub fn from_parts(
        transmission_id: &str,
        timestamp: &str,
        webhook_id: &str,
        checksum: i32,
    ) -> Self {
        Self(format!(
            "{transmission_id}{sep}{timestamp}{sep}{webhook_id}{sep}{checksum}",
            sep = FIELD_SEPARATOR
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for CanonicalMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
