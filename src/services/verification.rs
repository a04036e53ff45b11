// src/services/verification.rs
//! Orchestration of the fingerprint-and-anchor pipeline.
//!
//! The service ties the pure submission path (field extraction then
//! fingerprint derivation) to the ledger-backed anchor and lookup paths.
//! All transport-level validation happens here, before any external call.

use crate::contracts::certificate_registry::CertificateRegistry;
use crate::error::ServiceError;
use crate::extraction::field_extractor;
use crate::models::certificate::{validate_cid, AnchorReceipt, CertificateFields, Fingerprint};
use std::sync::Arc;

/// External contract of the verification core.
pub struct VerificationService {
    /// On-chain fingerprint -> CID registry
    registry: Arc<CertificateRegistry>,
}

impl VerificationService {
    /// Creates the service over a registry interface.
    pub fn new(registry: Arc<CertificateRegistry>) -> Self {
        Self { registry }
    }

    /// Submission path: extract the field schema from certificate text and
    /// derive its fingerprint.
    ///
    /// Pure and infallible; missing fields arrive as sentinels and still
    /// produce a valid, anchorable fingerprint. Whether to anchor an
    /// incomplete field set is the caller's decision.
    pub fn submit(&self, text: &str) -> (CertificateFields, Fingerprint) {
        let fields = field_extractor::extract(text);
        let fingerprint = Fingerprint::of(&fields);
        (fields, fingerprint)
    }

    /// Anchor path: validate inputs, then bind the fingerprint to the CID
    /// on the ledger and wait for confirmation.
    ///
    /// # Errors
    /// - `Validation` on a malformed fingerprint or short CID, raised
    ///   before any ledger interaction
    /// - ledger errors as surfaced by the write path
    pub async fn record_anchor(
        &self,
        fingerprint: &str,
        cid: &str,
    ) -> Result<AnchorReceipt, ServiceError> {
        let fingerprint = Fingerprint::parse(fingerprint)?;
        validate_cid(cid)?;

        log::info!("anchoring fingerprint {} -> cid {}", fingerprint, cid);
        self.registry.store_certificate(cid.trim(), fingerprint).await
    }

    /// Verification path: validate the fingerprint, then look up its
    /// anchored CID.
    ///
    /// # Returns
    /// `Ok(None)` when the document is not anchored; distinct from ledger
    /// communication failure, which is an error.
    pub async fn verify(&self, fingerprint: &str) -> Result<Option<String>, ServiceError> {
        let fingerprint = Fingerprint::parse(fingerprint)?;
        self.registry.get_certificate(fingerprint).await
    }
}

#[cfg(test)]
mod tests {
    use crate::models::certificate::{validate_cid, Fingerprint};

    // The anchor and verify paths share one precondition: a 64-hex
    // fingerprint and a full-length CID, checked before any RPC. These
    // exercise the checks exactly as the service applies them.

    #[test]
    fn test_anchor_preconditions_reject_short_fingerprint() {
        let sixty_three = "a".repeat(63);
        assert!(Fingerprint::parse(&sixty_three).is_err());
    }

    #[test]
    fn test_anchor_preconditions_accept_prefixed_fingerprint() {
        let valid = format!("0x{}", "ab".repeat(32));
        assert!(Fingerprint::parse(&valid).is_ok());
    }

    #[test]
    fn test_anchor_preconditions_reject_short_cid() {
        assert!(validate_cid("QmTooShort").is_err());
    }
}
