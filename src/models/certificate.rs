// src/models/certificate.rs
//! Certificate data model: the fixed field schema, the fingerprint digest,
//! and the anchor receipt returned by a confirmed ledger write.

use crate::error::ServiceError;
use ethers_core::utils::hex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Placeholder stored in a field slot when its extraction rule found no
/// match. A sentinel slot is a successful extraction outcome, and a
/// fingerprint over sentinel slots is still anchorable.
pub const NOT_FOUND: &str = "Not Found";

/// Minimum length of a content identifier accepted by the anchor path.
/// A CIDv0 (`Qm...`) is exactly 46 characters; anything shorter cannot be
/// a valid reference into the content store.
pub const MIN_CID_LEN: usize = 46;

/// The fixed, ordered schema of fields extracted from a certificate.
///
/// Every slot is always present: either the extracted text or the
/// [`NOT_FOUND`] sentinel. Declaration order matters because the
/// fingerprint canonicalization concatenates the slots in exactly this
/// order, with no separators, and that byte layout is the compatibility
/// contract with previously anchored documents.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CertificateFields {
    /// Candidate name, honorific stripped
    /// Example: "John Smith"
    pub name: String,

    /// Institutional register number
    /// Example: "AB123456"
    pub register_number: String,

    /// Month/year or date of passing, as printed
    /// Example: "MAY-2023"
    pub passing_date: String,

    /// College of study
    /// Example: "Example Institute"
    pub college: String,

    /// Cumulative grade point average, as printed
    /// Example: "8.50"
    pub cgpa: String,
}

impl CertificateFields {
    /// Canonical byte string the fingerprint is computed over: the five
    /// slots concatenated in schema order with no delimiters.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            self.name.len()
                + self.register_number.len()
                + self.passing_date.len()
                + self.college.len()
                + self.cgpa.len(),
        );
        bytes.extend_from_slice(self.name.as_bytes());
        bytes.extend_from_slice(self.register_number.as_bytes());
        bytes.extend_from_slice(self.passing_date.as_bytes());
        bytes.extend_from_slice(self.college.as_bytes());
        bytes.extend_from_slice(self.cgpa.as_bytes());
        bytes
    }
}

/// Deterministic SHA-256 digest of canonicalized certificate fields.
///
/// Always 32 bytes; rendered as 64 lowercase hex characters. The `0x`
/// prefix is accepted on input at the transport boundary and never stored.
/// Two field sets compare equal iff their fingerprints are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Derives the fingerprint of a field set.
    ///
    /// Pure: identical fields (including identical sentinel placements)
    /// always yield the same digest, across calls and across processes.
    pub fn of(fields: &CertificateFields) -> Self {
        let digest = Sha256::digest(fields.canonical_bytes());
        Fingerprint(digest.into())
    }

    /// Parses a transport-level fingerprint string.
    ///
    /// Accepts exactly 64 hex characters, case-insensitive, with or
    /// without a `0x` prefix. Anything else is a validation error; this
    /// check runs before any ledger interaction.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` when the string does not match
    /// `^(0x)?[a-fA-F0-9]{64}$`.
    pub fn parse(s: &str) -> Result<Self, ServiceError> {
        let malformed = || {
            ServiceError::validation(format!(
                "fingerprint must be 64 hex characters, got {:?}",
                s
            ))
        };

        let hex_part = s.strip_prefix("0x").unwrap_or(s);
        if hex_part.len() != 64 {
            return Err(malformed());
        }
        let decoded = hex::decode(hex_part).map_err(|_| malformed())?;

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Ok(Fingerprint(bytes))
    }

    /// Raw 32-byte digest, the `bytes32` passed to the registry contract.
    pub fn to_bytes32(self) -> [u8; 32] {
        self.0
    }

    /// Lowercase 64-character hex rendering without prefix.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Receipt for a confirmed anchor transaction.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnchorReceipt {
    /// Transaction hash on the ledger, 0x-prefixed
    pub tx_hash: String,

    /// Block number the transaction was included in; monotonically
    /// increasing across anchors from the same ledger
    pub block_number: u64,
}

/// Validates a content identifier before it reaches the ledger write path.
///
/// # Errors
/// Returns `ServiceError::Validation` when the CID is empty or shorter
/// than [`MIN_CID_LEN`].
pub fn validate_cid(cid: &str) -> Result<(), ServiceError> {
    let trimmed = cid.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation("cid must not be empty"));
    }
    if trimmed.len() < MIN_CID_LEN {
        return Err(ServiceError::validation(format!(
            "cid must be at least {} characters, got {}",
            MIN_CID_LEN,
            trimmed.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> CertificateFields {
        CertificateFields {
            name: "John Smith".into(),
            register_number: "AB123456".into(),
            passing_date: "MAY-2023".into(),
            college: "Example Institute".into(),
            cgpa: "8.50".into(),
        }
    }

    #[test]
    fn test_canonical_bytes_order_and_no_separators() {
        let fields = sample_fields();
        assert_eq!(
            fields.canonical_bytes(),
            b"John SmithAB123456MAY-2023Example Institute8.50".to_vec()
        );
    }

    #[test]
    fn test_fingerprint_known_vector() {
        // sha256 of the canonical concatenation; fixed across
        // implementations so previously anchored documents keep verifying.
        let fp = Fingerprint::of(&sample_fields());
        assert_eq!(
            fp.to_hex(),
            "5bf05c5f4d0c1e48ea283cf5c08ccffc0f4543a03af3e36c9ead9987177d109b"
        );
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let fields = sample_fields();
        assert_eq!(Fingerprint::of(&fields), Fingerprint::of(&fields));
    }

    #[test]
    fn test_fingerprint_sensitive_to_each_slot() {
        let base = Fingerprint::of(&sample_fields());
        let variants = [
            CertificateFields { name: "Jane Smith".into(), ..sample_fields() },
            CertificateFields { register_number: "AB123457".into(), ..sample_fields() },
            CertificateFields { passing_date: "JUN-2023".into(), ..sample_fields() },
            CertificateFields { college: "Other Institute".into(), ..sample_fields() },
            CertificateFields { cgpa: "8.51".into(), ..sample_fields() },
        ];
        for variant in variants {
            assert_ne!(base, Fingerprint::of(&variant));
        }
    }

    #[test]
    fn test_sentinel_fields_still_fingerprint() {
        let fields = CertificateFields {
            cgpa: NOT_FOUND.into(),
            ..sample_fields()
        };
        let fp = Fingerprint::of(&fields);
        assert_eq!(
            fp.to_hex(),
            "42b1a6ef7c9ac1b7eb947f9f03004d06edaa0da438b19ae5c847718d0550d824"
        );
    }

    #[test]
    fn test_parse_accepts_prefix_and_mixed_case() {
        let hex = "5bf05c5f4d0c1e48ea283cf5c08ccffc0f4543a03af3e36c9ead9987177d109b";
        let plain = Fingerprint::parse(hex).unwrap();
        let prefixed = Fingerprint::parse(&format!("0x{}", hex)).unwrap();
        let upper = Fingerprint::parse(&hex.to_uppercase()).unwrap();
        assert_eq!(plain, prefixed);
        assert_eq!(plain, upper);
        // Rendering is always lowercase without prefix
        assert_eq!(upper.to_hex(), hex);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        // 63 characters
        let short = "5bf05c5f4d0c1e48ea283cf5c08ccffc0f4543a03af3e36c9ead9987177d109";
        assert!(Fingerprint::parse(short).is_err());
        assert!(Fingerprint::parse(&format!("{}bb", short)).is_err());
        assert!(Fingerprint::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let bad = "zz".repeat(32);
        assert!(Fingerprint::parse(&bad).is_err());
    }

    #[test]
    fn test_parse_round_trips_bytes() {
        let fp = Fingerprint::of(&sample_fields());
        let reparsed = Fingerprint::parse(&fp.to_hex()).unwrap();
        assert_eq!(fp.to_bytes32(), reparsed.to_bytes32());
    }

    #[test]
    fn test_validate_cid() {
        assert!(validate_cid("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").is_ok());
        assert!(validate_cid("").is_err());
        assert!(validate_cid("Qmshort").is_err());
    }
}
