// src/error.rs
//! Error taxonomy for the certificate anchoring service.
//!
//! Every failure surfaced by the core falls into one of a small set of
//! categories so that callers can decide between retrying, rebuilding the
//! request, or polling for a pending transaction:
//! - `Validation`: malformed input, rejected before any external call
//! - `TextExtraction`: the upstream OCR capability failed
//! - `Storage`: the IPFS content store failed
//! - `LedgerCommunication`: node unreachable / RPC failure, retryable
//! - `LedgerRejection`: transaction reverted on-chain, not retryable as-is
//! - `ConfirmationPending`: submitted but unconfirmed within the wait
//!   bound; status unknown, poll by transaction hash
//!
//! "Not Found" extraction sentinels and empty lookup results are normal
//! outcomes, not errors, and never appear here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Typed failure categories for the fingerprint-and-anchor pipeline.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed request input (bad fingerprint format, short CID, missing
    /// fields). Always client-correctable; detected before any side effect.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The external text-extraction capability failed or returned an
    /// unusable response.
    #[error("text extraction failed: {0}")]
    TextExtraction(String),

    /// The content store (IPFS) could not store or retrieve data.
    #[error("content store error: {0}")]
    Storage(String),

    /// The ledger node could not be reached, or an RPC step (nonce read,
    /// gas estimate, submission) failed before inclusion. The whole write
    /// may be retried from a fresh nonce.
    #[error("ledger communication error: {0}")]
    LedgerCommunication(String),

    /// The transaction was included but reverted on-chain. Retrying the
    /// identical transaction cannot succeed; the caller must rebuild.
    #[error("transaction {tx_hash} reverted on-chain")]
    LedgerRejection { tx_hash: String },

    /// The transaction was submitted but not confirmed within the wait
    /// bound. Neither success nor failure: the caller should poll for the
    /// receipt by hash and must not resubmit automatically.
    #[error("transaction {tx_hash} submitted but unconfirmed; status unknown")]
    ConfirmationPending { tx_hash: String },
}

impl ServiceError {
    /// Shorthand for a validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }
}

/// Maps each error category onto an HTTP status with a structured
/// `{ "error": ... }` body; `ConfirmationPending` additionally reports the
/// transaction hash so the client can poll for the receipt.
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::TextExtraction(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Storage(_) => StatusCode::BAD_GATEWAY,
            ServiceError::LedgerCommunication(_) => StatusCode::BAD_GATEWAY,
            ServiceError::LedgerRejection { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::ConfirmationPending { .. } => StatusCode::ACCEPTED,
        };

        let body = match &self {
            ServiceError::ConfirmationPending { tx_hash } => json!({
                "error": self.to_string(),
                "status": "pending",
                "tx_hash": tx_hash,
            }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = ServiceError::validation("cid too short");
        assert_eq!(err.to_string(), "validation failed: cid too short");
    }

    #[test]
    fn test_pending_carries_tx_hash() {
        let err = ServiceError::ConfirmationPending {
            tx_hash: "0xabc".into(),
        };
        assert!(err.to_string().contains("0xabc"));
        assert!(err.to_string().contains("unknown"));
    }
}
