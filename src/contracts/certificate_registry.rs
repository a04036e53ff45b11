// src/contracts/certificate_registry.rs
//! CertificateRegistry smart contract interface.
//!
//! Typed wrapper over the on-chain fingerprint -> CID mapping. The write
//! entry point binds a fingerprint to a content identifier; the read entry
//! point returns the currently retrievable CID for a fingerprint, or
//! nothing. Anchored records are immutable: corrections require a new
//! fingerprint, never an update.
//!
//! The contract ABI is compiled into the binary and immutable after
//! process start.

use crate::blockchain::ledger_client::LedgerClient;
use crate::error::ServiceError;
use crate::models::certificate::{AnchorReceipt, Fingerprint};
use ethers_core::abi::Abi;
use ethers_core::types::Address;
use std::str::FromStr;
use std::sync::Arc;

/// Raw ABI artifact for the deployed CertificateRegistry contract.
pub const CERTIFICATE_REGISTRY_ABI: &[u8] = include_bytes!("abi/CertificateRegistry.json");

/// Interface to the deployed CertificateRegistry contract.
pub struct CertificateRegistry {
    /// Ledger client carrying the signing identity and writer lock
    ledger: Arc<LedgerClient>,
    /// Address of the deployed contract
    address: Address,
    /// Parsed ABI, loaded once at construction
    abi: Abi,
}

impl CertificateRegistry {
    /// Creates a registry interface bound to a deployed contract.
    ///
    /// # Arguments
    /// * `ledger` - Shared ledger client
    /// * `contract_address` - Hex address of the deployed contract
    ///
    /// # Errors
    /// Returns `Validation` if the contract address does not parse.
    ///
    /// # Panics
    /// Panics if the compiled-in ABI artifact is malformed; that is a
    /// build defect, not a runtime condition.
    pub fn new(ledger: Arc<LedgerClient>, contract_address: &str) -> Result<Self, ServiceError> {
        let address = Address::from_str(contract_address).map_err(|e| {
            ServiceError::validation(format!("invalid contract address: {}", e))
        })?;
        let abi = Abi::load(CERTIFICATE_REGISTRY_ABI).expect("failed to load registry ABI");
        Ok(Self { ledger, address, abi })
    }

    /// Anchors a fingerprint -> CID binding on the ledger.
    ///
    /// Invokes `storeCertificate(cid, hash)` through the signed write path
    /// and blocks until the ledger confirms inclusion or the wait bound is
    /// reached. Input validation happens before this is called.
    ///
    /// # Returns
    /// Receipt with the transaction hash and inclusion block number.
    pub async fn store_certificate(
        &self,
        cid: &str,
        fingerprint: Fingerprint,
    ) -> Result<AnchorReceipt, ServiceError> {
        self.ledger
            .send_transaction(
                self.address,
                &self.abi,
                "storeCertificate",
                (cid.to_string(), fingerprint.to_bytes32()),
            )
            .await
    }

    /// Looks up the anchored CID for a fingerprint.
    ///
    /// # Returns
    /// - `Ok(Some(cid))` when an anchor exists
    /// - `Ok(None)` when no anchor exists or the contract returns an
    ///   empty/blank CID; not an error
    ///
    /// # Errors
    /// `LedgerCommunication` when the query itself fails, so callers can
    /// distinguish "unverifiable right now" from "not anchored".
    pub async fn get_certificate(
        &self,
        fingerprint: Fingerprint,
    ) -> Result<Option<String>, ServiceError> {
        let cid: String = self
            .ledger
            .query_contract(
                self.address,
                &self.abi,
                "getCertificate",
                fingerprint.to_bytes32(),
            )
            .await?;

        if cid.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(cid))
        }
    }
}
