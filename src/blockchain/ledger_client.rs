// src/blockchain/ledger_client.rs
//! Ethereum-compatible ledger client.
//!
//! Provides a high-level interface for the anchor transaction lifecycle:
//! nonce acquisition, gas estimation, signing, submission, and a bounded
//! wait for inclusion, plus read-only contract queries.
//!
//! The write path is the one serialization point in the system: the
//! signing identity's nonce is shared mutating state, so an async mutex is
//! held from the nonce read through submission. Read queries take no lock
//! and may run fully in parallel.

use crate::error::ServiceError;
use crate::models::certificate::AnchorReceipt;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers_contract::Contract;
use ethers_core::abi::{Abi, Detokenize, Tokenize};
use ethers_core::types::{Address, BlockNumber, H256, U64};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Middleware stack used for signed writes.
type WriteClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Ledger client managing the signing wallet and contract interactions.
pub struct LedgerClient {
    /// JSON-RPC provider for read-only queries
    provider: Arc<Provider<Http>>,
    /// Signer middleware for transaction submission
    client: Arc<WriteClient>,
    /// Single-writer guard over the nonce-read -> submit sequence
    write_lock: Mutex<()>,
    /// Upper bound on the wait for transaction inclusion
    confirmation_timeout: Duration,
}

impl LedgerClient {
    /// Creates a new ledger client.
    ///
    /// # Arguments
    /// * `rpc_url` - Node JSON-RPC endpoint URL
    /// * `private_key` - Hex-encoded signing key, with or without 0x prefix
    /// * `confirmation_timeout` - Bound on the post-submission wait
    ///
    /// # Errors
    /// - `Validation` if the private key does not parse
    /// - `LedgerCommunication` if the endpoint URL is invalid or the chain
    ///   id cannot be fetched
    pub async fn new(
        rpc_url: &str,
        private_key: &str,
        confirmation_timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ServiceError::LedgerCommunication(format!("invalid rpc url: {}", e)))?;

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| ServiceError::LedgerCommunication(format!("chain id query: {}", e)))?;

        let wallet: LocalWallet = private_key
            .trim_start_matches("0x")
            .parse()
            .map_err(|e| ServiceError::validation(format!("invalid signing key: {}", e)))?;
        let wallet = wallet.with_chain_id(chain_id.as_u64());

        let client = Arc::new(SignerMiddleware::new(provider.clone(), wallet));

        Ok(Self {
            provider: Arc::new(provider),
            client,
            write_lock: Mutex::new(()),
            confirmation_timeout,
        })
    }

    /// Address of the service's signing identity.
    pub fn signer_address(&self) -> Address {
        self.client.address()
    }

    /// Sends a signed transaction to a contract and waits for inclusion.
    ///
    /// Sequence: acquire the writer lock, read the account nonce, estimate
    /// gas, sign and submit, release the lock, then wait for the receipt
    /// under the configured bound. Two concurrent writers racing on the
    /// nonce would both build valid-looking transactions of which the
    /// ledger accepts only one, hence the lock.
    ///
    /// # Errors
    /// - `LedgerCommunication` if any RPC step fails before inclusion;
    ///   the whole write may be retried from a fresh nonce
    /// - `ConfirmationPending` if the receipt does not arrive within the
    ///   bound; submission status is unknown and the caller should poll
    ///   [`Self::transaction_status`] rather than resubmit
    /// - `LedgerRejection` if the transaction was included but reverted
    pub async fn send_transaction(
        &self,
        contract_address: Address,
        abi: &Abi,
        method: &str,
        params: impl Tokenize,
    ) -> Result<AnchorReceipt, ServiceError> {
        let contract = Contract::new(contract_address, abi.clone(), self.client.clone());
        let mut call = contract
            .method::<_, ()>(method, params)
            .map_err(|e| ServiceError::LedgerCommunication(format!("method {}: {}", method, e)))?;

        let pending = {
            let _writer = self.write_lock.lock().await;

            // Pending-block nonce: counts transactions already queued in
            // the mempool, so back-to-back anchors do not reuse a nonce.
            let nonce = self
                .client
                .get_transaction_count(self.client.address(), Some(BlockNumber::Pending.into()))
                .await
                .map_err(|e| {
                    ServiceError::LedgerCommunication(format!("nonce query: {}", e))
                })?;
            call.tx.set_nonce(nonce);

            let gas = call.estimate_gas().await.map_err(|e| {
                ServiceError::LedgerCommunication(format!("gas estimate: {}", e))
            })?;
            call.tx.set_gas(gas);

            call.send().await.map_err(|e| {
                ServiceError::LedgerCommunication(format!("submission: {}", e))
            })?
            // lock released here; the confirmation wait does not touch the
            // nonce and must not block other writers
        };

        let tx_hash: H256 = *pending;
        let receipt = match tokio::time::timeout(self.confirmation_timeout, pending).await {
            Ok(Ok(Some(receipt))) => receipt,
            // Node lost track of the transaction; it may still surface.
            Ok(Ok(None)) => {
                return Err(ServiceError::ConfirmationPending {
                    tx_hash: format!("{:#x}", tx_hash),
                })
            }
            Ok(Err(e)) => return Err(ServiceError::LedgerCommunication(e.to_string())),
            Err(_elapsed) => {
                return Err(ServiceError::ConfirmationPending {
                    tx_hash: format!("{:#x}", tx_hash),
                })
            }
        };

        if receipt.status == Some(U64::zero()) {
            return Err(ServiceError::LedgerRejection {
                tx_hash: format!("{:#x}", receipt.transaction_hash),
            });
        }

        Ok(AnchorReceipt {
            tx_hash: format!("{:#x}", receipt.transaction_hash),
            block_number: receipt.block_number.unwrap_or_default().as_u64(),
        })
    }

    /// Queries a contract view function. Read-only: no transaction, no
    /// signing, no confirmation wait, no ordering constraint.
    ///
    /// # Errors
    /// `LedgerCommunication` on RPC failure or return-value decode errors,
    /// distinct from any domain-level "not found" outcome the caller maps.
    pub async fn query_contract<R: Detokenize>(
        &self,
        contract_address: Address,
        abi: &Abi,
        method: &str,
        params: impl Tokenize,
    ) -> Result<R, ServiceError> {
        let contract = Contract::new(contract_address, abi.clone(), self.provider.clone());
        contract
            .method::<_, R>(method, params)
            .map_err(|e| ServiceError::LedgerCommunication(format!("method {}: {}", method, e)))?
            .call()
            .await
            .map_err(|e| ServiceError::LedgerCommunication(e.to_string()))
    }

    /// Looks up the inclusion status of a previously submitted transaction.
    /// Recovery path after a `ConfirmationPending` outcome.
    ///
    /// # Returns
    /// - `Ok(Some(receipt))` once the transaction is included
    /// - `Ok(None)` while it is still unconfirmed
    ///
    /// # Errors
    /// - `LedgerRejection` if the transaction was included but reverted
    /// - `LedgerCommunication` on RPC failure
    pub async fn transaction_status(
        &self,
        tx_hash: H256,
    ) -> Result<Option<AnchorReceipt>, ServiceError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| ServiceError::LedgerCommunication(e.to_string()))?;

        match receipt {
            None => Ok(None),
            Some(receipt) if receipt.status == Some(U64::zero()) => {
                Err(ServiceError::LedgerRejection {
                    tx_hash: format!("{:#x}", receipt.transaction_hash),
                })
            }
            Some(receipt) => Ok(Some(AnchorReceipt {
                tx_hash: format!("{:#x}", receipt.transaction_hash),
                block_number: receipt.block_number.unwrap_or_default().as_u64(),
            })),
        }
    }
}
