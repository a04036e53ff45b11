// src/main.rs

//! # Certificate Anchoring Service - Main Entry Point
//!
//! Initializes all core components and starts the API server.
//!
//! ## Architecture Overview
//! 1. **Ledger Layer**: `LedgerClient` for the Ethereum-compatible node
//! 2. **Services Layer**: extraction/fingerprint orchestration and API
//! 3. **Storage Layer**: IPFS for immutable document copies
//! 4. **Extraction Layer**: external OCR endpoint and field rules
//!
//! ## Configuration
//! Loaded once at startup via `AppConfig` (defaults, optional
//! `config.toml`, `CERT_ANCHOR_*` environment variables; `.env` is read
//! first). Required keys: `CERT_ANCHOR_RPC_URL`,
//! `CERT_ANCHOR_CONTRACT_ADDRESS`, `CERT_ANCHOR_PRIVATE_KEY`.

use crate::blockchain::ledger_client::LedgerClient;
use crate::config::AppConfig;
use crate::contracts::certificate_registry::CertificateRegistry;
use crate::extraction::ocr_client::OcrClient;
use crate::services::api_server::ApiServer;
use crate::services::session_cache::SubmissionCache;
use crate::services::verification::VerificationService;
use crate::storage::ipfs_client::IpfsStorage;
use anyhow::Context;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

// Module declarations (organized by functional domain)
mod blockchain;    // Ledger interactions
mod config;        // Runtime configuration
mod contracts;     // Smart contract interfaces
mod error;         // Error taxonomy
mod extraction;    // OCR client and field rules
mod models;        // Data structures
mod services;      // Business logic and API
mod storage;       // IPFS storage layer

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load environment configuration
/// 2. Connect to the ledger node
/// 3. Initialize service components
/// 4. Start API server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::load().context("failed to load configuration")?;

    // Ledger client (fetches the chain id, so the node must be reachable)
    let ledger = LedgerClient::new(
        &config.rpc_url,
        &config.private_key,
        Duration::from_secs(config.confirmation_timeout_secs),
    )
    .await
    .context("failed to initialize ledger client - check node URL and signing key")?;
    let ledger = Arc::new(ledger);
    log::info!(
        "ledger client ready, signing as {:#x}",
        ledger.signer_address()
    );

    // Registry contract binding
    let registry = CertificateRegistry::new(ledger.clone(), &config.contract_address)
        .context("failed to initialize registry - verify contract address")?;

    // Storage and extraction collaborators
    let ipfs_storage =
        IpfsStorage::new(&config.ipfs_api_url).context("failed to initialize IPFS client")?;
    let ocr_client = OcrClient::new(&config.ocr_api_url);

    // Core services
    let verification = VerificationService::new(Arc::new(registry));
    let cache = Arc::new(SubmissionCache::new(config.session_ttl_secs));

    let api_server = ApiServer::new(
        verification,
        ledger,
        ipfs_storage,
        ocr_client,
        cache,
        config.contract_address.clone(),
        config.allowed_origins.clone(),
    );

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .context("invalid bind address")?;
    log::info!("API server running at http://{}", addr);
    log::info!("Available endpoints:");
    log::info!("- POST /upload");
    log::info!("- POST /upload-ipfs");
    log::info!("- POST /anchor");
    log::info!("- GET  /anchor-status/:tx_hash");
    log::info!("- POST /verify");
    log::info!("- GET  /api/abi");
    log::info!("- GET  /api/config");

    api_server.run(addr).await;
    Ok(())
}
