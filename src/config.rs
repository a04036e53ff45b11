// src/config.rs
//! Runtime configuration.
//!
//! Settings are layered: baked-in defaults, then an optional `config.toml`
//! next to the binary, then `CERT_ANCHOR_*` environment variables (which
//! `.env` may populate via dotenv in `main`). Credentials and endpoints
//! live here; everything else in the system is constructed from this
//! struct once at startup.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Complete runtime configuration for the service.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Ledger node JSON-RPC endpoint
    /// Example: "http://127.0.0.1:8545"
    pub rpc_url: String,

    /// Deployed CertificateRegistry contract address
    pub contract_address: String,

    /// Hex-encoded private key of the service's signing identity
    pub private_key: String,

    /// IPFS node API URL
    pub ipfs_api_url: String,

    /// Document text-extraction endpoint
    pub ocr_api_url: String,

    /// Socket address the HTTP server binds to
    pub bind_address: String,

    /// Upper bound in seconds on the wait for transaction inclusion
    pub confirmation_timeout_secs: u64,

    /// Lifetime in seconds of cached submissions
    pub session_ttl_secs: i64,

    /// Origins allowed by the CORS layer
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Loads configuration from defaults, optional file, and environment.
    ///
    /// # Errors
    /// Returns a `ConfigError` when a required key (`rpc_url`,
    /// `contract_address`, `private_key`) is missing from every layer or a
    /// value fails to deserialize.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("ipfs_api_url", "http://localhost:5001")?
            .set_default("ocr_api_url", "http://localhost:8090/extract")?
            .set_default("bind_address", "127.0.0.1:3000")?
            .set_default("confirmation_timeout_secs", 60_i64)?
            .set_default("session_ttl_secs", 1800_i64)?
            .set_default(
                "allowed_origins",
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ],
            )?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("CERT_ANCHOR"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        std::env::set_var("CERT_ANCHOR_RPC_URL", "http://127.0.0.1:8545");
        std::env::set_var(
            "CERT_ANCHOR_CONTRACT_ADDRESS",
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
        );
        std::env::set_var("CERT_ANCHOR_PRIVATE_KEY", "ab".repeat(32));

        let config = AppConfig::load().unwrap();
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.confirmation_timeout_secs, 60);
        assert_eq!(config.ipfs_api_url, "http://localhost:5001");
        assert_eq!(config.allowed_origins.len(), 2);

        std::env::remove_var("CERT_ANCHOR_RPC_URL");
        std::env::remove_var("CERT_ANCHOR_CONTRACT_ADDRESS");
        std::env::remove_var("CERT_ANCHOR_PRIVATE_KEY");
    }
}
