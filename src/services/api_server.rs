// src/services/api_server.rs
//! API Server for the certificate anchoring service
//!
//! This module provides the REST API interface for the fingerprint-and-
//! anchor pipeline: certificate upload and field extraction, IPFS storage
//! of the document bytes, anchoring the fingerprint -> CID binding on the
//! ledger, and later verification of a fingerprint against the ledger.
//!
//! The API is built using Axum. Every failure is returned as a structured
//! `{ "error": ... }` body with a non-2xx status through the
//! `ServiceError` conversion; handlers themselves only map outcomes.

use crate::blockchain::ledger_client::LedgerClient;
use crate::contracts::certificate_registry::CERTIFICATE_REGISTRY_ABI;
use crate::error::ServiceError;
use crate::extraction::ocr_client::{media_type_for, OcrClient};
use crate::models::certificate::CertificateFields;
use crate::services::session_cache::SubmissionCache;
use crate::services::verification::VerificationService;
use crate::storage::ipfs_client::IpfsStorage;
use axum::{
    extract::{Json, Multipart, Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use ethers_core::types::H256;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

// API request and response structures

/// Response for a certificate upload: the extracted schema, its
/// fingerprint, and the session token the anchor call may refer back to.
#[derive(Serialize, Deserialize)]
struct UploadResponse {
    #[serde(flatten)]
    fields: CertificateFields,
    fingerprint: String,
    session_id: String,
}

/// Request payload for storing document bytes in the content store
#[derive(Serialize, Deserialize)]
struct StoreDocumentRequest {
    /// Base64 file content, optionally as a `data:` URI
    file: String,
}

/// Response containing the content identifier of stored bytes
#[derive(Serialize, Deserialize)]
struct StoreDocumentResponse {
    cid: String,
}

/// Request payload for anchoring a fingerprint -> CID binding
#[derive(Serialize, Deserialize)]
struct AnchorRequest {
    fingerprint: String,
    cid: String,
    /// Session token from a prior upload; its cache entry is evicted once
    /// the anchor confirms
    session_id: Option<String>,
}

/// Response for a confirmed anchor operation
#[derive(Serialize, Deserialize)]
struct AnchorResponse {
    tx_hash: String,
    block_number: u64,
}

/// Request payload for verifying a fingerprint against the ledger
#[derive(Serialize, Deserialize)]
struct VerifyRequest {
    fingerprint: String,
}

/// Response for a verification lookup
#[derive(Serialize, Deserialize)]
struct VerifyResponse {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cid: Option<String>,
    message: String,
}

/// Response for an anchor-status poll
#[derive(Serialize, Deserialize)]
struct AnchorStatusResponse {
    confirmed: bool,
    tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_number: Option<u64>,
}

/// API server state containing all service dependencies
pub struct ApiServer {
    /// Orchestrator of extraction, fingerprinting, anchoring, lookup
    verification: Arc<VerificationService>,

    /// Ledger client, used directly for transaction-status polls
    ledger: Arc<LedgerClient>,

    /// Content store for immutable document copies
    ipfs_storage: IpfsStorage,

    /// Client for the external text-extraction capability
    ocr_client: OcrClient,

    /// Per-session cache of pending submissions
    cache: Arc<SubmissionCache>,

    /// Deployed registry contract address, served to clients
    contract_address: String,

    /// Origins accepted by the CORS layer
    allowed_origins: Vec<String>,

    /// Registry ABI as JSON, parsed once at startup
    abi_json: serde_json::Value,
}

impl ApiServer {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `verification` - Pipeline orchestration service
    /// * `ledger` - Ledger client for status polls
    /// * `ipfs_storage` - Content store client
    /// * `ocr_client` - Text extraction client
    /// * `cache` - Submission cache
    /// * `contract_address` - Deployed registry address
    /// * `allowed_origins` - CORS origins
    ///
    /// # Panics
    /// Panics if the compiled-in ABI artifact is not valid JSON.
    pub fn new(
        verification: VerificationService,
        ledger: Arc<LedgerClient>,
        ipfs_storage: IpfsStorage,
        ocr_client: OcrClient,
        cache: Arc<SubmissionCache>,
        contract_address: String,
        allowed_origins: Vec<String>,
    ) -> Self {
        let abi_json = serde_json::from_slice(CERTIFICATE_REGISTRY_ABI)
            .expect("registry ABI artifact is not valid JSON");
        ApiServer {
            verification: Arc::new(verification),
            ledger,
            ipfs_storage,
            ocr_client,
            cache,
            contract_address,
            allowed_origins,
            abi_json,
        }
    }

    /// Starts the API server and begins listening for requests
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    pub async fn run(&self, addr: SocketAddr) {
        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any);

        let app = Router::new()
            .route("/upload", post(Self::upload_handler))
            .route("/upload-ipfs", post(Self::store_document_handler))
            .route("/anchor", post(Self::anchor_handler))
            .route("/anchor-status/:tx_hash", get(Self::anchor_status_handler))
            .route("/verify", post(Self::verify_handler))
            .route("/api/abi", get(Self::abi_handler))
            .route("/api/config", get(Self::config_handler))
            .layer(cors)
            .with_state(Arc::new(self.clone()));

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("failed to bind API listener");

        axum::serve(listener, app)
            .await
            .expect("API server terminated");
    }

    // =====================
    // Submission Handlers
    // =====================

    /// Accepts a certificate scan, extracts its fields, and derives the
    /// fingerprint
    ///
    /// # Endpoint
    /// POST /upload (multipart, file part named `certificate`)
    ///
    /// # Responses
    /// - 200 OK: extracted fields, fingerprint, session token
    /// - 400 Bad Request: no file part in the request
    /// - 502 Bad Gateway: text extraction failed upstream
    async fn upload_handler(
        State(state): State<Arc<ApiServer>>,
        mut multipart: Multipart,
    ) -> Result<impl IntoResponse, ServiceError> {
        let purged = state.cache.purge_expired();
        if purged > 0 {
            log::debug!(
                "dropped {} expired submissions, {} live",
                purged,
                state.cache.len()
            );
        }

        let mut document: Option<(String, Vec<u8>)> = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServiceError::validation(format!("malformed multipart body: {}", e)))?
        {
            if field.name() == Some("certificate") {
                let filename = field.file_name().unwrap_or("certificate").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    ServiceError::validation(format!("unreadable file part: {}", e))
                })?;
                document = Some((filename, bytes.to_vec()));
            }
        }
        let (filename, bytes) =
            document.ok_or_else(|| ServiceError::validation("no certificate file provided"))?;

        let text = state
            .ocr_client
            .extract_text(bytes, media_type_for(&filename))
            .await?;
        let (fields, fingerprint) = state.verification.submit(&text);
        let session_id = state.cache.insert(fields.clone(), fingerprint);

        log::info!(
            "submission {}: fingerprint {} from {}",
            session_id,
            fingerprint,
            filename
        );
        Ok(Json(UploadResponse {
            fields,
            fingerprint: fingerprint.to_hex(),
            session_id,
        }))
    }

    /// Stores document bytes in the content store
    ///
    /// # Endpoint
    /// POST /upload-ipfs
    ///
    /// # Request Body
    /// JSON payload with a base64 (optionally data-URI) `file` field
    ///
    /// # Responses
    /// - 200 OK: returns the CID
    /// - 400 Bad Request: undecodable base64
    /// - 502 Bad Gateway: content store failed
    async fn store_document_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<StoreDocumentRequest>,
    ) -> Result<impl IntoResponse, ServiceError> {
        // Accept both "data:<type>;base64,<payload>" and bare base64
        let encoded = payload.file.rsplit(',').next().unwrap_or(&payload.file);
        let bytes = base64::decode(encoded)
            .map_err(|e| ServiceError::validation(format!("invalid base64 file data: {}", e)))?;
        if bytes.is_empty() {
            return Err(ServiceError::validation("empty file data"));
        }

        let cid = state.ipfs_storage.store_data(bytes).await?;
        Ok(Json(StoreDocumentResponse { cid }))
    }

    // =====================
    // Anchor Handlers
    // =====================

    /// Anchors a fingerprint -> CID binding on the ledger
    ///
    /// # Endpoint
    /// POST /anchor
    ///
    /// # Responses
    /// - 200 OK: transaction hash and inclusion block
    /// - 202 Accepted: submitted but unconfirmed within the wait bound;
    ///   poll /anchor-status/:tx_hash
    /// - 400 Bad Request: malformed fingerprint or CID, no ledger call made
    /// - 422 Unprocessable Entity: transaction reverted on-chain
    /// - 502 Bad Gateway: ledger unreachable
    async fn anchor_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<AnchorRequest>,
    ) -> Result<impl IntoResponse, ServiceError> {
        // When the caller refers back to an upload session, the anchored
        // fingerprint must be the one derived from that submission.
        if let Some(session_id) = &payload.session_id {
            if let Some(cached) = state.cache.get(session_id) {
                let requested = payload.fingerprint.trim_start_matches("0x").to_lowercase();
                if cached.fingerprint.to_hex() != requested {
                    log::debug!("session {} holds fields {:?}", session_id, cached.fields);
                    return Err(ServiceError::validation(
                        "fingerprint does not match the cached submission",
                    ));
                }
            }
        }

        let receipt = state
            .verification
            .record_anchor(&payload.fingerprint, &payload.cid)
            .await?;

        // The submission is anchored; its cached fields are done with.
        if let Some(session_id) = payload.session_id {
            state.cache.remove(&session_id);
        }

        Ok(Json(AnchorResponse {
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
        }))
    }

    /// Polls the inclusion status of a previously submitted anchor
    /// transaction; the recovery path after a 202 response
    ///
    /// # Endpoint
    /// GET /anchor-status/:tx_hash
    ///
    /// # Responses
    /// - 200 OK: `{confirmed, tx_hash, block_number?}`
    /// - 400 Bad Request: malformed transaction hash
    /// - 422 Unprocessable Entity: transaction reverted on-chain
    async fn anchor_status_handler(
        State(state): State<Arc<ApiServer>>,
        Path(tx_hash): Path<String>,
    ) -> Result<impl IntoResponse, ServiceError> {
        let hash = H256::from_str(tx_hash.trim_start_matches("0x"))
            .map_err(|e| ServiceError::validation(format!("invalid transaction hash: {}", e)))?;

        match state.ledger.transaction_status(hash).await? {
            Some(receipt) => Ok(Json(AnchorStatusResponse {
                confirmed: true,
                tx_hash: receipt.tx_hash,
                block_number: Some(receipt.block_number),
            })),
            None => Ok(Json(AnchorStatusResponse {
                confirmed: false,
                tx_hash: format!("{:#x}", hash),
                block_number: None,
            })),
        }
    }

    // =====================
    // Verification Handler
    // =====================

    /// Verifies a fingerprint against the ledger
    ///
    /// # Endpoint
    /// POST /verify
    ///
    /// # Responses
    /// - 200 OK: `{valid, cid?}`; `valid` is false when no anchor exists,
    ///   which is an outcome, not an error
    /// - 400 Bad Request: malformed fingerprint, no ledger call made
    /// - 502 Bad Gateway: ledger unreachable (distinct from "not
    ///   anchored" so clients can tell "unverifiable right now" apart)
    async fn verify_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<VerifyRequest>,
    ) -> Result<impl IntoResponse, ServiceError> {
        match state.verification.verify(&payload.fingerprint).await? {
            Some(cid) => Ok(Json(VerifyResponse {
                valid: true,
                cid: Some(cid),
                message: "Certificate verified successfully".into(),
            })),
            None => Ok(Json(VerifyResponse {
                valid: false,
                cid: None,
                message: "Certificate not found".into(),
            })),
        }
    }

    // =====================
    // Configuration Handlers
    // =====================

    /// Serves the registry contract ABI to clients
    ///
    /// # Endpoint
    /// GET /api/abi
    async fn abi_handler(State(state): State<Arc<ApiServer>>) -> impl IntoResponse {
        (StatusCode::OK, Json(state.abi_json.clone()))
    }

    /// Serves the ledger configuration clients need to reference anchors
    ///
    /// # Endpoint
    /// GET /api/config
    async fn config_handler(State(state): State<Arc<ApiServer>>) -> impl IntoResponse {
        Json(json!({
            "contract_address": state.contract_address,
            "service_address": format!("{:#x}", state.ledger.signer_address()),
        }))
    }
}

// Implement Clone for ApiServer to use with Axum's State
impl Clone for ApiServer {
    fn clone(&self) -> Self {
        ApiServer {
            verification: Arc::clone(&self.verification),
            ledger: Arc::clone(&self.ledger),
            ipfs_storage: self.ipfs_storage.clone(),
            ocr_client: self.ocr_client.clone(),
            cache: Arc::clone(&self.cache),
            contract_address: self.contract_address.clone(),
            allowed_origins: self.allowed_origins.clone(),
            abi_json: self.abi_json.clone(),
        }
    }
}
