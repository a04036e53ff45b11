// src/storage/ipfs_client.rs
//! IPFS content store client.
//!
//! Immutable copies of submitted certificates live in IPFS; the ledger
//! anchors only the content identifier. The CID returned here is opaque to
//! the rest of the system beyond its minimum-length contract.
//!
//! All stored data is public by default; anything sensitive must be
//! encrypted before it reaches this layer.

use crate::error::ServiceError;
use bytes::BytesMut;
use futures::TryStreamExt;
use ipfs_api_backend_hyper::{IpfsApi, IpfsClient, TryFromUri};
use std::io::Cursor;
use std::sync::Arc;

/// Thread-safe IPFS client wrapper.
#[derive(Clone)]
pub struct IpfsStorage {
    /// Shared IPFS API client
    client: Arc<IpfsClient>,
}

impl IpfsStorage {
    /// Creates a client against the given IPFS API endpoint.
    ///
    /// # Arguments
    /// * `api_url` - IPFS node API URL, e.g. `http://localhost:5001`
    ///
    /// # Errors
    /// Returns `Storage` if the URL does not parse.
    pub fn new(api_url: &str) -> Result<Self, ServiceError> {
        let client = IpfsClient::from_str(api_url)
            .map_err(|e| ServiceError::Storage(format!("invalid ipfs url: {}", e)))?;
        Ok(IpfsStorage {
            client: Arc::new(client),
        })
    }

    /// Stores raw bytes and returns their content identifier.
    ///
    /// # Errors
    /// Returns `Storage` when the node rejects the add or is unreachable;
    /// failures here are opaque upstream errors.
    pub async fn store_data(&self, data: Vec<u8>) -> Result<String, ServiceError> {
        let reader = Cursor::new(data);
        let res = self
            .client
            .add(reader)
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(res.hash)
    }

    /// Retrieves stored bytes by CID, accumulating the streamed chunks.
    ///
    /// # Errors
    /// Returns `Storage` when the node cannot serve the content.
    #[allow(dead_code)]
    pub async fn retrieve_data(&self, cid: &str) -> Result<Vec<u8>, ServiceError> {
        let data = self
            .client
            .cat(cid)
            .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(data.to_vec())
    }
}
