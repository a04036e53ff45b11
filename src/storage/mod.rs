// src/storage/mod.rs
//! Content-addressed document storage layer.

pub mod ipfs_client;
