// src/blockchain/mod.rs
//! Ledger (Ethereum-compatible) interaction layer.

pub mod ledger_client;
