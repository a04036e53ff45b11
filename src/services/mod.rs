// src/services/mod.rs
//! Business logic and the HTTP API surface.

pub mod api_server;
pub mod session_cache;
pub mod verification;
