// src/contracts/mod.rs
//! Typed interfaces to deployed smart contracts.

pub mod certificate_registry;
