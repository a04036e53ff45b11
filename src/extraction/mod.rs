// src/extraction/mod.rs
//! Document text acquisition and structured field extraction.

pub mod field_extractor;
pub mod ocr_client;
