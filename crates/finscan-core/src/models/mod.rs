//! Data models for OCR payloads, normalized documents and persisted records.

pub mod config;
pub mod document;
pub mod field;
pub mod money;
pub mod record;
