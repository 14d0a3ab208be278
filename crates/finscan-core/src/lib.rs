//! Core library for financial document OCR normalization.
//!
//! This crate provides:
//! - Field parsing (dates, monetary amounts, Rupiah formats, payment terms)
//! - Customer, vendor and line item extraction from OCR field maps
//! - Mapping of invoice and purchase order payloads into normalized documents
//! - An asynchronous processing pipeline with pluggable OCR, storage and repositories

pub mod adapters;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod ports;

pub use error::{FinscanError, OcrError, RepositoryError, Result, StorageError, ValidationError};
pub use models::config::FinscanConfig;
pub use models::document::{
    DocumentHeader, DocumentKind, DocumentStatus, DocumentTotals, LineItem, NormalizedDocument,
    PartyData,
};
pub use models::field::{FieldMap, FieldValue, OcrField, OcrPayload};
pub use models::money::{Currency, Money};
pub use normalize::{partner_slug, DocumentMapper, EntityExtractor, FieldParser};
pub use pipeline::{Accepted, DocumentView, FileIntake, ProcessingPipeline, Submission};
pub use ports::{DocumentRepository, ItemRepository, ObjectStore, OcrClient, OcrSource, PartyRepository};
