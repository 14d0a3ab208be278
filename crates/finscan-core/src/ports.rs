//! Interfaces of the external collaborators the pipeline depends on.
//!
//! Implementations live outside the core (databases, blob stores, the OCR
//! provider); [`crate::adapters`] ships in-memory and filesystem versions.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{OcrError, RepositoryError, StorageError};
use crate::models::document::{DocumentKind, DocumentStatus, PartyData};
use crate::models::record::{
    DocumentItemRecord, DocumentLine, DocumentRecord, DocumentUpdate, ItemRecord, LineFields,
    PartyQuery, PartyRecord,
};

/// What the OCR provider should read.
#[derive(Debug, Clone, Copy)]
pub enum OcrSource<'a> {
    /// Raw file bytes.
    Bytes(&'a [u8]),
    /// URL the provider can fetch.
    Url(&'a str),
}

/// External OCR service.
#[async_trait]
pub trait OcrClient: Send + Sync {
    /// Analyze a document and return the provider's raw result.
    async fn analyze(
        &self,
        kind: DocumentKind,
        source: OcrSource<'_>,
    ) -> Result<serde_json::Value, OcrError>;

    /// Provider name for diagnostics.
    fn provider_name(&self) -> &str;
}

/// External blob store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an uploaded file and return its URL.
    async fn put_file(&self, bytes: &[u8], filename: &str) -> Result<String, StorageError>;

    /// Store a JSON document and return its URL.
    async fn put_json(
        &self,
        value: &serde_json::Value,
        id_hint: &str,
    ) -> Result<String, StorageError>;
}

/// Document persistence, one instance per document kind.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create_initial(&self, record: DocumentRecord) -> Result<DocumentRecord, RepositoryError>;

    async fn update(&self, id: Uuid, update: DocumentUpdate) -> Result<(), RepositoryError>;

    async fn update_status(&self, id: Uuid, status: DocumentStatus) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DocumentRecord>, RepositoryError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Customer or vendor persistence.
#[async_trait]
pub trait PartyRepository: Send + Sync {
    async fn find_by_attributes(
        &self,
        query: &PartyQuery,
    ) -> Result<Option<PartyRecord>, RepositoryError>;

    async fn create(&self, data: PartyData) -> Result<PartyRecord, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PartyRecord>, RepositoryError>;
}

/// Shared item catalog and document line associations.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn find_or_create_item(&self, description: &str) -> Result<ItemRecord, RepositoryError>;

    async fn create_document_item(
        &self,
        kind: DocumentKind,
        document_id: Uuid,
        item_id: Uuid,
        position: u32,
        line: LineFields,
    ) -> Result<DocumentItemRecord, RepositoryError>;

    async fn find_items_by_document_id(
        &self,
        document_id: Uuid,
        kind: DocumentKind,
    ) -> Result<Vec<DocumentLine>, RepositoryError>;
}
