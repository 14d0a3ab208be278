//! In-memory collaborators for tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{RepositoryError, StorageError};
use crate::models::document::{DocumentKind, DocumentStatus, PartyData};
use crate::models::record::{
    DocumentItemRecord, DocumentLine, DocumentRecord, DocumentUpdate, ItemRecord, LineFields,
    PartyQuery, PartyRecord, PartyRole,
};
use crate::normalize::partner_slug;
use crate::ports::{DocumentRepository, ItemRepository, ObjectStore, PartyRepository};

/// Document records keyed by id.
#[derive(Debug, Default)]
pub struct MemoryDocumentRepository {
    rows: RwLock<HashMap<Uuid, DocumentRecord>>,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// All records, oldest first.
    pub async fn all(&self) -> Vec<DocumentRecord> {
        let mut rows: Vec<DocumentRecord> = self.rows.read().await.values().cloned().collect();
        rows.sort_by_key(|r| r.created_at);
        rows
    }

    fn missing(id: Uuid) -> RepositoryError {
        RepositoryError::MissingRow {
            table: "documents",
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn create_initial(&self, record: DocumentRecord) -> Result<DocumentRecord, RepositoryError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&record.id) {
            return Err(RepositoryError::Backend(format!(
                "duplicate document id {}",
                record.id
            )));
        }
        rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, update: DocumentUpdate) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        let record = rows.get_mut(&id).ok_or_else(|| Self::missing(id))?;
        update.apply(record);
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: DocumentStatus) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        let record = rows.get_mut(&id).ok_or_else(|| Self::missing(id))?;
        record.status = status;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DocumentRecord>, RepositoryError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

/// Customers or vendors, depending on the role.
#[derive(Debug)]
pub struct MemoryPartyRepository {
    role: PartyRole,
    rows: RwLock<Vec<PartyRecord>>,
}

impl MemoryPartyRepository {
    pub fn new(role: PartyRole) -> Self {
        Self {
            role,
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn customers() -> Self {
        Self::new(PartyRole::Customer)
    }

    pub fn vendors() -> Self {
        Self::new(PartyRole::Vendor)
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl PartyRepository for MemoryPartyRepository {
    async fn find_by_attributes(
        &self,
        query: &PartyQuery,
    ) -> Result<Option<PartyRecord>, RepositoryError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|p| query.matches(&p.data)).cloned())
    }

    async fn create(&self, data: PartyData) -> Result<PartyRecord, RepositoryError> {
        let record = PartyRecord {
            id: Uuid::new_v4(),
            role: self.role,
            slug: partner_slug(data.name.as_deref()),
            data,
            created_at: Utc::now(),
        };
        self.rows.write().await.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PartyRecord>, RepositoryError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|p| p.id == id).cloned())
    }
}

/// Item catalog plus document line associations.
#[derive(Debug, Default)]
pub struct MemoryItemRepository {
    items: RwLock<Vec<ItemRecord>>,
    lines: RwLock<Vec<DocumentItemRecord>>,
}

impl MemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of catalog entries.
    pub async fn catalog_len(&self) -> usize {
        self.items.read().await.len()
    }
}

#[async_trait]
impl ItemRepository for MemoryItemRepository {
    async fn find_or_create_item(&self, description: &str) -> Result<ItemRecord, RepositoryError> {
        let description = description.trim();
        let mut items = self.items.write().await;

        if let Some(existing) = items
            .iter()
            .find(|i| i.description.eq_ignore_ascii_case(description))
        {
            return Ok(existing.clone());
        }

        let item = ItemRecord {
            id: Uuid::new_v4(),
            description: description.to_string(),
        };
        items.push(item.clone());
        Ok(item)
    }

    async fn create_document_item(
        &self,
        kind: DocumentKind,
        document_id: Uuid,
        item_id: Uuid,
        position: u32,
        line: LineFields,
    ) -> Result<DocumentItemRecord, RepositoryError> {
        if !self.items.read().await.iter().any(|i| i.id == item_id) {
            return Err(RepositoryError::MissingRow {
                table: "items",
                id: item_id.to_string(),
            });
        }

        let record = DocumentItemRecord {
            id: Uuid::new_v4(),
            document_kind: kind,
            document_id,
            item_id,
            position,
            line,
        };
        self.lines.write().await.push(record.clone());
        Ok(record)
    }

    async fn find_items_by_document_id(
        &self,
        document_id: Uuid,
        kind: DocumentKind,
    ) -> Result<Vec<DocumentLine>, RepositoryError> {
        let items = self.items.read().await;
        let lines = self.lines.read().await;

        let mut found: Vec<DocumentLine> = lines
            .iter()
            .filter(|l| l.document_id == document_id && l.document_kind == kind)
            .filter_map(|l| {
                items
                    .iter()
                    .find(|i| i.id == l.item_id)
                    .map(|item| DocumentLine {
                        item: item.clone(),
                        line: l.clone(),
                    })
            })
            .collect();
        found.sort_by_key(|l| l.line.position);
        Ok(found)
    }
}

/// Object store holding bytes in memory under `memory://` URLs.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored under a URL.
    pub async fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(url).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_file(&self, bytes: &[u8], filename: &str) -> Result<String, StorageError> {
        let url = format!("memory://files/{}-{}", Uuid::new_v4(), filename);
        self.objects.write().await.insert(url.clone(), bytes.to_vec());
        Ok(url)
    }

    async fn put_json(
        &self,
        value: &serde_json::Value,
        id_hint: &str,
    ) -> Result<String, StorageError> {
        let url = format!("memory://results/{}.json", id_hint);
        let bytes = serde_json::to_vec(value)?;
        self.objects.write().await.insert(url.clone(), bytes);
        Ok(url)
    }
}
