//! Synchronous acceptance of an uploaded file.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, ValidationError};
use crate::models::document::DocumentKind;
use crate::models::record::DocumentRecord;
use crate::ports::{DocumentRepository, ObjectStore};

/// Filename used when the caller supplies none.
const DEFAULT_FILENAME: &str = "document";

/// Upload step shared by the invoice and purchase-order pipelines.
///
/// Validates the submission, stores the file and persists the initial
/// `Processing` record. Any failure here aborts the submission and no
/// record is created.
#[derive(Clone)]
pub struct FileIntake {
    store: Arc<dyn ObjectStore>,
}

impl FileIntake {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Object store used for files and OCR results.
    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub async fn accept(
        &self,
        documents: &dyn DocumentRepository,
        kind: DocumentKind,
        file: &[u8],
        partner_id: &str,
        original_filename: &str,
    ) -> Result<DocumentRecord> {
        if file.is_empty() {
            return Err(ValidationError::MissingFile.into());
        }

        let partner_id = partner_id.trim();
        if partner_id.is_empty() {
            return Err(ValidationError::MissingPartnerId.into());
        }

        let filename = match original_filename.trim() {
            "" => DEFAULT_FILENAME,
            name => name,
        };

        let file_url = self.store.put_file(file, filename).await?;
        debug!("Stored {} ({} bytes) at {}", filename, file.len(), file_url);

        let record = DocumentRecord::processing(kind, partner_id, filename, file_url);
        Ok(documents.create_initial(record).await?)
    }
}
