//! Background processing of accepted documents.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::error::{FinscanError, Result};
use crate::models::document::{DocumentKind, DocumentStatus, NormalizedDocument, PartyData};
use crate::models::field::OcrPayload;
use crate::models::record::{DocumentRecord, DocumentUpdate, LineFields, PartyQuery, PartyRecord};
use crate::normalize::{DocumentMapper, FieldParser};
use crate::ports::{
    DocumentRepository, ItemRepository, ObjectStore, OcrClient, OcrSource, PartyRepository,
};

use super::intake::FileIntake;
use super::view::{DocumentDetails, DocumentView, Submission};

/// Catalog description for line items the OCR left without one.
pub const UNSPECIFIED_ITEM: &str = "Unspecified item";

/// A submission that passed intake.
///
/// `run` is the detached background task. Dropping it leaves the task
/// running; awaiting it yields the terminal status.
#[derive(Debug)]
pub struct Accepted {
    pub submission: Submission,
    pub run: JoinHandle<DocumentStatus>,
}

impl Accepted {
    /// Wait for the background run and return its terminal status.
    pub async fn wait(self) -> Result<DocumentStatus> {
        Ok(self.run.await?)
    }
}

/// Pipeline for one document kind.
#[derive(Clone)]
pub struct ProcessingPipeline {
    kind: DocumentKind,
    mapper: DocumentMapper,
    intake: FileIntake,
    ocr: Arc<dyn OcrClient>,
    documents: Arc<dyn DocumentRepository>,
    customers: Arc<dyn PartyRepository>,
    vendors: Arc<dyn PartyRepository>,
    items: Arc<dyn ItemRepository>,
    span: Span,
}

/// Builder for ProcessingPipeline.
pub struct PipelineBuilder {
    kind: DocumentKind,
    parser: FieldParser,
    ocr: Option<Arc<dyn OcrClient>>,
    store: Option<Arc<dyn ObjectStore>>,
    documents: Option<Arc<dyn DocumentRepository>>,
    customers: Option<Arc<dyn PartyRepository>>,
    vendors: Option<Arc<dyn PartyRepository>>,
    items: Option<Arc<dyn ItemRepository>>,
    span: Span,
}

impl PipelineBuilder {
    /// Create a builder for one document kind.
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            parser: FieldParser::new(),
            ocr: None,
            store: None,
            documents: None,
            customers: None,
            vendors: None,
            items: None,
            span: Span::none(),
        }
    }

    /// Set the field parser used by the mapper.
    pub fn with_parser(mut self, parser: FieldParser) -> Self {
        self.parser = parser;
        self
    }

    /// Set the OCR client.
    pub fn with_ocr(mut self, ocr: Arc<dyn OcrClient>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// Set the object store for uploads and OCR results.
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the document repository.
    pub fn with_documents(mut self, documents: Arc<dyn DocumentRepository>) -> Self {
        self.documents = Some(documents);
        self
    }

    /// Set the customer repository.
    pub fn with_customers(mut self, customers: Arc<dyn PartyRepository>) -> Self {
        self.customers = Some(customers);
        self
    }

    /// Set the vendor repository.
    pub fn with_vendors(mut self, vendors: Arc<dyn PartyRepository>) -> Self {
        self.vendors = Some(vendors);
        self
    }

    /// Set the item repository.
    pub fn with_items(mut self, items: Arc<dyn ItemRepository>) -> Self {
        self.items = Some(items);
        self
    }

    /// Parent span for background runs.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Build the pipeline. Every collaborator is required.
    pub fn build(self) -> Result<ProcessingPipeline> {
        let kind = self.kind;
        let missing = |what: &str| FinscanError::Config(format!("{} pipeline has no {}", kind, what));

        Ok(ProcessingPipeline {
            kind,
            mapper: DocumentMapper::with_parser(kind, self.parser),
            intake: FileIntake::new(self.store.ok_or_else(|| missing("object store"))?),
            ocr: self.ocr.ok_or_else(|| missing("OCR client"))?,
            documents: self.documents.ok_or_else(|| missing("document repository"))?,
            customers: self.customers.ok_or_else(|| missing("customer repository"))?,
            vendors: self.vendors.ok_or_else(|| missing("vendor repository"))?,
            items: self.items.ok_or_else(|| missing("item repository"))?,
            span: self.span,
        })
    }
}

impl ProcessingPipeline {
    /// Create a new builder.
    pub fn builder(kind: DocumentKind) -> PipelineBuilder {
        PipelineBuilder::new(kind)
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Accept a file and start processing it in the background.
    ///
    /// Fails synchronously on invalid input or when the file cannot be
    /// stored; in that case no record exists.
    pub async fn submit(
        &self,
        file: Vec<u8>,
        partner_id: &str,
        original_filename: &str,
    ) -> Result<Accepted> {
        let record = self
            .intake
            .accept(
                self.documents.as_ref(),
                self.kind,
                &file,
                partner_id,
                original_filename,
            )
            .await?;

        info!(
            "Accepted {} {} from partner {}",
            self.kind, record.id, record.partner_id
        );

        let submission = Submission {
            id: record.id,
            status: record.status,
        };
        let span = info_span!(
            parent: &self.span,
            "process_document",
            id = %record.id,
            kind = %self.kind,
            partner_id = %record.partner_id,
        );
        let pipeline = self.clone();
        let run = tokio::spawn(async move { pipeline.run(record, file).await }.instrument(span));

        Ok(Accepted { submission, run })
    }

    /// Current status of a document.
    pub async fn get_status(&self, id: Uuid) -> Result<Submission> {
        let record = self.find(id).await?;
        Ok(Submission {
            id: record.id,
            status: record.status,
        })
    }

    /// Formatted view of a document.
    pub async fn get_by_id(&self, id: Uuid) -> Result<DocumentView> {
        let record = self.find(id).await?;

        match record.status {
            DocumentStatus::Processing => Ok(DocumentView::processing(&record)),
            DocumentStatus::Failed => Ok(DocumentView::failed(&record)),
            DocumentStatus::Analyzed => {
                let customer = match record.customer_id {
                    Some(party_id) => self.customers.find_by_id(party_id).await?,
                    None => None,
                };
                let vendor = match record.vendor_id {
                    Some(party_id) => self.vendors.find_by_id(party_id).await?,
                    None => None,
                };
                let lines = self.items.find_items_by_document_id(id, self.kind).await?;

                Ok(DocumentView::Ready(Box::new(DocumentDetails::new(
                    record, customer, vendor, lines,
                ))))
            }
        }
    }

    /// Delete a document record.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.find(id).await?;
        if !self.documents.delete(id).await? {
            return Err(self.not_found(id));
        }
        info!("Deleted {} {}", self.kind, id);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<DocumentRecord> {
        match self.documents.find_by_id(id).await? {
            Some(record) if record.kind == self.kind => Ok(record),
            _ => Err(self.not_found(id)),
        }
    }

    fn not_found(&self, id: Uuid) -> FinscanError {
        FinscanError::NotFound {
            kind: self.kind.as_str(),
            id: id.to_string(),
        }
    }

    /// Drive one document to a terminal status. Never returns an error.
    async fn run(self, record: DocumentRecord, file: Vec<u8>) -> DocumentStatus {
        let start = Instant::now();

        match self.process(&record, &file).await {
            Ok(()) => {
                info!(
                    "Analyzed {} {} in {}ms",
                    self.kind,
                    record.id,
                    start.elapsed().as_millis()
                );
                DocumentStatus::Analyzed
            }
            Err(e) => {
                self.fail(record.id, &e).await;
                DocumentStatus::Failed
            }
        }
    }

    async fn process(&self, record: &DocumentRecord, file: &[u8]) -> Result<()> {
        debug!("Sending {} to {}", record.id, self.ocr.provider_name());
        let raw = self.ocr.analyze(self.kind, OcrSource::Bytes(file)).await?;

        let result_url = self
            .intake
            .store()
            .put_json(&raw, &record.id.to_string())
            .await?;

        let payload = OcrPayload::from_value(raw)?;
        let document = self.mapper.map(&payload, &record.partner_id)?;

        for issue in document.validate() {
            warn!("{} {}: {}", self.kind, record.id, issue);
        }

        self.documents
            .update(
                record.id,
                DocumentUpdate {
                    result_url: Some(result_url),
                    header: Some(document.header.clone()),
                    totals: Some(document.totals.clone()),
                    ..Default::default()
                },
            )
            .await?;

        let customer = resolve_party(self.customers.as_ref(), &document.customer).await?;
        let vendor = resolve_party(self.vendors.as_ref(), &document.vendor).await?;
        if customer.is_some() || vendor.is_some() {
            self.documents
                .update(
                    record.id,
                    DocumentUpdate {
                        customer_id: customer.map(|party| party.id),
                        vendor_id: vendor.map(|party| party.id),
                        ..Default::default()
                    },
                )
                .await?;
        }

        self.store_lines(record.id, &document).await?;

        self.documents
            .update_status(record.id, DocumentStatus::Analyzed)
            .await?;
        Ok(())
    }

    async fn store_lines(&self, id: Uuid, document: &NormalizedDocument) -> Result<()> {
        for (index, line) in document.line_items.iter().enumerate() {
            let description = line
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or(UNSPECIFIED_ITEM);

            let item = self.items.find_or_create_item(description).await?;
            self.items
                .create_document_item(
                    self.kind,
                    id,
                    item.id,
                    index as u32 + 1,
                    LineFields::from(line),
                )
                .await?;
        }

        debug!("Stored {} line items for {}", document.line_items.len(), id);
        Ok(())
    }

    async fn fail(&self, id: Uuid, err: &FinscanError) {
        error!("Processing {} {} failed: {}", self.kind, id, err);

        let update = DocumentUpdate {
            error: Some(err.user_message()),
            ..Default::default()
        };
        if let Err(e) = self.documents.update(id, update).await {
            warn!("Could not record failure reason for {}: {}", id, e);
        }
        if let Err(e) = self
            .documents
            .update_status(id, DocumentStatus::Failed)
            .await
        {
            error!("Could not mark {} as failed: {}", id, e);
        }
    }
}

/// Find a party by its attributes or create it. Parties without a name are skipped.
async fn resolve_party(
    repository: &dyn PartyRepository,
    data: &PartyData,
) -> Result<Option<PartyRecord>> {
    let Some(query) = PartyQuery::from_data(data) else {
        return Ok(None);
    };

    if let Some(existing) = repository.find_by_attributes(&query).await? {
        debug!("Matched existing party {} ({})", existing.id, existing.slug);
        return Ok(Some(existing));
    }

    let created = repository.create(data.clone()).await?;
    debug!("Created party {} ({})", created.id, created.slug);
    Ok(Some(created))
}
