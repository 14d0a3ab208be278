//! End-to-end pipeline tests with in-memory collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use finscan_core::adapters::{
    MemoryDocumentRepository, MemoryItemRepository, MemoryObjectStore, MemoryPartyRepository,
};
use finscan_core::error::{RepositoryError, StorageError};
use finscan_core::models::record::{
    DocumentItemRecord, DocumentLine, ItemRecord, LineFields, PartyQuery, PartyRecord,
};
use finscan_core::pipeline::UNSPECIFIED_ITEM;
use finscan_core::{
    DocumentKind, DocumentRepository, DocumentStatus, DocumentView, FinscanError, ItemRepository,
    ObjectStore, OcrClient, OcrError, OcrSource, PartyData, PartyRepository, ProcessingPipeline,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

struct StaticOcr(Value);

#[async_trait]
impl OcrClient for StaticOcr {
    async fn analyze(&self, _kind: DocumentKind, _source: OcrSource<'_>) -> Result<Value, OcrError> {
        Ok(self.0.clone())
    }

    fn provider_name(&self) -> &str {
        "static"
    }
}

struct FailingOcr(u16);

#[async_trait]
impl OcrClient for FailingOcr {
    async fn analyze(&self, _kind: DocumentKind, _source: OcrSource<'_>) -> Result<Value, OcrError> {
        Err(OcrError::new(Some(self.0), "upstream said no"))
    }

    fn provider_name(&self) -> &str {
        "failing"
    }
}

struct BrokenStore;

#[async_trait]
impl ObjectStore for BrokenStore {
    async fn put_file(&self, _bytes: &[u8], filename: &str) -> Result<String, StorageError> {
        Err(StorageError::Write {
            key: filename.to_string(),
            reason: "disk full".to_string(),
        })
    }

    async fn put_json(&self, _value: &Value, id_hint: &str) -> Result<String, StorageError> {
        Err(StorageError::Write {
            key: id_hint.to_string(),
            reason: "disk full".to_string(),
        })
    }
}

/// Keeps uploads but refuses to store OCR results.
struct ResultlessStore(Arc<MemoryObjectStore>);

#[async_trait]
impl ObjectStore for ResultlessStore {
    async fn put_file(&self, bytes: &[u8], filename: &str) -> Result<String, StorageError> {
        self.0.put_file(bytes, filename).await
    }

    async fn put_json(&self, _value: &Value, id_hint: &str) -> Result<String, StorageError> {
        Err(StorageError::Write {
            key: id_hint.to_string(),
            reason: "bucket is read-only".to_string(),
        })
    }
}

struct FailingParties;

#[async_trait]
impl PartyRepository for FailingParties {
    async fn find_by_attributes(
        &self,
        _query: &PartyQuery,
    ) -> Result<Option<PartyRecord>, RepositoryError> {
        Err(RepositoryError::Backend("connection reset".to_string()))
    }

    async fn create(&self, _data: PartyData) -> Result<PartyRecord, RepositoryError> {
        Err(RepositoryError::Backend("connection reset".to_string()))
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<PartyRecord>, RepositoryError> {
        Err(RepositoryError::Backend("connection reset".to_string()))
    }
}

struct FailingItems;

#[async_trait]
impl ItemRepository for FailingItems {
    async fn find_or_create_item(&self, _description: &str) -> Result<ItemRecord, RepositoryError> {
        Err(RepositoryError::Backend("deadlock detected".to_string()))
    }

    async fn create_document_item(
        &self,
        _kind: DocumentKind,
        _document_id: Uuid,
        _item_id: Uuid,
        _position: u32,
        _line: LineFields,
    ) -> Result<DocumentItemRecord, RepositoryError> {
        Err(RepositoryError::Backend("deadlock detected".to_string()))
    }

    async fn find_items_by_document_id(
        &self,
        _document_id: Uuid,
        _kind: DocumentKind,
    ) -> Result<Vec<DocumentLine>, RepositoryError> {
        Ok(Vec::new())
    }
}

struct Harness {
    pipeline: ProcessingPipeline,
    documents: Arc<MemoryDocumentRepository>,
    customers: Arc<MemoryPartyRepository>,
    vendors: Arc<MemoryPartyRepository>,
    items: Arc<MemoryItemRepository>,
    store: Arc<MemoryObjectStore>,
}

impl Harness {
    fn new(kind: DocumentKind, ocr: Arc<dyn OcrClient>) -> Self {
        let documents = Arc::new(MemoryDocumentRepository::new());
        let customers = Arc::new(MemoryPartyRepository::customers());
        let vendors = Arc::new(MemoryPartyRepository::vendors());
        let items = Arc::new(MemoryItemRepository::new());
        let store = Arc::new(MemoryObjectStore::new());

        let pipeline = ProcessingPipeline::builder(kind)
            .with_ocr(ocr)
            .with_store(store.clone())
            .with_documents(documents.clone())
            .with_customers(customers.clone())
            .with_vendors(vendors.clone())
            .with_items(items.clone())
            .build()
            .unwrap();

        Self {
            pipeline,
            documents,
            customers,
            vendors,
            items,
            store,
        }
    }

    fn with_payload(kind: DocumentKind, payload: Value) -> Self {
        Self::new(kind, Arc::new(StaticOcr(payload)))
    }
}

fn invoice_payload() -> Value {
    json!({
        "status": "succeeded",
        "analyzeResult": {
            "documents": [{
                "docType": "invoice",
                "fields": {
                    "InvoiceId": { "content": "INV-2024-001" },
                    "InvoiceDate": { "content": "15/03/2024" },
                    "PaymentTerm": { "content": "Net 45" },
                    "InvoiceTotal": { "content": "$1,100.00" },
                    "SubTotal": { "content": "$1,000.00" },
                    "TotalTax": { "content": "$100.00" },
                    "CustomerName": { "content": "Globex Inc" },
                    "CustomerAddress": { "content": "1 Main St" },
                    "VendorName": { "content": "Acme Corp Ltd." },
                    "VendorTaxId": { "content": "01.234.567.8-901.000" },
                    "Items": {
                        "valueArray": [
                            { "valueObject": {
                                "Description": { "content": "Steel bolts" },
                                "Quantity": { "content": "10" },
                                "Amount": { "content": "$600.00" }
                            } },
                            { "valueObject": {
                                "Description": { "content": "Nuts" },
                                "Quantity": { "content": "20" },
                                "Amount": { "content": "$400.00" }
                            } },
                            { "valueObject": {
                                "Quantity": { "content": "1" }
                            } }
                        ]
                    }
                }
            }]
        }
    })
}

#[tokio::test]
async fn test_invoice_is_analyzed() {
    let h = Harness::with_payload(DocumentKind::Invoice, invoice_payload());

    let accepted = h
        .pipeline
        .submit(b"%PDF-1.7".to_vec(), "partner-1", "scan.pdf")
        .await
        .unwrap();
    assert_eq!(accepted.submission.status, DocumentStatus::Processing);

    let id = accepted.submission.id;
    assert_eq!(accepted.wait().await.unwrap(), DocumentStatus::Analyzed);
    assert_eq!(
        h.pipeline.get_status(id).await.unwrap().status,
        DocumentStatus::Analyzed
    );

    let DocumentView::Ready(details) = h.pipeline.get_by_id(id).await.unwrap() else {
        panic!("expected an analyzed document");
    };

    let header = details.header.as_ref().unwrap();
    assert_eq!(header.document_number.as_deref(), Some("INV-2024-001"));
    assert_eq!(header.document_date.to_string(), "2024-03-15");
    assert_eq!(header.due_date.to_string(), "2024-04-29");

    let totals = details.totals.as_ref().unwrap();
    assert_eq!(totals.total_amount, Some(Decimal::from(1100)));
    assert_eq!(totals.tax_amount, Some(Decimal::from(100)));
    assert_eq!(totals.currency.symbol.as_deref(), Some("$"));

    let customer = details.customer.as_ref().unwrap();
    assert_eq!(customer.data.name.as_deref(), Some("Globex Inc"));
    let vendor = details.vendor.as_ref().unwrap();
    assert_eq!(vendor.slug, "acme-corp-ltd");

    let lines: Vec<(u32, &str)> = details
        .items
        .iter()
        .map(|l| (l.position, l.description.as_str()))
        .collect();
    assert_eq!(
        lines,
        vec![(1, "Steel bolts"), (2, "Nuts"), (3, UNSPECIFIED_ITEM)]
    );
    assert_eq!(details.items[0].line.quantity, Some(Decimal::from(10)));

    // Uploaded file and raw OCR result are both stored.
    assert_eq!(h.store.len().await, 2);
    let result_url = details.result_url.as_deref().unwrap();
    assert!(h.store.get(result_url).await.is_some());
}

#[tokio::test]
async fn test_parties_and_items_are_reused() {
    let h = Harness::with_payload(DocumentKind::Invoice, invoice_payload());

    for name in ["a.pdf", "b.pdf"] {
        let accepted = h
            .pipeline
            .submit(b"%PDF".to_vec(), "partner-1", name)
            .await
            .unwrap();
        assert_eq!(accepted.wait().await.unwrap(), DocumentStatus::Analyzed);
    }

    assert_eq!(h.documents.len().await, 2);
    assert_eq!(h.customers.len().await, 1);
    assert_eq!(h.vendors.len().await, 1);
    assert_eq!(h.items.catalog_len().await, 3);
}

#[tokio::test]
async fn test_ocr_failure_marks_document_failed() {
    let h = Harness::new(DocumentKind::Invoice, Arc::new(FailingOcr(401)));

    let accepted = h
        .pipeline
        .submit(b"%PDF".to_vec(), "partner-1", "scan.pdf")
        .await
        .unwrap();
    let id = accepted.submission.id;
    assert_eq!(accepted.wait().await.unwrap(), DocumentStatus::Failed);

    let record = h.documents.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(record.status, DocumentStatus::Failed);
    assert!(record.file_url.starts_with("memory://files/"));
    assert!(h.store.get(&record.file_url).await.is_some());
    assert_eq!(record.result_url, None);

    match h.pipeline.get_by_id(id).await.unwrap() {
        DocumentView::Failed { message, .. } => {
            assert_eq!(message, "The OCR service rejected the configured credentials");
            assert!(!message.contains("upstream said no"));
        }
        other => panic!("expected a failed view, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_payload_fails_after_storing_result() {
    let h = Harness::with_payload(DocumentKind::Invoice, json!({ "documents": [] }));

    let accepted = h
        .pipeline
        .submit(b"%PDF".to_vec(), "partner-1", "scan.pdf")
        .await
        .unwrap();
    let id = accepted.submission.id;
    assert_eq!(accepted.wait().await.unwrap(), DocumentStatus::Failed);

    let record = h.documents.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(
        record.error.as_deref(),
        Some("validation error: OCR payload contains no documents")
    );
    assert_eq!(h.store.len().await, 2);
}

#[tokio::test]
async fn test_invalid_submission_creates_no_record() {
    let h = Harness::with_payload(DocumentKind::Invoice, invoice_payload());

    let err = h
        .pipeline
        .submit(Vec::new(), "partner-1", "scan.pdf")
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = h
        .pipeline
        .submit(b"%PDF".to_vec(), "   ", "scan.pdf")
        .await
        .unwrap_err();
    assert!(err.is_validation());

    assert!(h.documents.is_empty().await);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_storage_failure_at_intake() {
    let documents = Arc::new(MemoryDocumentRepository::new());
    let pipeline = ProcessingPipeline::builder(DocumentKind::Invoice)
        .with_ocr(Arc::new(StaticOcr(invoice_payload())))
        .with_store(Arc::new(BrokenStore))
        .with_documents(documents.clone())
        .with_customers(Arc::new(MemoryPartyRepository::customers()))
        .with_vendors(Arc::new(MemoryPartyRepository::vendors()))
        .with_items(Arc::new(MemoryItemRepository::new()))
        .build()
        .unwrap();

    let err = pipeline
        .submit(b"%PDF".to_vec(), "partner-1", "scan.pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, FinscanError::Storage(_)));
    assert_eq!(err.user_message(), "The file storage service is unavailable");
    assert!(documents.is_empty().await);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let h = Harness::with_payload(DocumentKind::Invoice, invoice_payload());
    let id = Uuid::new_v4();

    assert!(h.pipeline.get_status(id).await.unwrap_err().is_not_found());
    assert!(h.pipeline.get_by_id(id).await.unwrap_err().is_not_found());
    assert!(h.pipeline.delete(id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_removes_document() {
    let h = Harness::with_payload(DocumentKind::Invoice, invoice_payload());
    let accepted = h
        .pipeline
        .submit(b"%PDF".to_vec(), "partner-1", "scan.pdf")
        .await
        .unwrap();
    let id = accepted.submission.id;
    accepted.wait().await.unwrap();

    h.pipeline.delete(id).await.unwrap();
    assert!(h.pipeline.get_status(id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_purchase_order_pipeline() {
    let payload = json!({
        "documents": [{
            "fields": {
                "PurchaseOrderNumber": { "content": "PO-88" },
                "PurchaseOrderDate": { "content": "2024-02-01" },
                "Total": { "content": "Rp 1.500.000,00" },
                "VendorName": { "content": "PT Sumber Makmur" }
            }
        }]
    });
    let h = Harness::with_payload(DocumentKind::PurchaseOrder, payload);

    let accepted = h
        .pipeline
        .submit(b"%PDF".to_vec(), "partner-9", "po.pdf")
        .await
        .unwrap();
    let id = accepted.submission.id;
    assert_eq!(accepted.wait().await.unwrap(), DocumentStatus::Analyzed);

    let DocumentView::Ready(details) = h.pipeline.get_by_id(id).await.unwrap() else {
        panic!("expected an analyzed purchase order");
    };
    assert_eq!(details.kind, DocumentKind::PurchaseOrder);
    let totals = details.totals.as_ref().unwrap();
    assert_eq!(totals.total_amount, Some(Decimal::from(1_500_000)));
    assert_eq!(totals.currency.code.as_deref(), Some("IDR"));
    assert!(details.customer.is_none());
    assert!(details.items.is_empty());
    assert_eq!(h.customers.len().await, 0);
}

#[tokio::test]
async fn test_builder_requires_collaborators() {
    let err = ProcessingPipeline::builder(DocumentKind::Invoice)
        .with_ocr(Arc::new(FailingOcr(500)))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, FinscanError::Config(_)));
}

/// Submit the sample invoice and check the run ends failed with `message`,
/// keeping the uploaded file reference.
async fn assert_background_failure(
    pipeline: ProcessingPipeline,
    documents: &MemoryDocumentRepository,
    message: &str,
) -> String {
    let accepted = pipeline
        .submit(b"%PDF".to_vec(), "partner-1", "scan.pdf")
        .await
        .unwrap();
    let id = accepted.submission.id;
    assert_eq!(accepted.wait().await.unwrap(), DocumentStatus::Failed);

    let record = documents.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(record.status, DocumentStatus::Failed);
    assert_eq!(record.error.as_deref(), Some(message));
    assert!(record.file_url.starts_with("memory://files/"));

    match pipeline.get_by_id(id).await.unwrap() {
        DocumentView::Failed { message: shown, .. } => assert_eq!(shown, message),
        other => panic!("expected a failed view, got {:?}", other),
    }
    record.file_url
}

#[tokio::test]
async fn test_result_storage_failure_marks_document_failed() {
    let documents = Arc::new(MemoryDocumentRepository::new());
    let files = Arc::new(MemoryObjectStore::new());
    let pipeline = ProcessingPipeline::builder(DocumentKind::Invoice)
        .with_ocr(Arc::new(StaticOcr(invoice_payload())))
        .with_store(Arc::new(ResultlessStore(files.clone())))
        .with_documents(documents.clone())
        .with_customers(Arc::new(MemoryPartyRepository::customers()))
        .with_vendors(Arc::new(MemoryPartyRepository::vendors()))
        .with_items(Arc::new(MemoryItemRepository::new()))
        .build()
        .unwrap();

    let file_url = assert_background_failure(
        pipeline,
        &documents,
        "The file storage service is unavailable",
    )
    .await;
    assert!(files.get(&file_url).await.is_some());
    assert_eq!(files.len().await, 1);
}

#[tokio::test]
async fn test_party_repository_failure_marks_document_failed() {
    let documents = Arc::new(MemoryDocumentRepository::new());
    let items = Arc::new(MemoryItemRepository::new());
    let pipeline = ProcessingPipeline::builder(DocumentKind::Invoice)
        .with_ocr(Arc::new(StaticOcr(invoice_payload())))
        .with_store(Arc::new(MemoryObjectStore::new()))
        .with_documents(documents.clone())
        .with_customers(Arc::new(FailingParties))
        .with_vendors(Arc::new(FailingParties))
        .with_items(items.clone())
        .build()
        .unwrap();

    assert_background_failure(pipeline, &documents, "Could not save the document data").await;
    assert_eq!(items.catalog_len().await, 0);
}

#[tokio::test]
async fn test_item_repository_failure_marks_document_failed() {
    let documents = Arc::new(MemoryDocumentRepository::new());
    let vendors = Arc::new(MemoryPartyRepository::vendors());
    let pipeline = ProcessingPipeline::builder(DocumentKind::Invoice)
        .with_ocr(Arc::new(StaticOcr(invoice_payload())))
        .with_store(Arc::new(MemoryObjectStore::new()))
        .with_documents(documents.clone())
        .with_customers(Arc::new(MemoryPartyRepository::customers()))
        .with_vendors(vendors.clone())
        .with_items(Arc::new(FailingItems))
        .build()
        .unwrap();

    assert_background_failure(pipeline, &documents, "Could not save the document data").await;
    // Parties resolved before the line items are kept.
    assert_eq!(vendors.len().await, 1);
}
