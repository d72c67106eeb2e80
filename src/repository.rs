//! Repository Interface (C10, §6). Persistence is an external collaborator:
//! this crate defines the contract only, mirroring the async-trait seam
//! pattern used for C6/C8's model providers. No implementation ships here —
//! the embedding application supplies one (Postgres, DynamoDB, a test
//! double, whatever fits its deployment).

use async_trait::async_trait;

use crate::error::Result;
use crate::record::ExtractionRecord;

/// How a record arrived: a raw email, a parsed document, or the unified
/// record produced after C7 merges both (§6). Used only to label a save
/// call when a `Repository` implementer wants one storage path for all
/// three; the trait's own methods are the three named operations of §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Email,
    Document,
    Unified,
}

#[async_trait]
pub trait Repository: Send + Sync {
    /// Persists a record extracted from a raw email (§6
    /// `save_email_extraction`). Returns the repository-assigned identifier,
    /// which may differ from `record.id` if the store mints its own keys.
    async fn save_email_extraction(&self, record: &ExtractionRecord) -> Result<String>;

    /// Persists a record extracted from a parsed document (§6
    /// `save_document_extraction`).
    async fn save_document_extraction(&self, record: &ExtractionRecord) -> Result<String>;

    /// Persists the unified record produced after C7 merges the email and
    /// document extractions (§6 `save_unified_extraction`).
    async fn save_unified_extraction(&self, record: &ExtractionRecord) -> Result<String>;

    /// All records saved against a given `source_ref` (the inbound
    /// message/document identifier), most recent first.
    async fn find_by_source_ref(&self, source_ref: &str) -> Result<Vec<ExtractionRecord>>;

    /// Records containing a field extraction whose canonical value matches
    /// `identifier` exactly (e.g. a booking number or container number),
    /// across any `FieldKind` the repository chooses to index.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Vec<ExtractionRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{FieldKind, Method, Strategy};
    use crate::record::{FieldExtraction, FieldSlot, FieldValue, Metadata, RecordState};
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct InMemoryRepository {
        records: Mutex<Vec<(ExtractionSource, ExtractionRecord)>>,
    }

    impl InMemoryRepository {
        fn store(&self, source: ExtractionSource, record: &ExtractionRecord) -> Result<String> {
            let id = record.id.to_string();
            self.records.lock().unwrap().push((source, record.clone()));
            Ok(id)
        }
    }

    #[async_trait]
    impl Repository for InMemoryRepository {
        async fn save_email_extraction(&self, record: &ExtractionRecord) -> Result<String> {
            self.store(ExtractionSource::Email, record)
        }

        async fn save_document_extraction(&self, record: &ExtractionRecord) -> Result<String> {
            self.store(ExtractionSource::Document, record)
        }

        async fn save_unified_extraction(&self, record: &ExtractionRecord) -> Result<String> {
            self.store(ExtractionSource::Unified, record)
        }

        async fn find_by_source_ref(&self, source_ref: &str) -> Result<Vec<ExtractionRecord>> {
            Ok(self.records.lock().unwrap().iter().filter(|(_, r)| r.source_ref == source_ref).map(|(_, r)| r.clone()).collect())
        }

        async fn find_by_identifier(&self, identifier: &str) -> Result<Vec<ExtractionRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, r)| r.fields.values().any(|slot| matches_identifier(slot, identifier)))
                .map(|(_, r)| r.clone())
                .collect())
        }
    }

    fn matches_identifier(slot: &FieldSlot, identifier: &str) -> bool {
        match slot {
            FieldSlot::Single(f) => f.value.canonical_form() == identifier.to_ascii_uppercase(),
            FieldSlot::Multi(items) => items.iter().any(|f| f.value.canonical_form() == identifier.to_ascii_uppercase()),
        }
    }

    fn sample_record(source_ref: &str, booking: &str) -> ExtractionRecord {
        let mut fields = BTreeMap::new();
        fields.insert(
            FieldKind::BookingNumber,
            FieldSlot::Single(FieldExtraction {
                kind: FieldKind::BookingNumber,
                value: FieldValue::Text(booking.to_string()),
                raw_span: booking.to_string(),
                confidence: 90,
                method: Method::RegexSubject,
                pattern_id: None,
            }),
        );
        ExtractionRecord {
            id: Uuid::new_v4(),
            source_ref: source_ref.to_string(),
            sender_category: None,
            carrier: None,
            document_type: None,
            fields,
            parties: BTreeMap::new(),
            tables: BTreeMap::new(),
            metadata: Metadata {
                processing_time_ms: 0,
                regex_time_ms: 0,
                ai_time_ms: 0,
                regex_field_count: 1,
                ai_field_count: 0,
                schema_field_count: 0,
                total_field_count: 1,
                regex_confidence: 90,
                overall_confidence: 90,
                strategy: Strategy::RegexOnly,
                field_sources: BTreeMap::new(),
                party_sources: BTreeMap::new(),
                ai_called: false,
                ai_reason: None,
                catalog_version: 1,
                schema_set_version: 1,
            },
            judgement: None,
            state: RecordState::Created,
            corrected_from: None,
            corrections_applied: Vec::new(),
        }
    }

    #[tokio::test]
    async fn find_by_source_ref_returns_matching_records() {
        let repo = InMemoryRepository { records: Mutex::new(Vec::new()) };
        repo.save_email_extraction(&sample_record("msg-1", "BN1")).await.unwrap();
        repo.save_email_extraction(&sample_record("msg-2", "BN2")).await.unwrap();
        let found = repo.find_by_source_ref("msg-1").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source_ref, "msg-1");
    }

    #[tokio::test]
    async fn find_by_identifier_matches_canonical_form() {
        let repo = InMemoryRepository { records: Mutex::new(Vec::new()) };
        repo.save_unified_extraction(&sample_record("msg-1", "bn998877")).await.unwrap();
        let found = repo.find_by_identifier("BN998877").await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
