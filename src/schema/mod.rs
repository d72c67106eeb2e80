//! Document Schema Engine (C5, §3, §4.5): data shapes, concrete schemas, and
//! the region/label/party/table extraction logic.

pub mod engine;
pub mod schema;
pub mod schemas_data;

pub use engine::{extract, SchemaExtraction};
pub use schema::CompiledDocumentSchema;
pub use schemas_data::schema_for_document_type;
