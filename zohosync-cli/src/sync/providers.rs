//! Collaborator contracts consumed by the sync engine
//!
//! The engine only ever talks to these traits. The production
//! implementations are the Zoho and Airtable API clients; tests drive
//! the engine with in-memory fakes. Token handling, pagination
//! mechanics, rate limiting, and retry policy all live behind these
//! seams, not in the engine.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::api::zoho::models::{ZohoField, ZohoModule};

/// One page of raw source records
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    pub records: Vec<Value>,
    /// Opaque token for the next page; `None` when exhausted
    pub next_page: Option<String>,
}

/// Source-side schema access
#[async_trait]
pub trait SourceSchemaProvider {
    async fn list_modules(&self) -> Result<Vec<ZohoModule>>;

    /// Field definitions in declaration order
    async fn module_fields(&self, module: &str) -> Result<Vec<ZohoField>>;
}

/// Source-side record access, paginated
#[async_trait]
pub trait SourceRecordProvider {
    async fn fetch_page(&self, module: &str, page_token: Option<&str>) -> Result<RecordPage>;
}

/// An existing field in a target table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetField {
    pub name: String,
    pub field_type: String,
}

/// Target-side schema access
#[async_trait]
pub trait TargetSchemaProvider {
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// Create a table with the target's default primary field
    async fn create_table(&self, table: &str) -> Result<()>;

    async fn list_fields(&self, table: &str) -> Result<Vec<TargetField>>;

    /// Create one field per the spec; linked-record specs carry the
    /// referenced table by name for the implementation to resolve
    async fn create_field(&self, table: &str, spec: &super::schema::FieldSpec) -> Result<()>;
}

/// Target-side record access
#[async_trait]
pub trait TargetRecordProvider {
    /// Find a record whose `key_field` equals `value`, if any
    async fn find_by_key(&self, table: &str, key_field: &str, value: &str)
    -> Result<Option<String>>;

    /// Create records, returning target ids in input order
    async fn create_records(
        &self,
        table: &str,
        records: &[Map<String, Value>],
    ) -> Result<Vec<String>>;

    async fn update_record(
        &self,
        table: &str,
        record_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<()>;

    /// Delete every record in the table
    async fn clear_table(&self, table: &str) -> Result<()>;
}
