//! Airtable API payload models

use serde::Deserialize;
use serde_json::{Map, Value};

/// A table as reported by the base metadata endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct AirtableTable {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<AirtableField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirtableField {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
}

#[derive(Debug, Deserialize)]
pub struct TableList {
    #[serde(default)]
    pub tables: Vec<AirtableTable>,
}

/// A stored record on the data endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct AirtableRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct RecordList {
    #[serde(default)]
    pub records: Vec<AirtableRecord>,
    /// Continuation token for record listing
    #[serde(default)]
    pub offset: Option<String>,
}
