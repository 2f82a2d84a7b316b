//! In-memory fake providers for engine tests

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::api::zoho::models::{ZohoField, ZohoFieldType, ZohoModule};

use super::providers::{
    RecordPage, SourceRecordProvider, SourceSchemaProvider, TargetField, TargetRecordProvider,
    TargetSchemaProvider,
};
use super::schema::{FieldSpec, TargetFieldKind};

/// Shorthand for building a Zoho field definition
pub fn field(name: &str, data_type: &str) -> ZohoField {
    ZohoField {
        api_name: name.to_string(),
        data_type: ZohoFieldType::from(data_type.to_string()),
        field_label: None,
    }
}

#[derive(Debug, Clone, Default)]
struct FakeModule {
    fields: Vec<ZohoField>,
    records: Vec<Value>,
}

/// Source provider backed by literal module definitions
#[derive(Debug)]
pub struct FakeSource {
    modules: BTreeMap<String, FakeModule>,
    page_size: usize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            modules: BTreeMap::new(),
            page_size: usize::MAX,
        }
    }

    pub fn with_module(mut self, name: &str, fields: Vec<ZohoField>, records: Vec<Value>) -> Self {
        self.modules
            .insert(name.to_string(), FakeModule { fields, records });
        self
    }

    /// Serve records in pages of `size` to exercise pagination
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }
}

#[async_trait]
impl SourceSchemaProvider for FakeSource {
    async fn list_modules(&self) -> Result<Vec<ZohoModule>> {
        Ok(self
            .modules
            .keys()
            .map(|name| ZohoModule {
                api_name: name.clone(),
                plural_label: None,
                api_supported: true,
            })
            .collect())
    }

    async fn module_fields(&self, module: &str) -> Result<Vec<ZohoField>> {
        match self.modules.get(module) {
            Some(m) => Ok(m.fields.clone()),
            None => bail!("unknown module '{}'", module),
        }
    }
}

#[async_trait]
impl SourceRecordProvider for FakeSource {
    async fn fetch_page(&self, module: &str, page_token: Option<&str>) -> Result<RecordPage> {
        let records = self
            .modules
            .get(module)
            .map(|m| m.records.as_slice())
            .unwrap_or_default();

        let start: usize = page_token.map(|t| t.parse()).transpose()?.unwrap_or(0);
        let end = start.saturating_add(self.page_size).min(records.len());
        let next_page = (end < records.len()).then(|| end.to_string());

        Ok(RecordPage {
            records: records[start..end].to_vec(),
            next_page,
        })
    }
}

#[derive(Debug, Clone, Default)]
struct FakeTable {
    fields: Vec<TargetField>,
    records: Vec<(String, Map<String, Value>)>,
}

#[derive(Debug, Default)]
struct FakeTargetState {
    tables: BTreeMap<String, FakeTable>,
    next_record_id: usize,
    creation_log: Vec<(String, String)>,
}

/// Target provider holding tables in memory
#[derive(Debug, Default)]
pub struct FakeTarget {
    state: Mutex<FakeTargetState>,
}

impl FakeTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a table with existing fields
    pub fn seed_table(&self, name: &str, fields: Vec<(&str, &str)>) {
        let mut state = self.state.lock().unwrap();
        state.tables.insert(
            name.to_string(),
            FakeTable {
                fields: fields
                    .into_iter()
                    .map(|(name, field_type)| TargetField {
                        name: name.to_string(),
                        field_type: field_type.to_string(),
                    })
                    .collect(),
                records: Vec::new(),
            },
        );
    }

    pub fn fields(&self, table: &str) -> Vec<TargetField> {
        let state = self.state.lock().unwrap();
        state
            .tables
            .get(table)
            .map(|t| t.fields.clone())
            .unwrap_or_default()
    }

    pub fn field_names(&self, table: &str) -> Vec<String> {
        self.fields(table).into_iter().map(|f| f.name).collect()
    }

    pub fn records(&self, table: &str) -> Vec<(String, Map<String, Value>)> {
        let state = self.state.lock().unwrap();
        state
            .tables
            .get(table)
            .map(|t| t.records.clone())
            .unwrap_or_default()
    }

    /// Every `(table, field)` creation in call order
    pub fn field_creation_log(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().creation_log.clone()
    }
}

#[async_trait]
impl TargetSchemaProvider for FakeTarget {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().tables.contains_key(table))
    }

    async fn create_table(&self, table: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.tables.insert(
            table.to_string(),
            FakeTable {
                fields: vec![TargetField {
                    name: "Name".to_string(),
                    field_type: "singleLineText".to_string(),
                }],
                records: Vec::new(),
            },
        );
        Ok(())
    }

    async fn list_fields(&self, table: &str) -> Result<Vec<TargetField>> {
        Ok(self.fields(table))
    }

    async fn create_field(&self, table: &str, spec: &FieldSpec) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let TargetFieldKind::LinkedRecords { table: linked } = &spec.kind {
            if !state.tables.contains_key(linked) {
                bail!("linked table '{}' does not exist", linked);
            }
        }
        let Some(entry) = state.tables.get_mut(table) else {
            bail!("table '{}' does not exist", table);
        };
        entry.fields.push(TargetField {
            name: spec.name.clone(),
            field_type: spec.kind.api_type().to_string(),
        });
        state
            .creation_log
            .push((table.to_string(), spec.name.clone()));
        Ok(())
    }
}

#[async_trait]
impl TargetRecordProvider for FakeTarget {
    async fn find_by_key(
        &self,
        table: &str,
        key_field: &str,
        value: &str,
    ) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.tables.get(table).and_then(|t| {
            t.records
                .iter()
                .find(|(_, fields)| fields.get(key_field).and_then(Value::as_str) == Some(value))
                .map(|(id, _)| id.clone())
        }))
    }

    async fn create_records(
        &self,
        table: &str,
        records: &[Map<String, Value>],
    ) -> Result<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        let mut ids = Vec::with_capacity(records.len());
        for fields in records {
            state.next_record_id += 1;
            let id = format!("rec{}", state.next_record_id);
            ids.push(id.clone());
            let Some(entry) = state.tables.get_mut(table) else {
                bail!("table '{}' does not exist", table);
            };
            entry.records.push((id, fields.clone()));
        }
        Ok(ids)
    }

    async fn update_record(
        &self,
        table: &str,
        record_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let Some(entry) = state.tables.get_mut(table) else {
            bail!("table '{}' does not exist", table);
        };
        let Some((_, existing)) = entry.records.iter_mut().find(|(id, _)| id == record_id) else {
            bail!("record '{}' not found in '{}'", record_id, table);
        };
        for (key, value) in fields {
            existing.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn clear_table(&self, table: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.tables.get_mut(table) {
            entry.records.clear();
        }
        Ok(())
    }
}
