//! Airtable Web API client
//!
//! Implements the target provider contracts: table/field management over
//! the base metadata API and record reads/writes over the data API. The
//! client owns the pacing between calls; both APIs rate-limit at a
//! handful of requests per second.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Map, Value, json};
use std::time::Duration;

use crate::config::AirtableConfig;
use crate::sync::error::SyncError;
use crate::sync::providers::{TargetField, TargetRecordProvider, TargetSchemaProvider};
use crate::sync::schema::{FieldSpec, TargetFieldKind};

use super::models::{AirtableTable, RecordList, TableList};

const API_ROOT: &str = "https://api.airtable.com/v0";

/// Pause after each write to stay under the 5 req/s ceiling
const WRITE_PAUSE: Duration = Duration::from_millis(200);

/// Records per delete call
const DELETE_BATCH_SIZE: usize = 10;

pub struct AirtableClient {
    http: reqwest::Client,
    api_key: String,
    base_id: String,
}

impl AirtableClient {
    pub fn new(config: &AirtableConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_id: config.base_id.clone(),
        }
    }

    fn meta_url(&self) -> String {
        format!("{}/meta/bases/{}/tables", API_ROOT, self.base_id)
    }

    fn data_url(&self, table: &str) -> String {
        format!("{}/{}/{}", API_ROOT, self.base_id, urlencoding::encode(table))
    }

    async fn check(&self, response: reqwest::Response, url: &str) -> Result<Value> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SyncError::Auth {
                system: "Airtable".to_string(),
                reason: format!("request rejected ({}); check the personal access token's scopes", status),
            }
            .into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Airtable API error {} on {}: {}", status, url, body);
        }
        response
            .json()
            .await
            .with_context(|| format!("malformed Airtable response from {}", url))
    }

    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Value> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        self.check(response, url).await
    }

    async fn send_json(&self, method: reqwest::Method, url: &str, body: &Value) -> Result<Value> {
        let response = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .with_context(|| format!("{} {} failed", method, url))?;
        let parsed = self.check(response, url).await?;
        tokio::time::sleep(WRITE_PAUSE).await;
        Ok(parsed)
    }

    /// Current schema of the whole base
    pub async fn base_schema(&self) -> Result<Vec<AirtableTable>> {
        let body = self.get(&self.meta_url(), &[]).await?;
        let list: TableList = serde_json::from_value(body).context("unexpected base schema shape")?;
        Ok(list.tables)
    }

    async fn table(&self, name: &str) -> Result<Option<AirtableTable>> {
        Ok(self.base_schema().await?.into_iter().find(|t| t.name == name))
    }

    async fn table_id(&self, name: &str) -> Result<String> {
        match self.table(name).await? {
            Some(table) => Ok(table.id),
            None => bail!("table '{}' not found in base {}", name, self.base_id),
        }
    }
}

#[async_trait]
impl TargetSchemaProvider for AirtableClient {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.table(table).await?.is_some())
    }

    async fn create_table(&self, table: &str) -> Result<()> {
        // every table needs a primary field; records never write to it
        let body = json!({
            "name": table,
            "fields": [{ "name": "Name", "type": "singleLineText" }],
        });
        self.send_json(reqwest::Method::POST, &self.meta_url(), &body)
            .await?;
        log::info!("created Airtable table '{}'", table);
        Ok(())
    }

    async fn list_fields(&self, table: &str) -> Result<Vec<TargetField>> {
        match self.table(table).await? {
            Some(t) => Ok(t
                .fields
                .into_iter()
                .map(|f| TargetField {
                    name: f.name,
                    field_type: f.field_type,
                })
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    async fn create_field(&self, table: &str, spec: &FieldSpec) -> Result<()> {
        let table_id = self.table_id(table).await?;
        let mut body = json!({
            "name": spec.name,
            "type": spec.kind.api_type(),
        });
        let options = match &spec.kind {
            TargetFieldKind::LinkedRecords { table: linked } => {
                let linked_id = self
                    .table_id(linked)
                    .await
                    .with_context(|| format!("linked table for field '{}'", spec.name))?;
                Some(json!({ "linkedTableId": linked_id }))
            }
            other => other.options(),
        };
        if let Some(options) = options {
            body["options"] = options;
        }

        let url = format!("{}/{}/fields", self.meta_url(), table_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            // concurrent runs can race on creation; an existing field with
            // this name is the desired end state
            if text.contains("DUPLICATE_OR_EMPTY_FIELD_NAME") {
                return Ok(());
            }
            bail!("could not create field '{}' in '{}': {} {}", spec.name, table, status, text);
        }
        tokio::time::sleep(WRITE_PAUSE).await;
        Ok(())
    }
}

#[async_trait]
impl TargetRecordProvider for AirtableClient {
    async fn find_by_key(
        &self,
        table: &str,
        key_field: &str,
        value: &str,
    ) -> Result<Option<String>> {
        let formula = format!("{{{}}} = '{}'", key_field, value.replace('\'', "\\'"));
        let body = self
            .get(
                &self.data_url(table),
                &[
                    ("filterByFormula".to_string(), formula),
                    ("maxRecords".to_string(), "1".to_string()),
                ],
            )
            .await?;
        let list: RecordList = serde_json::from_value(body).context("unexpected record list shape")?;
        Ok(list.records.into_iter().next().map(|r| r.id))
    }

    async fn create_records(
        &self,
        table: &str,
        records: &[Map<String, Value>],
    ) -> Result<Vec<String>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let body = json!({
            "records": records
                .iter()
                .map(|fields| json!({ "fields": fields }))
                .collect::<Vec<_>>(),
        });
        let response = self
            .send_json(reqwest::Method::POST, &self.data_url(table), &body)
            .await?;
        let list: RecordList =
            serde_json::from_value(response).context("unexpected create response shape")?;
        Ok(list.records.into_iter().map(|r| r.id).collect())
    }

    async fn update_record(
        &self,
        table: &str,
        record_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<()> {
        let url = format!("{}/{}", self.data_url(table), record_id);
        let body = json!({ "fields": fields });
        self.send_json(reqwest::Method::PATCH, &url, &body).await?;
        Ok(())
    }

    async fn clear_table(&self, table: &str) -> Result<()> {
        // collect every record id, then delete in batches
        let mut ids: Vec<String> = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let mut query = vec![("pageSize".to_string(), "100".to_string())];
            if let Some(token) = &offset {
                query.push(("offset".to_string(), token.clone()));
            }
            let body = self.get(&self.data_url(table), &query).await?;
            let list: RecordList =
                serde_json::from_value(body).context("unexpected record list shape")?;
            ids.extend(list.records.into_iter().map(|r| r.id));
            match list.offset {
                Some(token) => offset = Some(token),
                None => break,
            }
        }

        for batch in ids.chunks(DELETE_BATCH_SIZE) {
            let query: Vec<(String, String)> = batch
                .iter()
                .map(|id| ("records[]".to_string(), id.clone()))
                .collect();
            let url = self.data_url(table);
            let response = self
                .http
                .delete(&url)
                .bearer_auth(&self.api_key)
                .query(&query)
                .send()
                .await
                .with_context(|| format!("DELETE {} failed", url))?;
            self.check(response, &url).await?;
            tokio::time::sleep(WRITE_PAUSE).await;
        }
        if !ids.is_empty() {
            log::info!("cleared {} records from '{}'", ids.len(), table);
        }
        Ok(())
    }
}
