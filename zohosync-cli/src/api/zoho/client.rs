//! Zoho CRM Web API client
//!
//! Implements the source provider contracts over the v8 REST API:
//! module listing, per-module field metadata, and paginated record
//! fetches. The `Users` module lives on its own endpoint without field
//! metadata or pagination and is special-cased here, not in the engine.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use crate::config::ZohoConfig;
use crate::sync::error::SyncError;
use crate::sync::providers::{RecordPage, SourceRecordProvider, SourceSchemaProvider};

use super::auth::ZohoAuth;
use super::models::{ZohoField, ZohoModule};

/// Records per page on the list endpoint (Zoho's maximum)
const PAGE_SIZE: usize = 200;

/// Pause between detail fetches, every `DETAIL_BURST` records
const DETAIL_PAUSE: Duration = Duration::from_millis(500);
const DETAIL_BURST: usize = 10;

pub struct ZohoClient {
    http: reqwest::Client,
    auth: ZohoAuth,
    api_base: String,
}

impl ZohoClient {
    pub fn new(config: &ZohoConfig) -> Self {
        let http = reqwest::Client::new();
        let auth = ZohoAuth::new(
            http.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
            config.refresh_token.clone(),
            &config.region,
        );
        Self {
            http,
            auth,
            api_base: format!("https://www.zohoapis.{}/crm/v8", config.region),
        }
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let token = self.auth.access_token().await?;
        let url = format!("{}/{}", self.api_base, path);
        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Zoho-oauthtoken {}", token))
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SyncError::Auth {
                system: "Zoho".to_string(),
                reason: "request rejected (401); the refresh token may lack \
                         ZohoCRM.modules.ALL / ZohoCRM.settings.ALL scope"
                    .to_string(),
            }
            .into());
        }
        // empty modules answer with 204 and no body
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Zoho API error {} on {}: {}", status, url, body);
        }
        response
            .json()
            .await
            .with_context(|| format!("malformed Zoho response from {}", url))
    }

    /// Fetch the full record (all fields) for each id on a list page;
    /// the list endpoint omits most fields.
    async fn fetch_details(&self, module: &str, ids: &[String]) -> Result<Vec<Value>> {
        let mut records = Vec::with_capacity(ids.len());
        for (index, id) in ids.iter().enumerate() {
            let body = self.get(&format!("{}/{}", module, id), &[]).await?;
            if let Some(data) = body.get("data").and_then(Value::as_array) {
                records.extend(data.iter().cloned());
            }
            if (index + 1) % DETAIL_BURST == 0 {
                tokio::time::sleep(DETAIL_PAUSE).await;
            }
        }
        Ok(records)
    }

    async fn fetch_users(&self) -> Result<RecordPage> {
        let body = self
            .get("users", &[("type", "AllUsers".to_string())])
            .await?;
        let records = body
            .get("users")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        log::info!("fetched {} users from Zoho CRM", records.len());
        Ok(RecordPage {
            records,
            next_page: None,
        })
    }
}

#[async_trait]
impl SourceSchemaProvider for ZohoClient {
    async fn list_modules(&self) -> Result<Vec<ZohoModule>> {
        let body = self.get("settings/modules", &[]).await?;
        let modules = body
            .get("modules")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let modules: Vec<ZohoModule> = modules
            .into_iter()
            .filter_map(|m| serde_json::from_value(m).ok())
            .filter(|m: &ZohoModule| m.api_supported)
            .collect();
        Ok(modules)
    }

    async fn module_fields(&self, module: &str) -> Result<Vec<ZohoField>> {
        // Users has no fields metadata endpoint; its schema is inferred
        // from record data alone
        if module == "Users" {
            return Ok(Vec::new());
        }
        let body = self
            .get("settings/fields", &[("module", module.to_string())])
            .await?;
        let fields = body
            .get("fields")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let fields: Vec<ZohoField> = fields
            .into_iter()
            .filter_map(|f| serde_json::from_value(f).ok())
            .collect();
        log::debug!("module '{}' declares {} fields", module, fields.len());
        Ok(fields)
    }
}

#[async_trait]
impl SourceRecordProvider for ZohoClient {
    async fn fetch_page(&self, module: &str, page_token: Option<&str>) -> Result<RecordPage> {
        if module == "Users" {
            return self.fetch_users().await;
        }

        let page: usize = page_token.map(|t| t.parse()).transpose()?.unwrap_or(1);
        let body = self
            .get(
                module,
                &[
                    ("page", page.to_string()),
                    ("per_page", PAGE_SIZE.to_string()),
                    ("fields", "All".to_string()),
                ],
            )
            .await?;

        let listed = body
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let ids: Vec<String> = listed
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        let records = self.fetch_details(module, &ids).await?;
        let more = body
            .get("info")
            .and_then(|i| i.get("more_records"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        log::info!(
            "fetched page {} of '{}': {} records{}",
            page,
            module,
            records.len(),
            if more { ", more to come" } else { "" }
        );
        Ok(RecordPage {
            records,
            next_page: more.then(|| (page + 1).to_string()),
        })
    }
}
