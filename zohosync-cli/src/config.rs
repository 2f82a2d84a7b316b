//! Environment-based configuration
//!
//! Credentials come from the environment (a `.env` file is honored),
//! using the same variable names the deployment already carries.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct ZohoConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Datacenter TLD: "com", "eu", "in", ...
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub api_key: String,
    pub base_id: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub zoho: ZohoConfig,
    pub airtable: AirtableConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            zoho: ZohoConfig {
                client_id: require("CRM_CLIENTID")?,
                client_secret: require("CRM_CLIENTSECRET")?,
                refresh_token: require("CRM_REFRESH_TOKEN")?,
                region: env::var("ZOHO_REGION").unwrap_or_else(|_| "com".to_string()),
            },
            airtable: AirtableConfig {
                api_key: require("AIRTABLE_PERSONALKEY")?,
                base_id: require("AIRTABLE_BASE_ID")?,
            },
        })
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("missing required environment variable {}", name))
}
