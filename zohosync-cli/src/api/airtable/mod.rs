//! Airtable Web API (target system)

pub mod client;
pub mod models;

pub use client::AirtableClient;
pub use models::{AirtableField, AirtableRecord, AirtableTable};
