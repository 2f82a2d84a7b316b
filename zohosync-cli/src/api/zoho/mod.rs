//! Zoho CRM Web API (source system)

pub mod auth;
pub mod client;
pub mod models;

pub use client::ZohoClient;
pub use models::{ZohoField, ZohoFieldType, ZohoModule};
