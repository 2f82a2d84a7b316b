//! Remote system clients
//!
//! The source (Zoho CRM) and target (Airtable) clients implement the
//! provider contracts in [`crate::sync::providers`]; the engine never
//! talks HTTP directly.

pub mod airtable;
pub mod pluralization;
pub mod zoho;

pub use airtable::AirtableClient;
pub use zoho::ZohoClient;
