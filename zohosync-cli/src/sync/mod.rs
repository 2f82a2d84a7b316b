//! Zoho → Airtable sync engine
//!
//! This module tree is the core of the tool:
//! - schema mapping and record conversion (`schema`, `convert`)
//! - relationship detection over live record data (`relationships`)
//! - the cross-system identity map and run-scoped state (`identity`, `context`)
//! - the dependency-aware orchestrator tying it together (`engine`)

pub mod context;
pub mod convert;
pub mod engine;
pub mod error;
pub mod identity;
pub mod providers;
pub mod relationships;
pub mod report;
pub mod schema;

#[cfg(test)]
pub mod testing;

pub use context::RunContext;
pub use engine::{SyncEngine, SyncOptions};
pub use error::{ConversionError, SyncError};
pub use identity::IdentityMap;
pub use providers::{
    RecordPage, SourceRecordProvider, SourceSchemaProvider, TargetField, TargetRecordProvider,
    TargetSchemaProvider,
};
pub use relationships::{ExplicitNaming, HeuristicNaming, ModuleNameStrategy};
pub use report::{ModuleSummary, SyncReport, SyncWarning};
pub use schema::{FieldSpec, TargetFieldKind};
