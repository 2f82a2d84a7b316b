//! Sync run reporting
//!
//! Per-module counters plus the warnings collected along the way. The
//! run never aborts for a warning; everything non-fatal lands here and
//! is printed after the run completes.

use serde::{Deserialize, Serialize};

/// Non-fatal conditions recorded during a sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SyncWarning {
    /// An existing target field's type conflicts with the mapped type;
    /// the existing field is used as-is, never altered.
    FieldTypeMismatch {
        module: String,
        field: String,
        expected: String,
        existing: String,
    },
    /// A target field could not be created; records proceed without it
    FieldCreateFailed {
        module: String,
        field: String,
        reason: String,
    },
    /// One record could not be converted; the batch continued
    ConversionFailed {
        module: String,
        record_index: usize,
        reason: String,
    },
    /// One write batch failed; the sync continued with the next batch
    RecordWriteFailed {
        module: String,
        record_count: usize,
        reason: String,
    },
    /// A relationship value had no identity-map entry; the linked field
    /// was left unset for this record.
    LinkPending {
        module: String,
        field: String,
        source_id: String,
    },
    /// A dependency pointed back into the current sync chain; the guard
    /// skipped it. Informational, not a failure.
    CircularDependencyAvoided { module: String, via: String },
}

impl std::fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FieldTypeMismatch { module, field, expected, existing } => write!(
                f,
                "{}.{}: existing field type '{}' conflicts with mapped type '{}', keeping existing",
                module, field, existing, expected
            ),
            Self::FieldCreateFailed { module, field, reason } => {
                write!(f, "{}.{}: field creation failed: {}", module, field, reason)
            }
            Self::ConversionFailed { module, record_index, reason } => {
                write!(f, "{} record #{}: {}", module, record_index, reason)
            }
            Self::RecordWriteFailed { module, record_count, reason } => {
                write!(f, "{}: batch of {} records failed: {}", module, record_count, reason)
            }
            Self::LinkPending { module, field, source_id } => write!(
                f,
                "{}.{}: no mapping for referenced id '{}', link left pending",
                module, field, source_id
            ),
            Self::CircularDependencyAvoided { module, via } => {
                write!(f, "circular dependency on '{}' via '{}' skipped", module, via)
            }
        }
    }
}

/// Counters for one synced module
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub module: String,
    pub fields_created: usize,
    pub records_created: usize,
    pub records_updated: usize,
    pub linked_fields_created: usize,
    pub links_resolved: usize,
    pub links_pending: usize,
}

/// Outcome of one top-level sync invocation, dependencies included
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub started_at: String,
    /// One entry per module that actually synced, in completion order
    /// (dependencies finish before their dependents)
    pub modules: Vec<ModuleSummary>,
    pub warnings: Vec<SyncWarning>,
}

impl SyncReport {
    pub fn new() -> Self {
        Self {
            started_at: chrono::Utc::now().to_rfc3339(),
            ..Self::default()
        }
    }

    pub fn push_module(&mut self, summary: ModuleSummary) {
        self.modules.push(summary);
    }

    pub fn warn(&mut self, warning: SyncWarning) {
        self.warnings.push(warning);
    }

    pub fn total_records(&self) -> usize {
        self.modules
            .iter()
            .map(|m| m.records_created + m.records_updated)
            .sum()
    }

    pub fn total_fields_created(&self) -> usize {
        self.modules.iter().map(|m| m.fields_created).sum()
    }

    pub fn total_links_resolved(&self) -> usize {
        self.modules.iter().map(|m| m.links_resolved).sum()
    }

    pub fn total_links_pending(&self) -> usize {
        self.modules.iter().map(|m| m.links_pending).sum()
    }

    pub fn module(&self, name: &str) -> Option<&ModuleSummary> {
        self.modules.iter().find(|m| m.module == name)
    }
}
