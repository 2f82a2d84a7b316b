//! Error taxonomy for the sync engine
//!
//! Only unreachable providers and authentication failures abort a run.
//! Everything else (type mismatches, per-record conversion failures,
//! per-batch write failures, unresolved links) is collected as a
//! [`SyncWarning`](super::report::SyncWarning) and surfaced after the run.

use thiserror::Error;

/// Fatal errors that abort the current sync run
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to fetch field schema for module '{module}': {cause:#}")]
    SchemaFetch {
        module: String,
        cause: anyhow::Error,
    },

    #[error("failed to fetch records for module '{module}': {cause:#}")]
    RecordFetch {
        module: String,
        cause: anyhow::Error,
    },

    #[error("target table '{table}' is unavailable: {cause:#}")]
    TargetUnavailable {
        table: String,
        cause: anyhow::Error,
    },

    #[error("authentication with {system} failed: {reason}")]
    Auth { system: String, reason: String },
}

/// Per-record conversion failure; fails the record, never the batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The record carries no `id`, so its `Zoho_ID` join key cannot be built
    #[error("record has no 'id' value")]
    MissingId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_error_display() {
        let err = SyncError::SchemaFetch {
            module: "Leads".to_string(),
            cause: anyhow::anyhow!("connection refused"),
        };
        let msg = err.to_string();
        assert!(msg.contains("Leads"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_auth_error_display() {
        let err = SyncError::Auth {
            system: "Zoho".to_string(),
            reason: "refresh token rejected".to_string(),
        };
        assert!(err.to_string().contains("Zoho"));
    }

    #[test]
    fn test_conversion_error_display() {
        assert_eq!(ConversionError::MissingId.to_string(), "record has no 'id' value");
    }
}
