//! Relationship detection over fetched source records
//!
//! Zoho does not declare which module a lookup points at in the payloads
//! we mirror, so relationships are inferred from record data: a field
//! whose values are consistently `{id, name, ...}` objects is treated as
//! a relationship field, and the referenced module name is guessed from
//! the field name. The guess is best-effort; a wrong or missing guess
//! leaves the field as flat display text rather than failing the run.

use std::collections::HashMap;

use serde_json::Value;

use crate::api::pluralization::{looks_plural, pluralize_module_name};

/// How many records the detector samples per module
pub const DETECTION_SAMPLE_SIZE: usize = 50;

/// Field names that always reference the Users module
const USER_REFERENCE_FIELDS: &[&str] = &["Owner", "Created_By", "Modified_By"];

/// Strategy for inferring the referenced module from a field name
///
/// The default heuristic is a replaceable guess, not a contract; swap it
/// for an explicit mapping without touching the orchestrator.
pub trait ModuleNameStrategy: Send + Sync {
    fn infer_module(&self, field_name: &str) -> Option<String>;
}

/// Default naming heuristic: fixed Users fields, then suffix-strip and
/// pluralize (`Account_Name` -> `Accounts`, `Vendor` -> `Vendors`).
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicNaming;

impl ModuleNameStrategy for HeuristicNaming {
    fn infer_module(&self, field_name: &str) -> Option<String> {
        if USER_REFERENCE_FIELDS.contains(&field_name) {
            return Some("Users".to_string());
        }

        let base = field_name
            .strip_suffix("_Name")
            .or_else(|| field_name.strip_suffix("_Id"))
            .unwrap_or(field_name);
        if base.is_empty() {
            return None;
        }

        if looks_plural(base) {
            Some(base.to_string())
        } else {
            Some(pluralize_module_name(base))
        }
    }
}

/// Explicit field → module mapping, for when the heuristic guesses wrong
#[derive(Debug, Clone, Default)]
pub struct ExplicitNaming {
    mapping: HashMap<String, String>,
}

impl ExplicitNaming {
    pub fn new(mapping: HashMap<String, String>) -> Self {
        Self { mapping }
    }
}

impl ModuleNameStrategy for ExplicitNaming {
    fn infer_module(&self, field_name: &str) -> Option<String> {
        self.mapping.get(field_name).cloned()
    }
}

/// Inspect a batch of raw source records and infer which fields are
/// relationship fields, returning `field name → referenced module`.
pub fn detect_relationships(
    records: &[Value],
    strategy: &dyn ModuleNameStrategy,
) -> HashMap<String, String> {
    // per field: (relationship-shaped count, other non-null count)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    for record in records.iter().take(DETECTION_SAMPLE_SIZE) {
        let Some(obj) = record.as_object() else { continue };
        for (key, value) in obj {
            if key == "id" || value.is_null() {
                continue;
            }
            let entry = counts.entry(key.clone()).or_default();
            if is_relationship_shaped(value) {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
    }

    counts
        .into_iter()
        .filter(|(_, (rel, other))| *rel > 0 && *other == 0)
        .filter_map(|(field, _)| {
            strategy.infer_module(&field).map(|module| (field, module))
        })
        .collect()
}

/// A value references another module's record when it is an object
/// carrying both an `id` and a `name` key.
fn is_relationship_shaped(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("id") && obj.contains_key("name"))
}
