//! Record conversion from Zoho CRM to Airtable
//!
//! Flattens one source record into target-representable fields: system
//! attributes are dropped, relationship values split into display text
//! plus a foreign-identifier sibling, booleans and arrays normalized to
//! text, numbers coerced to what the target schema expects.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use super::error::ConversionError;
use super::schema::{SYSTEM_PREFIX, TargetFieldKind, ZOHO_ID_FIELD};

/// Suffix of the sibling field carrying a relationship's foreign id
pub const LINK_ID_SUFFIX: &str = "_ZohoID";

/// Suffix of the reference-type field materialized from a relationship
pub const LINKED_SUFFIX: &str = "_Linked";

/// One record in target form, keyed by target field name
#[derive(Debug, Clone)]
pub struct ConvertedRecord {
    /// Originating source record id (also written to `Zoho_ID`)
    pub source_id: String,
    pub fields: Map<String, Value>,
}

impl ConvertedRecord {
    /// The foreign id captured for a relationship field, if the source
    /// record carried one
    pub fn link_id(&self, field: &str) -> Option<&str> {
        self.fields
            .get(&format!("{}{}", field, LINK_ID_SUFFIX))
            .and_then(Value::as_str)
    }
}

/// Fields to drop entirely for specific modules; these carry values the
/// target cannot store usefully (timezone blobs, locale flags).
pub fn module_field_blacklist(module: &str) -> &'static [&'static str] {
    match module {
        "Users" => &["offset", "time_zone", "Microsoft", "country_locale"],
        _ => &[],
    }
}

/// Convert one source record to target form
///
/// `relationships` is the detector's field → module map; only detected
/// relationship fields get the `_ZohoID` sibling. `specs` drives numeric
/// coercion by target field name. Fails only when the record has no `id`
/// to serve as the join key; every other value has a text fallback.
pub fn convert_record(
    record: &Value,
    relationships: &HashMap<String, String>,
    specs: &HashMap<String, TargetFieldKind>,
    blacklist: &[&str],
) -> Result<ConvertedRecord, ConversionError> {
    let source = record.as_object().ok_or(ConversionError::MissingId)?;
    let source_id = match source.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ConversionError::MissingId),
    };

    let skip: HashSet<&str> = blacklist.iter().copied().collect();
    let mut fields = Map::new();

    for (key, value) in source {
        if key == "id" || key.starts_with(SYSTEM_PREFIX) || skip.contains(key.as_str()) {
            continue;
        }
        if value.is_null() {
            continue;
        }

        match value {
            Value::Bool(b) => {
                fields.insert(key.clone(), Value::String(yes_no(*b).to_string()));
            }
            Value::Object(obj) => {
                let name = obj.get("name").and_then(Value::as_str);
                let id = obj.get("id").map(id_text);
                match (name, id) {
                    (Some(name), Some(id)) => {
                        fields.insert(key.clone(), Value::String(name.to_string()));
                        if relationships.contains_key(key) {
                            fields.insert(
                                format!("{}{}", key, LINK_ID_SUFFIX),
                                Value::String(id),
                            );
                        }
                    }
                    (Some(name), None) => {
                        fields.insert(key.clone(), Value::String(name.to_string()));
                    }
                    (None, Some(id)) => {
                        fields.insert(key.clone(), Value::String(id));
                    }
                    (None, None) => {
                        fields.insert(key.clone(), Value::String(value.to_string()));
                    }
                }
            }
            Value::Array(items) => {
                if items.is_empty() {
                    continue;
                }
                let joined = items.iter().map(element_text).collect::<Vec<_>>().join(", ");
                fields.insert(key.clone(), Value::String(joined));
            }
            Value::Number(_) => {
                let expect_numeric = specs.get(key).map(TargetFieldKind::is_numeric);
                if expect_numeric == Some(false) {
                    fields.insert(key.clone(), Value::String(scalar_text(value)));
                } else {
                    fields.insert(key.clone(), value.clone());
                }
            }
            Value::String(s) => {
                if specs.get(key).is_some_and(TargetFieldKind::is_numeric) {
                    // Numeric strings become numbers; anything unparseable
                    // drops the field rather than failing the record.
                    if let Some(parsed) = parse_number(s) {
                        fields.insert(key.clone(), parsed);
                    }
                } else {
                    fields.insert(key.clone(), value.clone());
                }
            }
            Value::Null => unreachable!("nulls filtered above"),
        }
    }

    fields.insert(ZOHO_ID_FIELD.to_string(), Value::String(source_id.clone()));

    Ok(ConvertedRecord { source_id, fields })
}

fn yes_no(b: bool) -> &'static str {
    if b { "Yes" } else { "No" }
}

fn id_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Text form of an array element; nested objects contribute their name
fn element_text(value: &Value) -> String {
    match value {
        Value::Object(obj) => obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => yes_no(*b).to_string(),
        other => other.to_string(),
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if trimmed.contains('.') || trimmed.to_lowercase().contains('e') {
        trimmed.parse::<f64>().ok().and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
    } else {
        trimmed.parse::<i64>().ok().map(|i| Value::Number(i.into()))
    }
}
