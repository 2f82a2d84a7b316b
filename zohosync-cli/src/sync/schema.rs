//! Field schema mapping from Zoho CRM to Airtable
//!
//! Translates a module's field definitions into Airtable field specs,
//! preserving declaration order. The mapping is total: any source type
//! without an explicit row falls back to single-line text.

use serde_json::{Value, json};

use crate::api::zoho::models::{ZohoField, ZohoFieldType};

/// The join-key field written to every target record
pub const ZOHO_ID_FIELD: &str = "Zoho_ID";

/// Reserved prefix marking Zoho system metadata fields; never synced
pub const SYSTEM_PREFIX: char = '$';

/// An Airtable field type plus its creation options
#[derive(Debug, Clone, PartialEq)]
pub enum TargetFieldKind {
    SingleLineText,
    MultilineText,
    Email,
    PhoneNumber,
    Url,
    Number { precision: u8 },
    Currency { precision: u8 },
    Date,
    DateTime,
    /// Reference-type field pointing at another table's records
    LinkedRecords { table: String },
}

impl TargetFieldKind {
    /// Airtable API type identifier
    pub fn api_type(&self) -> &'static str {
        match self {
            Self::SingleLineText => "singleLineText",
            Self::MultilineText => "multilineText",
            Self::Email => "email",
            Self::PhoneNumber => "phoneNumber",
            Self::Url => "url",
            Self::Number { .. } => "number",
            Self::Currency { .. } => "currency",
            Self::Date => "date",
            Self::DateTime => "dateTime",
            Self::LinkedRecords { .. } => "multipleRecordLinks",
        }
    }

    /// Options payload for field creation, where the type requires one
    ///
    /// Linked-record options need the target table's id, which only the
    /// target client knows; it fills them in from the `table` name.
    pub fn options(&self) -> Option<Value> {
        match self {
            Self::Number { precision } => Some(json!({ "precision": precision })),
            Self::Currency { precision } => Some(json!({
                "precision": precision,
                "symbol": "$",
            })),
            Self::Date => Some(json!({
                "dateFormat": { "name": "iso", "format": "YYYY-MM-DD" },
            })),
            Self::DateTime => Some(json!({
                "dateFormat": { "name": "iso", "format": "YYYY-MM-DD" },
                "timeFormat": { "name": "24hour", "format": "HH:mm" },
                "timeZone": "utc",
            })),
            _ => None,
        }
    }

    /// Whether converted values for this field should be numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number { .. } | Self::Currency { .. })
    }
}

/// A single target field to ensure, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: TargetFieldKind,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: TargetFieldKind) -> Self {
        Self { name: name.into(), kind }
    }

    /// The spec for the `Zoho_ID` join-key field
    pub fn zoho_id() -> Self {
        Self::new(ZOHO_ID_FIELD, TargetFieldKind::SingleLineText)
    }
}

/// Map one Zoho field type to its Airtable counterpart
pub fn map_field_type(data_type: &ZohoFieldType) -> TargetFieldKind {
    match data_type {
        ZohoFieldType::Currency => TargetFieldKind::Currency { precision: 2 },
        ZohoFieldType::Decimal | ZohoFieldType::Double => TargetFieldKind::Number { precision: 2 },
        ZohoFieldType::Integer | ZohoFieldType::BigInt => TargetFieldKind::Number { precision: 0 },
        ZohoFieldType::Date => TargetFieldKind::Date,
        ZohoFieldType::DateTime => TargetFieldKind::DateTime,
        ZohoFieldType::Email => TargetFieldKind::Email,
        ZohoFieldType::Phone => TargetFieldKind::PhoneNumber,
        ZohoFieldType::Website => TargetFieldKind::Url,
        ZohoFieldType::Textarea | ZohoFieldType::FileUpload | ZohoFieldType::ProfileImage => {
            TargetFieldKind::MultilineText
        }
        // Booleans become "Yes"/"No" text: Airtable's checkbox type kept
        // rejecting re-runs with schema mismatches, so the text rendering
        // is the supported representation.
        ZohoFieldType::Boolean => TargetFieldKind::SingleLineText,
        // Picklists as plain text, not select fields: select options that
        // drift from the source produce INVALID_MULTIPLE_CHOICE_OPTIONS on
        // import. Lookups are flattened to display text by the converter.
        ZohoFieldType::Picklist
        | ZohoFieldType::MultiSelectPicklist
        | ZohoFieldType::Lookup
        | ZohoFieldType::OwnerLookup
        | ZohoFieldType::UserLookup
        | ZohoFieldType::Text
        | ZohoFieldType::Other(_) => TargetFieldKind::SingleLineText,
    }
}

/// Build ordered field specs for a module's Zoho schema
///
/// Declaration order is preserved exactly; system-prefixed fields and the
/// bare `id` field (re-expressed as `Zoho_ID` by the converter) are
/// excluded.
pub fn ordered_field_specs(fields: &[ZohoField]) -> Vec<FieldSpec> {
    fields
        .iter()
        .filter(|f| !f.api_name.starts_with(SYSTEM_PREFIX) && f.api_name != "id")
        .map(|f| FieldSpec::new(f.api_name.clone(), map_field_type(&f.data_type)))
        .collect()
}

/// Derive text field specs from record data, for modules without a
/// fields metadata endpoint (Users). Keys are collected across a sample
/// of records and emitted in sorted order; everything lands as
/// single-line text since record data carries no type information.
pub fn derive_field_specs(records: &[Value], blacklist: &[&str]) -> Vec<FieldSpec> {
    let mut names = std::collections::BTreeSet::new();
    for record in records.iter().take(50) {
        let Some(obj) = record.as_object() else { continue };
        for key in obj.keys() {
            if key == "id" || key.starts_with(SYSTEM_PREFIX) || blacklist.contains(&key.as_str()) {
                continue;
            }
            names.insert(key.clone());
        }
    }
    names
        .into_iter()
        .map(|name| FieldSpec::new(name, TargetFieldKind::SingleLineText))
        .collect()
}
