//! Zoho CRM metadata models

use serde::{Deserialize, Serialize};

/// A module (record collection) as reported by the settings/modules endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZohoModule {
    pub api_name: String,
    #[serde(default)]
    pub plural_label: Option<String>,
    #[serde(default)]
    pub api_supported: bool,
}

/// Field metadata from the settings/fields endpoint
///
/// Declaration order in the `fields` array is significant and is carried
/// through to target schema creation untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZohoField {
    pub api_name: String,
    pub data_type: ZohoFieldType,
    #[serde(default)]
    pub field_label: Option<String>,
}

/// Field data types in Zoho CRM
///
/// The wire format is a lowercase string; unknown types are preserved in
/// `Other` so the schema mapper stays total over whatever Zoho adds next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ZohoFieldType {
    Text,
    Textarea,
    Email,
    Phone,
    Website,
    Picklist,
    MultiSelectPicklist,
    Boolean,
    Integer,
    BigInt,
    Double,
    Decimal,
    Currency,
    Date,
    DateTime,
    Lookup,
    OwnerLookup,
    UserLookup,
    FileUpload,
    ProfileImage,
    Other(String),
}

impl From<String> for ZohoFieldType {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "text" => Self::Text,
            "textarea" => Self::Textarea,
            "email" => Self::Email,
            "phone" => Self::Phone,
            "website" | "url" => Self::Website,
            "picklist" => Self::Picklist,
            "multiselectpicklist" => Self::MultiSelectPicklist,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "bigint" => Self::BigInt,
            "double" => Self::Double,
            "decimal" => Self::Decimal,
            "currency" => Self::Currency,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "lookup" => Self::Lookup,
            "ownerlookup" => Self::OwnerLookup,
            "userlookup" => Self::UserLookup,
            "fileupload" => Self::FileUpload,
            "profileimage" => Self::ProfileImage,
            _ => Self::Other(s),
        }
    }
}

impl From<ZohoFieldType> for String {
    fn from(t: ZohoFieldType) -> Self {
        match t {
            ZohoFieldType::Text => "text".into(),
            ZohoFieldType::Textarea => "textarea".into(),
            ZohoFieldType::Email => "email".into(),
            ZohoFieldType::Phone => "phone".into(),
            ZohoFieldType::Website => "website".into(),
            ZohoFieldType::Picklist => "picklist".into(),
            ZohoFieldType::MultiSelectPicklist => "multiselectpicklist".into(),
            ZohoFieldType::Boolean => "boolean".into(),
            ZohoFieldType::Integer => "integer".into(),
            ZohoFieldType::BigInt => "bigint".into(),
            ZohoFieldType::Double => "double".into(),
            ZohoFieldType::Decimal => "decimal".into(),
            ZohoFieldType::Currency => "currency".into(),
            ZohoFieldType::Date => "date".into(),
            ZohoFieldType::DateTime => "datetime".into(),
            ZohoFieldType::Lookup => "lookup".into(),
            ZohoFieldType::OwnerLookup => "ownerlookup".into(),
            ZohoFieldType::UserLookup => "userlookup".into(),
            ZohoFieldType::FileUpload => "fileupload".into(),
            ZohoFieldType::ProfileImage => "profileimage".into(),
            ZohoFieldType::Other(s) => s,
        }
    }
}
