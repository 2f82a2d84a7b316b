//! Module name pluralization for relationship inference
//!
//! Zoho CRM names modules in the plural ("Accounts", "Vendors") while
//! relationship fields carry the singular ("Account_Name", "Vendor").
//! The default naming heuristic singularizes the field name and then
//! pluralizes it back with these rules to guess the referenced module.

/// Convert a singular module name to its plural form using English rules
pub fn pluralize_module_name(name: &str) -> String {
    if name.is_empty() {
        return name.to_string();
    }

    let lower = name.to_lowercase();

    // 's', 'ss', 'sh', 'ch', 'x' endings -> add 'es'
    if lower.ends_with('s')
        || lower.ends_with("sh")
        || lower.ends_with("ch")
        || lower.ends_with('x')
    {
        return format!("{}es", name);
    }

    // consonant + 'y' -> 'ies'
    if lower.ends_with('y') && lower.len() > 1 {
        let second_last = lower.chars().nth(lower.len() - 2).unwrap();
        if !"aeiou".contains(second_last) {
            return format!("{}ies", &name[..name.len() - 1]);
        }
    }

    // consonant + 'o' -> add 'es'
    if lower.ends_with('o') && lower.len() > 1 {
        let second_last = lower.chars().nth(lower.len() - 2).unwrap();
        if !"aeiou".contains(second_last) {
            return format!("{}es", name);
        }
    }

    format!("{}s", name)
}

/// True when a module name already looks plural under the same rules
pub fn looks_plural(name: &str) -> bool {
    name.to_lowercase().ends_with('s')
}
