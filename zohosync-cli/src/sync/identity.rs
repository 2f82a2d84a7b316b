//! Cross-system identifier mapping
//!
//! Registry of `module → (source id → target id)`, filled in as records
//! are written to the target and consulted when resolving links. One
//! entry per `(module, source id)` pair; the first target id recorded
//! for a pair wins for the rest of the run.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    entries: HashMap<String, HashMap<String, String>>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent upsert; re-recording the same pair keeps the first id
    pub fn record(&mut self, module: &str, source_id: &str, target_id: &str) {
        self.entries
            .entry(module.to_string())
            .or_default()
            .entry(source_id.to_string())
            .or_insert_with(|| target_id.to_string());
    }

    pub fn resolve(&self, module: &str, source_id: &str) -> Option<&str> {
        self.entries
            .get(module)?
            .get(source_id)
            .map(String::as_str)
    }

    /// Number of mapped records for a module
    pub fn module_len(&self, module: &str) -> usize {
        self.entries.get(module).map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_resolve() {
        let mut map = IdentityMap::new();
        map.record("Users", "123", "recU1");

        assert_eq!(map.resolve("Users", "123"), Some("recU1"));
        assert_eq!(map.resolve("Users", "999"), None);
        assert_eq!(map.resolve("Accounts", "123"), None);
    }

    #[test]
    fn test_first_target_id_wins() {
        let mut map = IdentityMap::new();
        map.record("Users", "123", "recU1");
        map.record("Users", "123", "recU2");

        assert_eq!(map.resolve("Users", "123"), Some("recU1"));
        assert_eq!(map.module_len("Users"), 1);
    }

    #[test]
    fn test_modules_are_isolated() {
        let mut map = IdentityMap::new();
        map.record("Users", "1", "recA");
        map.record("Accounts", "1", "recB");

        assert_eq!(map.resolve("Users", "1"), Some("recA"));
        assert_eq!(map.resolve("Accounts", "1"), Some("recB"));
    }
}
