//! Dependency-aware sync orchestration
//!
//! The core of the tool: given a requested module, discover which other
//! modules its record data references, sync those first (cycle-safe),
//! then mirror the requested module's schema and records, and finally
//! materialize relationship fields as linked references using the
//! identity map built along the way.
//!
//! Execution is strictly sequential: schema before records, records
//! before links, dependencies fully before dependents. Both remote
//! systems rate-limit aggressively, and link creation needs the identity
//! map entries that earlier phases produce.

use std::collections::HashMap;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value, json};

use super::context::RunContext;
use super::convert::{
    ConvertedRecord, LINK_ID_SUFFIX, LINKED_SUFFIX, convert_record, module_field_blacklist,
};
use super::error::SyncError;
use super::providers::{
    SourceRecordProvider, SourceSchemaProvider, TargetRecordProvider, TargetSchemaProvider,
};
use super::relationships::{HeuristicNaming, ModuleNameStrategy, detect_relationships};
use super::report::{ModuleSummary, SyncReport, SyncWarning};
use super::schema::{self, FieldSpec, TargetFieldKind, ZOHO_ID_FIELD};

/// Airtable accepts at most 10 records per write call
pub const WRITE_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Delete existing target records before importing
    pub clear_existing: bool,
    /// Create and populate `_Linked` reference fields after import
    pub populate_links: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            clear_existing: false,
            populate_links: true,
        }
    }
}

pub struct SyncEngine<'a, S, T> {
    source: &'a S,
    target: &'a T,
    naming: Box<dyn ModuleNameStrategy>,
    options: SyncOptions,
}

impl<'a, S, T> SyncEngine<'a, S, T>
where
    S: SourceSchemaProvider + SourceRecordProvider + Sync,
    T: TargetSchemaProvider + TargetRecordProvider + Sync,
{
    pub fn new(source: &'a S, target: &'a T, options: SyncOptions) -> Self {
        Self {
            source,
            target,
            naming: Box::new(HeuristicNaming),
            options,
        }
    }

    /// Replace the module-name inference strategy
    pub fn with_naming(mut self, naming: Box<dyn ModuleNameStrategy>) -> Self {
        self.naming = naming;
        self
    }

    /// Sync one module and every module it transitively depends on
    pub async fn sync(&self, module: &str) -> Result<SyncReport, SyncError> {
        let mut ctx = RunContext::new();
        let mut report = SyncReport::new();
        self.sync_module(module.to_string(), &mut ctx, &mut report, 0)
            .await?;
        log::info!(
            "run for '{}' complete: {} module(s) synced",
            module,
            ctx.synced_count()
        );
        Ok(report)
    }

    /// Recursive entry point; boxed so the future type stays finite.
    ///
    /// The module enters the synced set on the way in, not after import:
    /// the set is a visited marker, and marking early is what makes a
    /// circular reference a skip instead of infinite recursion.
    fn sync_module<'b>(
        &'b self,
        module: String,
        ctx: &'b mut RunContext,
        report: &'b mut SyncReport,
        depth: usize,
    ) -> BoxFuture<'b, Result<(), SyncError>> {
        async move {
            if ctx.is_synced(&module) {
                log::debug!("module '{}' already synced this run, skipping", module);
                return Ok(());
            }
            ctx.mark_synced(&module);
            ctx.enter(&module);
            let result = self.sync_module_inner(&module, ctx, report, depth).await;
            ctx.leave(&module);
            result
        }
        .boxed()
    }

    async fn sync_module_inner(
        &self,
        module: &str,
        ctx: &mut RunContext,
        report: &mut SyncReport,
        depth: usize,
    ) -> Result<(), SyncError> {
        log::info!("{}syncing module '{}'", "  ".repeat(depth), module);
        let mut summary = ModuleSummary {
            module: module.to_string(),
            ..Default::default()
        };

        // target table must exist before any field creation
        let exists = self
            .target
            .table_exists(module)
            .await
            .map_err(|e| SyncError::TargetUnavailable {
                table: module.to_string(),
                cause: e,
            })?;
        if !exists {
            log::info!("creating target table '{}'", module);
            self.target
                .create_table(module)
                .await
                .map_err(|e| SyncError::TargetUnavailable {
                    table: module.to_string(),
                    cause: e,
                })?;
        }

        // mirror the source schema, declaration order intact, join key last
        let zoho_fields =
            self.source
                .module_fields(module)
                .await
                .map_err(|e| SyncError::SchemaFetch {
                    module: module.to_string(),
                    cause: e,
                })?;
        let mut specs = schema::ordered_field_specs(&zoho_fields);
        let schema_missing = specs.is_empty();
        specs.push(FieldSpec::zoho_id());
        summary.fields_created += self.ensure_fields(module, &specs, report).await?;

        let records = self.fetch_all_records(module).await?;
        log::info!("fetched {} records from '{}'", records.len(), module);

        // modules without field metadata (Users) get text fields derived
        // from their record data instead
        let blacklist = module_field_blacklist(module);
        if schema_missing && !records.is_empty() {
            let derived = schema::derive_field_specs(&records, blacklist);
            summary.fields_created += self.ensure_fields(module, &derived, report).await?;
            specs.extend(derived);
        }

        let relationships = detect_relationships(&records, self.naming.as_ref());
        let mut rel_fields: Vec<&String> = relationships.keys().collect();
        rel_fields.sort();

        // dependencies complete fully before this module's records convert,
        // so the identity map has their entries when links resolve
        let mut referenced: Vec<&String> = relationships.values().collect();
        referenced.sort();
        referenced.dedup();
        for dep in referenced {
            if ctx.is_synced(dep) {
                if ctx.in_flight(dep) && dep != module {
                    log::info!("circular dependency on '{}' via '{}', skipping", dep, module);
                    report.warn(SyncWarning::CircularDependencyAvoided {
                        module: dep.clone(),
                        via: module.to_string(),
                    });
                }
                continue;
            }
            self.sync_module(dep.clone(), ctx, report, depth + 1).await?;
        }

        // the converter emits `<field>_ZohoID` siblings for relationship
        // fields; those columns must exist before import
        let link_id_specs: Vec<FieldSpec> = rel_fields
            .iter()
            .map(|f| {
                FieldSpec::new(
                    format!("{}{}", f, LINK_ID_SUFFIX),
                    TargetFieldKind::SingleLineText,
                )
            })
            .collect();
        summary.fields_created += self.ensure_fields(module, &link_id_specs, report).await?;

        if self.options.clear_existing {
            log::info!("clearing existing records from '{}'", module);
            self.target
                .clear_table(module)
                .await
                .map_err(|e| SyncError::TargetUnavailable {
                    table: module.to_string(),
                    cause: e,
                })?;
        }

        let spec_kinds: HashMap<String, TargetFieldKind> = specs
            .iter()
            .map(|s| (s.name.clone(), s.kind.clone()))
            .collect();
        let mut converted: Vec<ConvertedRecord> = Vec::new();
        for (index, record) in records.iter().enumerate() {
            match convert_record(record, &relationships, &spec_kinds, blacklist) {
                Ok(rec) => converted.push(rec),
                Err(err) => report.warn(SyncWarning::ConversionFailed {
                    module: module.to_string(),
                    record_index: index,
                    reason: err.to_string(),
                }),
            }
        }

        self.write_records(module, &converted, ctx, report, &mut summary)
            .await?;
        log::debug!(
            "identity map holds {} record(s) for '{}'",
            ctx.identity.module_len(module),
            module
        );

        // step 7 of the walk: the module entered the synced set when the
        // recursion reached it; nothing further to mark here

        if self.options.populate_links && !rel_fields.is_empty() {
            self.link_records(module, &relationships, &rel_fields, &converted, ctx, report, &mut summary)
                .await?;
        }

        log::info!(
            "module '{}' done: {} created, {} updated, {} links resolved, {} pending",
            module,
            summary.records_created,
            summary.records_updated,
            summary.links_resolved,
            summary.links_pending
        );
        report.push_module(summary);
        Ok(())
    }

    /// Create any missing fields, in spec order; existing fields are
    /// matched case-insensitively and never altered, even on a type
    /// conflict. Returns how many fields were created.
    async fn ensure_fields(
        &self,
        module: &str,
        specs: &[FieldSpec],
        report: &mut SyncReport,
    ) -> Result<usize, SyncError> {
        if specs.is_empty() {
            return Ok(0);
        }
        let existing = self.list_target_fields(module).await?;
        let by_lower: HashMap<String, &super::providers::TargetField> = existing
            .iter()
            .map(|f| (f.name.to_lowercase(), f))
            .collect();

        let mut created = 0;
        for spec in specs {
            match by_lower.get(&spec.name.to_lowercase()) {
                Some(field) => {
                    if !field.field_type.eq_ignore_ascii_case(spec.kind.api_type()) {
                        report.warn(SyncWarning::FieldTypeMismatch {
                            module: module.to_string(),
                            field: field.name.clone(),
                            expected: spec.kind.api_type().to_string(),
                            existing: field.field_type.clone(),
                        });
                    }
                }
                None => match self.target.create_field(module, spec).await {
                    Ok(()) => created += 1,
                    Err(e) => report.warn(SyncWarning::FieldCreateFailed {
                        module: module.to_string(),
                        field: spec.name.clone(),
                        reason: e.to_string(),
                    }),
                },
            }
        }
        Ok(created)
    }

    async fn fetch_all_records(&self, module: &str) -> Result<Vec<Value>, SyncError> {
        let mut records = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self
                .source
                .fetch_page(module, token.as_deref())
                .await
                .map_err(|e| SyncError::RecordFetch {
                    module: module.to_string(),
                    cause: e,
                })?;
            records.extend(page.records);
            match page.next_page {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(records)
    }

    /// Upsert converted records: existing target rows (matched on the
    /// `Zoho_ID` join key) are updated in place, the rest are created in
    /// batches. Every written record lands in the identity map.
    async fn write_records(
        &self,
        module: &str,
        converted: &[ConvertedRecord],
        ctx: &mut RunContext,
        report: &mut SyncReport,
        summary: &mut ModuleSummary,
    ) -> Result<(), SyncError> {
        let target_fields = self.list_target_fields(module).await?;
        let name_map: HashMap<String, String> = target_fields
            .iter()
            .map(|f| (f.name.to_lowercase(), f.name.clone()))
            .collect();

        let mut pending: Vec<(&str, Map<String, Value>)> = Vec::new();
        for rec in converted {
            let mapped = remap_fields(&rec.fields, &name_map);
            let found = self
                .target
                .find_by_key(module, ZOHO_ID_FIELD, &rec.source_id)
                .await
                .map_err(|e| SyncError::TargetUnavailable {
                    table: module.to_string(),
                    cause: e,
                })?;
            match found {
                Some(target_id) => match self.target.update_record(module, &target_id, &mapped).await {
                    Ok(()) => {
                        ctx.identity.record(module, &rec.source_id, &target_id);
                        summary.records_updated += 1;
                    }
                    Err(e) => report.warn(SyncWarning::RecordWriteFailed {
                        module: module.to_string(),
                        record_count: 1,
                        reason: e.to_string(),
                    }),
                },
                None => pending.push((&rec.source_id, mapped)),
            }
        }

        for batch in pending.chunks(WRITE_BATCH_SIZE) {
            let payload: Vec<Map<String, Value>> =
                batch.iter().map(|(_, fields)| fields.clone()).collect();
            match self.target.create_records(module, &payload).await {
                Ok(ids) => {
                    for ((source_id, _), target_id) in batch.iter().zip(ids) {
                        ctx.identity.record(module, source_id, &target_id);
                        summary.records_created += 1;
                    }
                }
                Err(e) => report.warn(SyncWarning::RecordWriteFailed {
                    module: module.to_string(),
                    record_count: batch.len(),
                    reason: e.to_string(),
                }),
            }
        }
        Ok(())
    }

    /// Ensure `_Linked` reference fields exist and point resolved
    /// relationships at their target rows. Unresolved references stay
    /// pending; they are not retried within this run.
    #[allow(clippy::too_many_arguments)]
    async fn link_records(
        &self,
        module: &str,
        relationships: &HashMap<String, String>,
        rel_fields: &[&String],
        converted: &[ConvertedRecord],
        ctx: &RunContext,
        report: &mut SyncReport,
        summary: &mut ModuleSummary,
    ) -> Result<(), SyncError> {
        let linked_specs: Vec<FieldSpec> = rel_fields
            .iter()
            .map(|field| {
                FieldSpec::new(
                    format!("{}{}", field, LINKED_SUFFIX),
                    TargetFieldKind::LinkedRecords {
                        table: relationships[*field].clone(),
                    },
                )
            })
            .collect();
        summary.linked_fields_created += self.ensure_fields(module, &linked_specs, report).await?;

        for rec in converted {
            // records whose write batch failed have no target id to link
            let Some(own_id) = ctx.identity.resolve(module, &rec.source_id) else {
                continue;
            };

            let mut link_fields = Map::new();
            let mut resolved = 0;
            for field in rel_fields {
                let Some(foreign_id) = rec.link_id(field) else {
                    continue;
                };
                let ref_module = &relationships[*field];
                match ctx.identity.resolve(ref_module, foreign_id) {
                    Some(target_id) => {
                        link_fields
                            .insert(format!("{}{}", field, LINKED_SUFFIX), json!([target_id]));
                        resolved += 1;
                    }
                    None => {
                        summary.links_pending += 1;
                        report.warn(SyncWarning::LinkPending {
                            module: module.to_string(),
                            field: (*field).clone(),
                            source_id: foreign_id.to_string(),
                        });
                    }
                }
            }

            if link_fields.is_empty() {
                continue;
            }
            match self.target.update_record(module, own_id, &link_fields).await {
                Ok(()) => summary.links_resolved += resolved,
                Err(e) => report.warn(SyncWarning::RecordWriteFailed {
                    module: module.to_string(),
                    record_count: 1,
                    reason: e.to_string(),
                }),
            }
        }
        Ok(())
    }

    async fn list_target_fields(
        &self,
        module: &str,
    ) -> Result<Vec<super::providers::TargetField>, SyncError> {
        self.target
            .list_fields(module)
            .await
            .map_err(|e| SyncError::TargetUnavailable {
                table: module.to_string(),
                cause: e,
            })
    }
}

/// Map converted field names onto the target's actual field names,
/// case-insensitively; fields with no target column are dropped.
fn remap_fields(fields: &Map<String, Value>, name_map: &HashMap<String, String>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in fields {
        if let Some(actual) = name_map.get(&key.to_lowercase()) {
            out.insert(actual.clone(), value.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::{FakeSource, FakeTarget, field};
    use serde_json::json;

    fn engine<'a>(
        source: &'a FakeSource,
        target: &'a FakeTarget,
    ) -> SyncEngine<'a, FakeSource, FakeTarget> {
        SyncEngine::new(source, target, SyncOptions::default())
    }

    fn users_source() -> FakeSource {
        FakeSource::new()
            .with_module(
                "Users",
                vec![field("full_name", "text"), field("email", "email")],
                vec![
                    json!({"id": "123", "full_name": "Jane", "email": "jane@acme.test"}),
                    json!({"id": "124", "full_name": "Ken", "email": "ken@acme.test"}),
                ],
            )
            .with_module(
                "Accounts",
                vec![
                    field("Account_Name", "text"),
                    field("Annual_Revenue", "currency"),
                    field("Owner", "ownerlookup"),
                ],
                vec![
                    json!({
                        "id": "a1",
                        "Account_Name": "Acme",
                        "Annual_Revenue": 1000.5,
                        "Owner": {"id": "123", "name": "Jane"},
                    }),
                    json!({
                        "id": "a2",
                        "Account_Name": "Initech",
                        "Owner": {"id": "999", "name": "Ghost"},
                    }),
                ],
            )
    }

    #[tokio::test]
    async fn test_sync_creates_table_schema_and_records() {
        let source = FakeSource::new().with_module(
            "Leads",
            vec![
                field("Last_Name", "text"),
                field("$approval", "text"),
                field("Email", "email"),
            ],
            vec![json!({"id": "1", "Last_Name": "Doe", "Email": "doe@x.test"})],
        );
        let target = FakeTarget::new();

        let report = engine(&source, &target).sync("Leads").await.unwrap();

        let fields = target.field_names("Leads");
        // table primary field, then source order minus system fields, then join key
        assert_eq!(fields, vec!["Name", "Last_Name", "Email", "Zoho_ID"]);

        let records = target.records("Leads");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1["Last_Name"], "Doe");
        assert_eq!(records[0].1["Zoho_ID"], "1");

        let summary = report.module("Leads").unwrap();
        assert_eq!(summary.records_created, 1);
        assert_eq!(summary.records_updated, 0);
        // Last_Name, Email, Zoho_ID
        assert_eq!(summary.fields_created, 3);
    }

    #[tokio::test]
    async fn test_field_creation_follows_declaration_order() {
        let source = FakeSource::new().with_module(
            "Deals",
            vec![
                field("Stage", "picklist"),
                field("Amount", "currency"),
                field("Closing_Date", "date"),
                field("Description", "textarea"),
            ],
            vec![],
        );
        let target = FakeTarget::new();

        engine(&source, &target).sync("Deals").await.unwrap();

        let log: Vec<String> = target
            .field_creation_log()
            .into_iter()
            .filter(|(table, _)| table == "Deals")
            .map(|(_, field)| field)
            .collect();
        assert_eq!(log, vec!["Stage", "Amount", "Closing_Date", "Description", "Zoho_ID"]);
    }

    #[tokio::test]
    async fn test_rerun_updates_instead_of_duplicating() {
        let source = users_source();
        let target = FakeTarget::new();

        let first = engine(&source, &target).sync("Accounts").await.unwrap();
        assert_eq!(first.module("Accounts").unwrap().records_created, 2);

        let second = engine(&source, &target).sync("Accounts").await.unwrap();
        let summary = second.module("Accounts").unwrap();
        assert_eq!(summary.records_created, 0);
        assert_eq!(summary.records_updated, 2);

        // still two records, join keys unique
        let records = target.records("Accounts");
        assert_eq!(records.len(), 2);
        let mut keys: Vec<String> = records
            .iter()
            .map(|(_, fields)| fields["Zoho_ID"].as_str().unwrap().to_string())
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    async fn test_dependency_synced_before_dependent() {
        let source = users_source();
        let target = FakeTarget::new();

        let report = engine(&source, &target).sync("Accounts").await.unwrap();

        let order: Vec<&str> = report.modules.iter().map(|m| m.module.as_str()).collect();
        assert_eq!(order, vec!["Users", "Accounts"]);
        assert_eq!(report.module("Users").unwrap().records_created, 2);
    }

    #[tokio::test]
    async fn test_circular_dependencies_terminate() {
        // A -> B -> C -> A through relationship-shaped fields
        let source = FakeSource::new()
            .with_module(
                "As",
                vec![field("Name", "text")],
                vec![json!({"id": "1", "B": {"id": "2", "name": "b"}})],
            )
            .with_module(
                "Bs",
                vec![field("Name", "text")],
                vec![json!({"id": "2", "C": {"id": "3", "name": "c"}})],
            )
            .with_module(
                "Cs",
                vec![field("Name", "text")],
                vec![json!({"id": "3", "A": {"id": "1", "name": "a"}})],
            );
        let target = FakeTarget::new();

        let report = engine(&source, &target).sync("As").await.unwrap();

        let mut synced: Vec<&str> = report.modules.iter().map(|m| m.module.as_str()).collect();
        synced.sort();
        assert_eq!(synced, vec!["As", "Bs", "Cs"]);
        assert_eq!(report.modules.len(), 3);
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            SyncWarning::CircularDependencyAvoided { module, .. } if module == "As"
        )));
    }

    #[tokio::test]
    async fn test_links_resolved_through_identity_map() {
        let source = users_source();
        let target = FakeTarget::new();

        let report = engine(&source, &target).sync("Accounts").await.unwrap();

        let users: HashMap<String, String> = target
            .records("Users")
            .into_iter()
            .map(|(id, fields)| (fields["Zoho_ID"].as_str().unwrap().to_string(), id))
            .collect();
        let jane_target = users["123"].clone();

        let accounts = target.records("Accounts");
        let acme = accounts
            .iter()
            .find(|(_, f)| f["Zoho_ID"] == "a1")
            .unwrap();
        assert_eq!(acme.1["Owner"], "Jane");
        assert_eq!(acme.1["Owner_ZohoID"], "123");
        assert_eq!(acme.1["Owner_Linked"], json!([jane_target]));

        // the reference to an unknown user stays unset and warns
        let initech = accounts
            .iter()
            .find(|(_, f)| f["Zoho_ID"] == "a2")
            .unwrap();
        assert!(!initech.1.contains_key("Owner_Linked"));

        let summary = report.module("Accounts").unwrap();
        assert_eq!(summary.links_resolved, 1);
        assert_eq!(summary.links_pending, 1);
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            SyncWarning::LinkPending { field, source_id, .. }
                if field == "Owner" && source_id == "999"
        )));
    }

    #[tokio::test]
    async fn test_linked_field_points_at_referenced_table() {
        let source = users_source();
        let target = FakeTarget::new();

        engine(&source, &target).sync("Accounts").await.unwrap();

        let fields = target.fields("Accounts");
        let linked = fields.iter().find(|f| f.name == "Owner_Linked").unwrap();
        assert_eq!(linked.field_type, "multipleRecordLinks");
    }

    #[tokio::test]
    async fn test_type_mismatch_warns_without_touching_field() {
        let target = FakeTarget::new();
        target.seed_table(
            "Accounts",
            vec![("annual_revenue", "singleLineText"), ("Zoho_ID", "singleLineText")],
        );
        let source = FakeSource::new().with_module(
            "Accounts",
            vec![field("Annual_Revenue", "currency")],
            vec![json!({"id": "a1", "Annual_Revenue": 500})],
        );

        let report = engine(&source, &target).sync("Accounts").await.unwrap();

        assert!(report.warnings.iter().any(|w| matches!(
            w,
            SyncWarning::FieldTypeMismatch { field, existing, .. }
                if field == "annual_revenue" && existing == "singleLineText"
        )));

        // field kept exactly as seeded, and the value lands in it through
        // the case-insensitive name match
        let fields = target.fields("Accounts");
        let kept = fields.iter().find(|f| f.name == "annual_revenue").unwrap();
        assert_eq!(kept.field_type, "singleLineText");
        let records = target.records("Accounts");
        assert_eq!(records[0].1["annual_revenue"], json!(500));
    }

    #[tokio::test]
    async fn test_unconvertible_record_skipped_batch_continues() {
        let source = FakeSource::new().with_module(
            "Leads",
            vec![field("Last_Name", "text")],
            vec![
                json!({"Last_Name": "NoId"}),
                json!({"id": "2", "Last_Name": "Fine"}),
            ],
        );
        let target = FakeTarget::new();

        let report = engine(&source, &target).sync("Leads").await.unwrap();

        assert_eq!(target.records("Leads").len(), 1);
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            SyncWarning::ConversionFailed { record_index: 0, .. }
        )));
    }

    #[tokio::test]
    async fn test_skip_links_option_leaves_references_flat() {
        let source = users_source();
        let target = FakeTarget::new();
        let engine = SyncEngine::new(
            &source,
            &target,
            SyncOptions {
                populate_links: false,
                ..Default::default()
            },
        );

        let report = engine.sync("Accounts").await.unwrap();

        let fields = target.field_names("Accounts");
        assert!(!fields.iter().any(|f| f.ends_with(LINKED_SUFFIX)));
        // dependencies still sync; only the link phase is skipped
        assert!(report.module("Users").is_some());
        assert_eq!(report.module("Accounts").unwrap().links_resolved, 0);
    }

    #[tokio::test]
    async fn test_clear_existing_empties_table_first() {
        let source = users_source();
        let target = FakeTarget::new();

        engine(&source, &target).sync("Accounts").await.unwrap();
        assert_eq!(target.records("Accounts").len(), 2);

        let clearing = SyncEngine::new(
            &source,
            &target,
            SyncOptions {
                clear_existing: true,
                ..Default::default()
            },
        );
        let report = clearing.sync("Accounts").await.unwrap();

        // table was emptied, so everything was created fresh
        assert_eq!(report.module("Accounts").unwrap().records_created, 2);
        assert_eq!(target.records("Accounts").len(), 2);
    }

    #[tokio::test]
    async fn test_schemaless_module_derives_fields_from_records() {
        let source = FakeSource::new().with_module(
            "Users",
            vec![],
            vec![json!({
                "id": "u1",
                "full_name": "Jane",
                "email": "j@x.test",
                "time_zone": "PST",
            })],
        );
        let target = FakeTarget::new();

        engine(&source, &target).sync("Users").await.unwrap();

        let fields = target.field_names("Users");
        assert!(fields.contains(&"full_name".to_string()));
        assert!(fields.contains(&"email".to_string()));
        // blacklisted for Users, so neither field nor value appears
        assert!(!fields.contains(&"time_zone".to_string()));

        let records = target.records("Users");
        assert_eq!(records[0].1["full_name"], "Jane");
        assert_eq!(records[0].1["Zoho_ID"], "u1");
    }

    #[tokio::test]
    async fn test_pagination_is_exhausted() {
        let records: Vec<Value> = (0..25)
            .map(|i| json!({"id": i.to_string(), "Last_Name": format!("L{}", i)}))
            .collect();
        let source = FakeSource::new()
            .with_module("Leads", vec![field("Last_Name", "text")], records)
            .with_page_size(10);
        let target = FakeTarget::new();

        let report = engine(&source, &target).sync("Leads").await.unwrap();

        assert_eq!(report.module("Leads").unwrap().records_created, 25);
        assert_eq!(target.records("Leads").len(), 25);
    }
}
