//! Property tests for storage command registration.
//!
//! # Invariants tested:
//! 1. Gate exclusion: a command outside its version window leaves the registry untouched
//! 2. Injection order: the four storage parameters come first, command-specific ones follow
//! 3. Last write wins: the registry keeps the final definition per name
//! 4. Version order: `ApiVersion` ordering matches calendar ordering
//!
//! Run with: cargo test --package cmdtable-core --test registration_properties
//! Reproducible: Set `PROPTEST_SEED` environment variable for deterministic runs

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::redundant_closure_for_method_calls)]

use std::{collections::BTreeMap, sync::Arc};

use cmdtable_core::{
    param::ArgValues, register_storage_command, storage::STORAGE_PARAMETERS, ApiVersion,
    CommandRegistry, OperationRef, ParameterDescriptor, ResourceType, StorageCommand,
    VersionContext, VersionGate,
};
use proptest::prelude::*;
use serde_json::Value;

/// Optimized proptest config for fast registration property tests.
fn fast_config() -> ProptestConfig {
    ProptestConfig {
        cases: 64,
        max_shrink_iters: 256,
        ..ProptestConfig::default()
    }
}

/// Version context pinning only the data-storage resource type.
struct DataStorageAt(ApiVersion);

impl VersionContext for DataStorageAt {
    fn api_version(&self, resource_type: &ResourceType) -> Option<ApiVersion> {
        (resource_type.as_str() == ResourceType::DATA_STORAGE).then_some(self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// STRATEGIES
// ═══════════════════════════════════════════════════════════════════════════

fn api_version_strategy() -> impl Strategy<Value = ApiVersion> {
    (2012u32..2024, 1u32..=12, 1u32..=28, any::<bool>()).prop_map(|(year, month, day, preview)| {
        let suffix = if preview { "-preview" } else { "" };
        ApiVersion::parse(&format!("{year:04}-{month:02}-{day:02}{suffix}")).expect("valid date")
    })
}

fn command_word_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z-]{0,8}".prop_map(|word| word.trim_end_matches('-').to_string())
}

fn command(name: &str, member: &str, gate: VersionGate) -> StorageCommand {
    StorageCommand::new(
        name,
        OperationRef::parse(format!("storage.blob#{member}")).expect("operation"),
        Arc::new(|_: &ArgValues| Ok(Value::Null)),
    )
    .gate(gate)
}

fn seeded_registry(ctx: &dyn VersionContext) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    register_storage_command(
        &mut registry,
        ctx,
        command("storage blob list", "Svc.list", VersionGate::open()),
    )
    .expect("seed registers");
    registry
}

// ═══════════════════════════════════════════════════════════════════════════
// PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(fast_config())]

    /// Registering a command outside its window never changes the registry.
    #[test]
    fn prop_gated_out_registration_is_noop(
        active in api_version_strategy(),
        lower in api_version_strategy(),
        upper in api_version_strategy(),
    ) {
        let ctx = DataStorageAt(active);
        let mut registry = seeded_registry(&ctx);
        let before: Vec<String> = registry.names().map(str::to_string).collect();

        let gate = VersionGate::for_resource(ResourceType::data_storage())
            .min_api(lower)
            .max_api(upper);
        let in_window = lower <= active && active <= upper;

        let registered = register_storage_command(
            &mut registry,
            &ctx,
            command("storage blob list", "Svc.replacement", gate),
        )
        .expect("no argument collisions");

        prop_assert_eq!(registered, in_window);
        let operation = registry
            .lookup("storage blob list")
            .expect("seeded")
            .operation()
            .member()
            .to_string();
        if in_window {
            prop_assert_eq!(operation, "Svc.replacement");
        } else {
            prop_assert_eq!(operation, "Svc.list");
            let after: Vec<String> = registry.names().map(str::to_string).collect();
            prop_assert_eq!(before, after);
        }
    }

    /// The storage parameters lead and extra parameters follow in their given order.
    #[test]
    fn prop_storage_parameters_lead(
        names in prop::collection::btree_set("[a-z]{1,6}_arg", 0..5),
    ) {
        let ctx = DataStorageAt(ApiVersion::parse("2017-04-17").expect("version"));
        let mut registry = CommandRegistry::new();

        let definition = names.iter().fold(
            command("storage blob upload", "Svc.upload", VersionGate::open()),
            |definition, name| {
                let flag = format!("--{}", name.replace('_', "-"));
                definition.argument(ParameterDescriptor::new(name.as_str(), flag).expect("descriptor"))
            },
        );
        prop_assert!(register_storage_command(&mut registry, &ctx, definition).expect("registers"));

        let found = registry.lookup("storage blob upload").expect("registered");
        let internal: Vec<&str> = found.parameters().iter().map(|p| p.internal_name()).collect();
        let expected: Vec<&str> = STORAGE_PARAMETERS
            .into_iter()
            .chain(names.iter().map(String::as_str))
            .collect();
        prop_assert_eq!(internal, expected);
    }

    /// The registry holds the last definition registered under each name.
    #[test]
    fn prop_last_registration_wins(
        entries in prop::collection::vec((command_word_strategy(), 0usize..1000), 1..20),
    ) {
        let ctx = DataStorageAt(ApiVersion::parse("2017-04-17").expect("version"));
        let mut registry = CommandRegistry::new();
        let mut expected: BTreeMap<String, String> = BTreeMap::new();

        for (word, id) in &entries {
            let name = format!("storage {word}");
            let member = format!("Svc.op{id}");
            register_storage_command(&mut registry, &ctx, command(&name, &member, VersionGate::open()))
                .expect("registers");
            expected.insert(name, member);
        }

        prop_assert_eq!(registry.len(), expected.len());
        for (name, member) in &expected {
            let found = registry.lookup(name).expect("registered");
            prop_assert_eq!(found.operation().member(), member.as_str());
        }
    }

    /// Ordering of API versions follows the calendar, preview before GA on the same day.
    #[test]
    fn prop_api_version_order_matches_dates(
        a in api_version_strategy(),
        b in api_version_strategy(),
    ) {
        let (a_text, b_text) = (a.to_string(), b.to_string());
        let date_order = a_text[..10].cmp(&b_text[..10]);
        if date_order.is_ne() {
            prop_assert_eq!(a.cmp(&b), date_order);
        } else {
            prop_assert_eq!(a.cmp(&b), b.is_preview().cmp(&a.is_preview()));
        }
    }
}

#[test]
fn test_unknown_resource_type_fails_closed() {
    let ctx = DataStorageAt(ApiVersion::parse("2017-04-17").expect("version"));
    let mut registry = CommandRegistry::new();

    let gate = VersionGate::for_resource(ResourceType::mgmt_storage())
        .min_api(ApiVersion::parse("2015-01-01").expect("version"));
    let registered = register_storage_command(
        &mut registry,
        &ctx,
        command("storage account keys", "Svc.keys", gate),
    )
    .expect("no error");

    assert!(!registered);
    assert!(registry.is_empty());
}
