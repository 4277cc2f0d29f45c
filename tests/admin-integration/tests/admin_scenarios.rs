//! 跨 crate 的管理面场景测试

use config_abstractions::{Actor, ConfigProperty, PropertyValue, SourceClass};
use config_impl::{
    EnvironmentValues, InMemoryPropertyStore, JsonFilePropertyStore, StaticActionTokenVerifier,
    StaticPermissionGate,
};
use infrastructure_common::{AdminError, CounterRegistry};
use infrastructure_composition::{AdminInfrastructure, AdminScope};
use module_abstractions::{Module, ModuleRegistry, RouteScope, TabBinding};
use std::sync::Arc;

const TOKEN: &str = "integration";

fn properties() -> Vec<ConfigProperty> {
    vec![
        ConfigProperty::integer("max-items", 10, "Maximum items per page."),
        ConfigProperty::string("banner", "welcome", "Banner text."),
        ConfigProperty::boolean("maintenance-mode", false, "Maintenance switch."),
    ]
}

async fn infrastructure_with(
    store: Arc<InMemoryPropertyStore>,
    environment: EnvironmentValues,
) -> AdminInfrastructure {
    let mut builder = AdminInfrastructure::builder()
        .with_store(store)
        .with_environment(environment)
        .with_permission_gate(Arc::new(StaticPermissionGate::new().with_admin("ops")))
        .with_token_verifier(Arc::new(
            StaticActionTokenVerifier::new().with_shared_token(TOKEN),
        ))
        .with_module(
            Module::new("reporting")
                .with_global_route("/reports", "reports.list")
                .with_tab(TabBinding::new("analytics", "reports", "Reports")),
        )
        .with_module(
            Module::new("billing")
                .with_global_route("/billing", "billing.home")
                .with_namespaced_route("/invoices", "billing.invoices")
                .with_tab(TabBinding::new("analytics", "billing", "Billing")),
        );
    for property in properties() {
        builder = builder.with_property(property);
    }
    let infrastructure = builder.build().await.unwrap();
    infrastructure.start().await.unwrap();
    infrastructure
}

#[tokio::test]
async fn test_defaults_resolve_when_nothing_else_is_present() {
    let infrastructure =
        infrastructure_with(Arc::new(InMemoryPropertyStore::new()), EnvironmentValues::new()).await;

    for property in properties() {
        let value = infrastructure.config().resolve(property.name()).unwrap();
        assert_eq!(&value.value, property.default_value());
        assert_eq!(value.source, SourceClass::Default);
    }
}

#[tokio::test]
async fn test_max_items_override_and_reset() {
    let infrastructure =
        infrastructure_with(Arc::new(InMemoryPropertyStore::new()), EnvironmentValues::new()).await;
    let console = infrastructure.console(AdminScope::Global);
    let ops = Actor::new("ops");

    let value = console.resolve(&ops, "max-items").await.unwrap();
    assert_eq!((value.value, value.source), (PropertyValue::Int(10), SourceClass::Default));

    console
        .override_property(&ops, "max-items", "25", TOKEN)
        .await
        .unwrap();
    let value = console.resolve(&ops, "max-items").await.unwrap();
    assert_eq!(
        (value.value, value.source),
        (PropertyValue::Int(25), SourceClass::PersistedOverride)
    );

    console.reset_property(&ops, "max-items", TOKEN).await.unwrap();
    let value = console.resolve(&ops, "max-items").await.unwrap();
    assert_eq!((value.value, value.source), (PropertyValue::Int(10), SourceClass::Default));
}

#[tokio::test]
async fn test_override_wins_over_environment_for_every_property() {
    let environment = EnvironmentValues::from_map([
        ("max-items", "40"),
        ("banner", "from-env"),
        ("maintenance-mode", "true"),
    ]);
    let infrastructure =
        infrastructure_with(Arc::new(InMemoryPropertyStore::new()), environment).await;
    let console = infrastructure.console(AdminScope::Global);
    let ops = Actor::new("ops");

    let overrides = [
        ("max-items", "99"),
        ("banner", "from-override"),
        ("maintenance-mode", "false"),
    ];
    for (name, raw) in overrides {
        assert_eq!(
            infrastructure.config().resolve(name).unwrap().source,
            SourceClass::Environment
        );
        console.override_property(&ops, name, raw, TOKEN).await.unwrap();
        let value = infrastructure.config().resolve(name).unwrap();
        assert_eq!(value.value.to_raw(), raw);
        assert_eq!(value.source, SourceClass::PersistedOverride);
    }

    // 重置后回到部署环境值，重复重置不报错也不改变版本
    console.reset_property(&ops, "banner", TOKEN).await.unwrap();
    let value = infrastructure.config().resolve("banner").unwrap();
    assert_eq!(value.value.to_raw(), "from-env");
    assert_eq!(value.source, SourceClass::Environment);

    let version = infrastructure.config().version();
    let again = console.reset_property(&ops, "banner", TOKEN).await.unwrap();
    assert_eq!(again, version);
}

#[tokio::test]
async fn test_version_strictly_increases_across_mutations() {
    let infrastructure =
        infrastructure_with(Arc::new(InMemoryPropertyStore::new()), EnvironmentValues::new()).await;
    let console = infrastructure.console(AdminScope::Global);
    let ops = Actor::new("ops");

    let mut last = infrastructure.config().version();
    let steps: Vec<u64> = vec![
        console.override_property(&ops, "max-items", "11", TOKEN).await.unwrap(),
        console.save_draft(&ops, "max-items", "12", TOKEN).await.unwrap(),
        console.promote_draft(&ops, "max-items", TOKEN).await.unwrap(),
        console.reset_property(&ops, "max-items", TOKEN).await.unwrap(),
    ];
    for version in steps {
        assert!(version > last);
        last = version;
    }
}

#[tokio::test]
async fn test_non_forced_refresh_reads_store_at_most_once_per_window() {
    let store = Arc::new(InMemoryPropertyStore::new());
    let infrastructure = infrastructure_with(store.clone(), EnvironmentValues::new()).await;
    let config = infrastructure.config();

    let reads = store.read_count();
    assert!(!config.refresh(false).await.unwrap());
    assert!(!config.refresh(false).await.unwrap());
    assert_eq!(store.read_count(), reads);

    assert!(config.refresh(true).await.unwrap());
    assert_eq!(store.read_count(), reads + 1);
}

#[tokio::test]
async fn test_reporting_module_visibility() {
    let infrastructure =
        infrastructure_with(Arc::new(InMemoryPropertyStore::new()), EnvironmentValues::new()).await;
    let console = infrastructure.console(AdminScope::Global);
    let ops = Actor::new("ops");

    console.enable_module(&ops, "reporting", TOKEN).await.unwrap();
    let names: Vec<_> = console
        .list_modules(&ops, false)
        .await
        .unwrap()
        .into_iter()
        .map(|module| module.name)
        .collect();
    assert_eq!(names, vec!["reporting"]);
    assert!(console
        .reachable_routes(&ops)
        .await
        .unwrap()
        .contains(&"/reports".to_string()));

    console.disable_module(&ops, "reporting", TOKEN).await.unwrap();
    assert!(console.list_modules(&ops, false).await.unwrap().is_empty());
    assert!(console.reachable_routes(&ops).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_visibility_matches_enabled_modules() {
    let infrastructure =
        infrastructure_with(Arc::new(InMemoryPropertyStore::new()), EnvironmentValues::new()).await;
    let modules = infrastructure.modules();

    modules.enable("billing").await.unwrap();
    let routes_before = modules.routes(RouteScope::Global);
    let namespaced_before = modules.routes(RouteScope::Namespaced);
    let tabs_before: Vec<_> = modules
        .tabs("analytics")
        .iter()
        .map(|tab| tab.key().to_string())
        .collect();

    modules.enable("reporting").await.unwrap();
    let owners: Vec<_> = modules
        .routes(RouteScope::Global)
        .into_iter()
        .map(|route| route.module)
        .collect();
    assert_eq!(owners, vec!["billing", "reporting"]);
    modules.disable("reporting").await.unwrap();

    assert_eq!(modules.routes(RouteScope::Global), routes_before);
    assert_eq!(modules.routes(RouteScope::Namespaced), namespaced_before);
    let tabs_after: Vec<_> = modules
        .tabs("analytics")
        .iter()
        .map(|tab| tab.key().to_string())
        .collect();
    assert_eq!(tabs_after, tabs_before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overrides_last_writer_wins() {
    let store = Arc::new(InMemoryPropertyStore::new());
    let infrastructure = infrastructure_with(store.clone(), EnvironmentValues::new()).await;
    let before = infrastructure.config().version();

    let first = infrastructure.console(AdminScope::Global);
    let second = infrastructure.console(AdminScope::Namespace("team".to_string()));
    let a = tokio::spawn(async move {
        first
            .override_property(&Actor::new("ops"), "banner", "A", TOKEN)
            .await
            .unwrap()
    });
    let b = tokio::spawn(async move {
        second
            .override_property(&Actor::new("ops"), "banner", "B", TOKEN)
            .await
            .unwrap()
    });
    let (va, vb) = (a.await.unwrap(), b.await.unwrap());

    assert_eq!(infrastructure.config().version(), before + 2);
    let winner = if va > vb { "A" } else { "B" };
    let value = infrastructure.config().resolve("banner").unwrap();
    assert_eq!(value.value.to_raw(), winner);
    assert_eq!(store.get_raw("banner").unwrap().value, winner);
}

#[tokio::test]
async fn test_storage_outage_keeps_last_good_snapshot() {
    let store = Arc::new(InMemoryPropertyStore::new());
    let infrastructure = infrastructure_with(store.clone(), EnvironmentValues::new()).await;
    let console = infrastructure.console(AdminScope::Global);
    let ops = Actor::new("ops");

    console
        .override_property(&ops, "max-items", "30", TOKEN)
        .await
        .unwrap();
    let version = infrastructure.config().version();

    store.set_available(false);
    let err = infrastructure.config().refresh(true).await.unwrap_err();
    assert!(matches!(err, AdminError::StorageUnavailable { .. }));
    assert_eq!(infrastructure.config().version(), version);
    assert_eq!(
        infrastructure.config().resolve("max-items").unwrap().value,
        PropertyValue::Int(30)
    );
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("overrides.json");
    let ops = Actor::new("ops");

    for expected in [None, Some("7")] {
        let mut builder = AdminInfrastructure::builder()
            .with_store(Arc::new(JsonFilePropertyStore::new(&path)))
            .with_permission_gate(Arc::new(StaticPermissionGate::allow_all()));
        for property in properties() {
            builder = builder.with_property(property);
        }
        let infrastructure = builder.build().await.unwrap();
        infrastructure.start().await.unwrap();

        let value = infrastructure.config().resolve("max-items").unwrap();
        match expected {
            None => {
                assert_eq!(value.source, SourceClass::Default);
                infrastructure
                    .config()
                    .override_property("max-items", PropertyValue::Int(7), &ops)
                    .await
                    .unwrap();
            }
            Some(raw) => {
                assert_eq!(value.value.to_raw(), raw);
                assert_eq!(value.source, SourceClass::PersistedOverride);
            }
        }
        infrastructure.stop().await.unwrap();
    }
}

#[test]
fn test_counter_registry_snapshot_is_sorted() {
    let counters = CounterRegistry::new();
    counters.register("requests", None).unwrap();
    counters
        .register("cache-hits", Some(Arc::new(|| Some(42))))
        .unwrap();
    counters.increment("requests", 3).unwrap();

    let snapshot = counters.snapshot();
    assert_eq!(snapshot[0].name, "cache-hits");
    assert_eq!(snapshot[0].global_value, Some(42));
    assert_eq!(snapshot[1].name, "requests");
    assert_eq!(snapshot[1].local_value, 3);
    assert_eq!(snapshot[1].global_value, None);

    assert!(matches!(
        counters.increment("missing", 1),
        Err(AdminError::UnknownCounter { .. })
    ));
}
