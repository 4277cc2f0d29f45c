//! 管理控制台测试

use super::init_test_logger;
use crate::builtin::{COUNTER_OVERRIDES, COUNTER_UPDATE_INDEX, SITE_ADMIN_MODULE};
use crate::console::AdminScope;
use crate::infrastructure::AdminInfrastructure;
use async_trait::async_trait;
use config_abstractions::{
    actions, ActionTokenVerifier, Actor, ConfigProperty, PermissionGate, SourceClass,
};
use config_impl::{EnvironmentValues, InMemoryPropertyStore, StaticActionTokenVerifier, StaticPermissionGate};
use infrastructure_common::{AdminError, DenialReason};
use mockall::mock;
use module_abstractions::{Module, TabBinding};
use std::sync::Arc;

mock! {
    pub Gate {}

    #[async_trait]
    impl PermissionGate for Gate {
        async fn is_admin(&self, actor: &Actor) -> bool;
        async fn can_modify_property(&self, actor: &Actor, name: &str) -> bool;
    }
}

mock! {
    pub Verifier {}

    impl ActionTokenVerifier for Verifier {
        fn verify(&self, action: &str, token: &str) -> bool;
    }
}

const TOKEN: &str = "secret";

fn reporting() -> Module {
    Module::new("reporting")
        .with_global_route("/reports", "reports.list")
        .with_namespaced_route("/reports/mine", "reports.mine")
        .with_tab(TabBinding::new("analytics", "reports", "Reports"))
}

async fn started(store: Arc<InMemoryPropertyStore>) -> AdminInfrastructure {
    init_test_logger();
    let infrastructure = AdminInfrastructure::builder()
        .with_store(store)
        .with_environment(EnvironmentValues::from_map([("banner", "hello")]))
        .with_permission_gate(Arc::new(
            StaticPermissionGate::new()
                .with_admin("ops")
                .with_locked_property("banner"),
        ))
        .with_token_verifier(Arc::new(StaticActionTokenVerifier::new().with_shared_token(TOKEN)))
        .with_property(ConfigProperty::integer("max-items", 10, "Maximum items per page."))
        .with_property(ConfigProperty::string("banner", "", "Banner text."))
        .with_module(reporting())
        .build()
        .await
        .unwrap();
    infrastructure.start().await.unwrap();
    infrastructure
}

#[tokio::test]
async fn test_override_and_reset_through_console() {
    let infrastructure = started(Arc::new(InMemoryPropertyStore::new())).await;
    let console = infrastructure.console(AdminScope::Global);
    let ops = Actor::new("ops");

    let value = console.resolve(&ops, "max-items").await.unwrap();
    assert_eq!(value.value.as_int(), Some(10));
    assert_eq!(value.source, SourceClass::Default);

    let before = infrastructure.config().version();
    let version = console
        .override_property(&ops, "max-items", "25", TOKEN)
        .await
        .unwrap();
    assert_eq!(version, before + 1);
    let value = console.resolve(&ops, "max-items").await.unwrap();
    assert_eq!(value.value.as_int(), Some(25));
    assert_eq!(value.source, SourceClass::PersistedOverride);

    console.reset_property(&ops, "max-items", TOKEN).await.unwrap();
    let value = console.resolve(&ops, "max-items").await.unwrap();
    assert_eq!(value.value.as_int(), Some(10));
    assert_eq!(value.source, SourceClass::Default);
}

#[tokio::test]
async fn test_invalid_input_is_a_validation_error() {
    let infrastructure = started(Arc::new(InMemoryPropertyStore::new())).await;
    let console = infrastructure.console(AdminScope::Global);

    let err = console
        .override_property(&Actor::new("ops"), "max-items", "lots", TOKEN)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Validation { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_locked_property_is_not_modifiable() {
    let infrastructure = started(Arc::new(InMemoryPropertyStore::new())).await;
    let console = infrastructure.console(AdminScope::Global);

    let err = console
        .override_property(&Actor::new("ops"), "banner", "bye", TOKEN)
        .await
        .unwrap_err();
    assert_eq!(err.denial_reason(), Some(DenialReason::PropertyNotModifiable));
}

#[tokio::test]
async fn test_non_admin_is_rejected() {
    let infrastructure = started(Arc::new(InMemoryPropertyStore::new())).await;
    let console = infrastructure.console(AdminScope::Global);
    let guest = Actor::new("guest");

    let err = console.list_properties(&guest).await.unwrap_err();
    assert_eq!(err.denial_reason(), Some(DenialReason::NotAdmin));

    let err = console
        .override_property(&guest, "max-items", "25", TOKEN)
        .await
        .unwrap_err();
    assert_eq!(err.denial_reason(), Some(DenialReason::NotAdmin));
}

#[tokio::test]
async fn test_token_is_checked_before_admin() {
    init_test_logger();
    let mut gate = MockGate::new();
    gate.expect_is_admin().times(0);
    let mut verifier = MockVerifier::new();
    verifier
        .expect_verify()
        .withf(|action, token| action == actions::CONFIG_OVERRIDE && token == "forged")
        .times(1)
        .returning(|_, _| false);

    let infrastructure = AdminInfrastructure::builder()
        .with_permission_gate(Arc::new(gate))
        .with_token_verifier(Arc::new(verifier))
        .with_property(ConfigProperty::integer("max-items", 10, "Maximum items per page."))
        .build()
        .await
        .unwrap();
    let console = infrastructure.console(AdminScope::Global);

    let err = console
        .override_property(&Actor::new("ops"), "max-items", "25", "forged")
        .await
        .unwrap_err();
    assert_eq!(err.denial_reason(), Some(DenialReason::InvalidActionToken));
}

#[tokio::test]
async fn test_list_properties_shows_drafts_and_refreshes() {
    let store = Arc::new(InMemoryPropertyStore::new());
    let infrastructure = started(store.clone()).await;
    let console = infrastructure.console(AdminScope::Global);
    let ops = Actor::new("ops");

    console.save_draft(&ops, "max-items", "50", TOKEN).await.unwrap();
    // 另一个实例写入的覆盖值
    store.insert_raw(config_abstractions::OverrideRecord::active("banner", "external"));

    let views = console.list_properties(&ops).await.unwrap();
    let names: Vec<_> = views.iter().map(|view| view.name.as_str()).collect();
    assert_eq!(names, vec!["banner", "config-update-interval-sec", "max-items"]);

    let max_items = views.iter().find(|view| view.name == "max-items").unwrap();
    assert_eq!(max_items.value, "50");
    assert_eq!(max_items.source, SourceClass::DraftOverride);
    assert!(max_items.override_record.as_ref().unwrap().is_draft);

    let banner = views.iter().find(|view| view.name == "banner").unwrap();
    assert_eq!(banner.value, "external");
    assert_eq!(banner.source, SourceClass::PersistedOverride);

    // 普通解析看不到草稿
    let value = console.resolve(&ops, "max-items").await.unwrap();
    assert_eq!(value.value.as_int(), Some(10));

    console.promote_draft(&ops, "max-items", TOKEN).await.unwrap();
    let value = console.resolve(&ops, "max-items").await.unwrap();
    assert_eq!(value.value.as_int(), Some(50));
    let record = console.get_override(&ops, "max-items").await.unwrap().unwrap();
    assert!(!record.is_draft);
}

#[tokio::test]
async fn test_storage_failure_is_distinguishable() {
    let store = Arc::new(InMemoryPropertyStore::new());
    let infrastructure = started(store.clone()).await;
    let console = infrastructure.console(AdminScope::Global);

    store.set_available(false);
    let err = console
        .override_property(&Actor::new("ops"), "max-items", "25", TOKEN)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::StorageUnavailable { .. }));
    assert!(err.is_retryable());
    assert_eq!(err.denial_reason(), None);
}

#[tokio::test]
async fn test_module_toggle_and_scoped_routes() {
    let infrastructure = started(Arc::new(InMemoryPropertyStore::new())).await;
    let global = infrastructure.console(AdminScope::Global);
    let team = infrastructure.console(AdminScope::Namespace("team".to_string()));
    let ops = Actor::new("ops");

    assert!(global.list_modules(&ops, false).await.unwrap().is_empty());
    assert_eq!(global.list_modules(&ops, true).await.unwrap().len(), 2);

    assert!(global.enable_module(&ops, "reporting", TOKEN).await.unwrap());
    assert!(!global.enable_module(&ops, "reporting", TOKEN).await.unwrap());

    assert_eq!(global.reachable_routes(&ops).await.unwrap(), vec!["/reports"]);
    assert_eq!(
        team.reachable_routes(&ops).await.unwrap(),
        vec!["/reports", "/team/reports/mine"]
    );

    assert!(team.disable_module(&ops, "reporting", TOKEN).await.unwrap());
    assert!(global.reachable_routes(&ops).await.unwrap().is_empty());

    let err = global
        .enable_module(&ops, "missing", TOKEN)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::UnknownModule { .. }));
}

#[tokio::test]
async fn test_builtin_counters_and_tabs() {
    let infrastructure = started(Arc::new(InMemoryPropertyStore::new())).await;
    let console = infrastructure.console(AdminScope::Global);
    let ops = Actor::new("ops");

    console
        .override_property(&ops, "max-items", "25", TOKEN)
        .await
        .unwrap();

    let samples = console.counters_snapshot(&ops).await.unwrap();
    let names: Vec<_> = samples.iter().map(|sample| sample.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);

    let overrides = samples
        .iter()
        .find(|sample| sample.name == COUNTER_OVERRIDES)
        .unwrap();
    assert_eq!(overrides.global_value, Some(1));
    let index = samples
        .iter()
        .find(|sample| sample.name == COUNTER_UPDATE_INDEX)
        .unwrap();
    assert_eq!(
        index.global_value,
        Some(infrastructure.config().version() as i64)
    );

    // 内置模块未启用时标签页不可见
    assert!(console
        .tab_content(&ops, "admin", "settings")
        .await
        .unwrap()
        .is_none());

    console
        .enable_module(&ops, SITE_ADMIN_MODULE, TOKEN)
        .await
        .unwrap();
    let content = console
        .tab_content(&ops, "admin", "settings")
        .await
        .unwrap()
        .unwrap();
    let properties = content["properties"].as_array().unwrap();
    assert!(properties
        .iter()
        .any(|p| p["name"] == "max-items" && p["value"] == "25" && p["source"] == "persisted_override"));
}
