//! 内置管理模块与内置计数器

use chrono::{DateTime, Utc};
use config_impl::ConfigRegistry;
use infrastructure_common::{AdminResult, CounterRegistry, GlobalValueProvider};
use module_abstractions::{Module, TabBinding};
use serde_json::json;
use std::sync::Arc;

/// 内置管理模块名称
pub const SITE_ADMIN_MODULE: &str = "site-admin";

/// 管理控制台标签页分组
pub const ADMIN_TAB_GROUP: &str = "admin";

pub const COUNTER_UPTIME: &str = "admin-uptime-sec";
pub const COUNTER_OVERRIDES: &str = "config-overrides";
pub const COUNTER_CONFIG_AGE: &str = "config-age-sec";
pub const COUNTER_UPDATE_TIME: &str = "config-update-time-sec";
pub const COUNTER_UPDATE_INDEX: &str = "config-update-index";

/// 构建内置管理模块
///
/// 标签页内容在渲染时读取注册表，反映当时的状态
pub fn site_admin_module(config: Arc<ConfigRegistry>, counters: Arc<CounterRegistry>) -> Module {
    let settings_config = config.clone();
    let settings = TabBinding::new(ADMIN_TAB_GROUP, "settings", "Settings").with_content(
        move || {
            let properties: Vec<_> = settings_config
                .resolve_all_including_drafts()
                .into_iter()
                .map(|(name, effective)| {
                    json!({
                        "name": name,
                        "value": effective.value.to_raw(),
                        "source": effective.source,
                    })
                })
                .collect();
            json!({
                "version": settings_config.version(),
                "age_seconds": settings_config.age_seconds(),
                "properties": properties,
            })
        },
    );

    let perf = TabBinding::new(ADMIN_TAB_GROUP, "perf", "Performance").with_content(move || {
        let samples: Vec<_> = counters
            .snapshot()
            .into_iter()
            .map(|sample| {
                json!({
                    "name": sample.name,
                    "local": sample.local_value,
                    "global": sample.global_value,
                })
            })
            .collect();
        json!({ "counters": samples })
    });

    let deployment =
        TabBinding::new(ADMIN_TAB_GROUP, "deployment", "Deployment").with_content(move || {
            let mut names: Vec<&str> = config.environment().names().collect();
            names.sort_unstable();
            json!({
                "environment_values": names,
                "staleness_threshold_secs": config.staleness_threshold_secs(),
                "last_refreshed_at": config.last_refreshed_at(),
            })
        });

    Module::new(SITE_ADMIN_MODULE)
        .with_description("Site administration console")
        .with_global_route("/admin", "admin.console")
        .with_global_route("/admin/welcome", "admin.welcome")
        .with_global_route("/rest/config/item", "admin.config_item")
        .with_namespaced_route("/dashboard", "admin.dashboard")
        .with_tab(settings)
        .with_tab(perf)
        .with_tab(deployment)
}

/// 注册内置计数器，值在读取时计算
pub fn register_builtin_counters(
    counters: &CounterRegistry,
    config: Arc<ConfigRegistry>,
    started_at: DateTime<Utc>,
) -> AdminResult<()> {
    let uptime: GlobalValueProvider =
        Arc::new(move || Some((Utc::now() - started_at).num_seconds()));

    let overrides_config = config.clone();
    let overrides: GlobalValueProvider =
        Arc::new(move || i64::try_from(overrides_config.active_override_count()).ok());

    let age_config = config.clone();
    let age: GlobalValueProvider = Arc::new(move || Some(age_config.age_seconds()));

    let time_config = config.clone();
    let update_time: GlobalValueProvider = Arc::new(move || {
        Some(
            time_config
                .last_refreshed_at()
                .map(|at| at.timestamp())
                .unwrap_or(0),
        )
    });

    let update_index: GlobalValueProvider =
        Arc::new(move || i64::try_from(config.version()).ok());

    counters.register(COUNTER_UPTIME, Some(uptime))?;
    counters.register(COUNTER_OVERRIDES, Some(overrides))?;
    counters.register(COUNTER_CONFIG_AGE, Some(age))?;
    counters.register(COUNTER_UPDATE_TIME, Some(update_time))?;
    counters.register(COUNTER_UPDATE_INDEX, Some(update_index))?;
    Ok(())
}
