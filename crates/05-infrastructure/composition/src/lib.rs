//! # 管理基础设施组合层
//!
//! 将配置注册表、模块注册表和计数器注册表组合成一个可运行的管理面。
//!
//! ## 主要功能
//!
//! - **运行参数**: 从 TOML 文件和 `ADMIN__` 环境变量加载 [`AdminSettings`]
//! - **基础设施构建器**: 使用构建者模式组装各注册表和协作者
//! - **管理控制台**: 全局和命名空间两种作用域的 [`AdminConsole`]
//! - **生命周期管理**: 统一启动和关闭各注册表
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use config_abstractions::{Actor, ConfigProperty};
//! use config_impl::{StaticActionTokenVerifier, StaticPermissionGate};
//! use infrastructure_composition::{AdminInfrastructure, AdminScope};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let infrastructure = AdminInfrastructure::builder()
//!         .with_property(ConfigProperty::integer("max-items", 10, "Items per page"))
//!         .with_permission_gate(Arc::new(StaticPermissionGate::new().with_admin("ops")))
//!         .with_token_verifier(Arc::new(StaticActionTokenVerifier::new().with_shared_token("t")))
//!         .build()
//!         .await?;
//!     infrastructure.start().await?;
//!
//!     let console = infrastructure.console(AdminScope::Global);
//!     let ops = Actor::new("ops");
//!     console.override_property(&ops, "max-items", "25", "t").await?;
//!     println!("{:?}", console.resolve(&ops, "max-items").await?);
//!
//!     infrastructure.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod builtin;
pub mod console;
pub mod infrastructure;
pub mod logging;
pub mod settings;

pub use builder::AdminInfrastructureBuilder;
pub use builtin::{
    register_builtin_counters, site_admin_module, ADMIN_TAB_GROUP, COUNTER_CONFIG_AGE,
    COUNTER_OVERRIDES, COUNTER_UPDATE_INDEX, COUNTER_UPDATE_TIME, COUNTER_UPTIME,
    SITE_ADMIN_MODULE,
};
pub use console::{AdminConsole, AdminScope, PropertyView};
pub use infrastructure::{AdminInfrastructure, InfrastructureMetrics, InfrastructureStatus};
pub use logging::{init_logging, LoggingConfig};
pub use settings::{
    AdminSettings, EnvironmentSettings, LoggingSettings, ModuleSettings, StoreKind,
    StoreSettings, SETTINGS_ENV_PREFIX,
};

#[cfg(test)]
mod tests;
