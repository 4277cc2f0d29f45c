//! 管理控制台边界适配器
//!
//! 全局控制台和命名空间控制台共享同一组注册表，只在路由展示上不同。
//! 所有读操作要求管理员身份；写操作先校验操作令牌，再校验管理员身份，
//! 配置项级别的权限由配置注册表自己检查。

use config_abstractions::{
    actions, ActionTokenVerifier, Actor, EffectiveValue, OverrideRecord, PermissionGate,
    SourceClass,
};
use config_impl::ConfigRegistry;
use infrastructure_common::{AdminError, AdminResult, CounterRegistry, CounterSample, DenialReason};
use module_abstractions::{ModuleInfo, ModuleRegistry, RouteScope};
use module_impl::ModuleRegistryImpl;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// 控制台作用域
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AdminScope {
    /// 全站管理
    Global,
    /// 某个命名空间内的管理
    Namespace(String),
}

impl fmt::Display for AdminScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Namespace(ns) => write!(f, "namespace:{}", ns),
        }
    }
}

/// 配置项列表中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyView {
    pub name: String,
    pub value_type: String,
    pub default_value: String,
    pub value: String,
    pub source: SourceClass,
    pub doc_string: String,
    pub requires_restart: bool,
    /// 当前的覆盖记录，包括草稿
    pub override_record: Option<OverrideRecord>,
}

/// 管理控制台
#[derive(Clone)]
pub struct AdminConsole {
    scope: AdminScope,
    config: Arc<ConfigRegistry>,
    modules: Arc<ModuleRegistryImpl>,
    counters: Arc<CounterRegistry>,
    gate: Arc<dyn PermissionGate>,
    verifier: Arc<dyn ActionTokenVerifier>,
}

impl fmt::Debug for AdminConsole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConsole")
            .field("scope", &self.scope)
            .field("config_version", &self.config.version())
            .finish()
    }
}

impl AdminConsole {
    pub fn new(
        scope: AdminScope,
        config: Arc<ConfigRegistry>,
        modules: Arc<ModuleRegistryImpl>,
        counters: Arc<CounterRegistry>,
        gate: Arc<dyn PermissionGate>,
        verifier: Arc<dyn ActionTokenVerifier>,
    ) -> Self {
        Self {
            scope,
            config,
            modules,
            counters,
            gate,
            verifier,
        }
    }

    pub fn scope(&self) -> &AdminScope {
        &self.scope
    }

    async fn require_admin(&self, actor: &Actor, action: &str) -> AdminResult<()> {
        if self.gate.is_admin(actor).await {
            Ok(())
        } else {
            warn!("[{}] 非管理员请求被拒绝: {} {}", self.scope, actor, action);
            Err(AdminError::permission_denied(
                actor.id.clone(),
                action,
                DenialReason::NotAdmin,
            ))
        }
    }

    /// 写操作的前置检查：先令牌，后管理员身份
    async fn authorize_write(&self, actor: &Actor, action: &str, token: &str) -> AdminResult<()> {
        if !self.verifier.verify(action, token) {
            warn!("[{}] 操作令牌无效: {} {}", self.scope, actor, action);
            return Err(AdminError::permission_denied(
                actor.id.clone(),
                action,
                DenialReason::InvalidActionToken,
            ));
        }
        self.require_admin(actor, action).await
    }

    /// 列出全部配置项
    ///
    /// 展示前强制刷新，草稿值对管理员可见
    pub async fn list_properties(&self, actor: &Actor) -> AdminResult<Vec<PropertyView>> {
        self.require_admin(actor, "list_properties").await?;
        self.config.refresh(true).await?;

        let snapshot = self.config.snapshot();
        let mut views = Vec::new();
        for property in self.config.properties() {
            let effective = self.config.resolve_including_drafts(property.name())?;
            views.push(PropertyView {
                name: property.name().to_string(),
                value_type: property.value_type().as_str().to_string(),
                default_value: property.default_value().to_raw(),
                value: effective.value.to_raw(),
                source: effective.source,
                doc_string: property.doc_string().to_string(),
                requires_restart: property.requires_restart(),
                override_record: snapshot.get(property.name()).cloned(),
            });
        }
        Ok(views)
    }

    /// 解析单个配置项，不包含草稿
    pub async fn resolve(
        &self,
        actor: &Actor,
        name: &str,
    ) -> AdminResult<EffectiveValue> {
        self.require_admin(actor, "resolve").await?;
        self.config.resolve(name)
    }

    /// 解析全部配置项，按名称排序
    pub async fn resolve_all(
        &self,
        actor: &Actor,
    ) -> AdminResult<Vec<(String, EffectiveValue)>> {
        self.require_admin(actor, "resolve_all").await?;
        Ok(self.config.resolve_all())
    }

    /// 覆盖快照的年龄（秒）
    pub async fn age_seconds(&self, actor: &Actor) -> AdminResult<i64> {
        self.require_admin(actor, "age_seconds").await?;
        Ok(self.config.age_seconds())
    }

    /// 读取配置项当前的覆盖记录
    pub async fn get_override(
        &self,
        actor: &Actor,
        name: &str,
    ) -> AdminResult<Option<OverrideRecord>> {
        self.require_admin(actor, "get_override").await?;
        self.config.refresh(true).await?;
        self.config.get_override(name)
    }

    pub async fn list_modules(
        &self,
        actor: &Actor,
        include_disabled: bool,
    ) -> AdminResult<Vec<ModuleInfo>> {
        self.require_admin(actor, "list_modules").await?;
        Ok(self.modules.list_registered(include_disabled))
    }

    /// 当前作用域下可达的路由
    ///
    /// 全局作用域只包含全局路由；命名空间作用域额外包含带前缀的命名空间路由
    pub async fn reachable_routes(&self, actor: &Actor) -> AdminResult<Vec<String>> {
        self.require_admin(actor, "reachable_routes").await?;

        let mut paths: Vec<String> = self
            .modules
            .routes(RouteScope::Global)
            .into_iter()
            .map(|route| route.path)
            .collect();
        if let AdminScope::Namespace(ns) = &self.scope {
            paths.extend(
                self.modules
                    .routes(RouteScope::Namespaced)
                    .into_iter()
                    .map(|route| format!("/{}{}", ns, route.path)),
            );
        }
        paths.sort();
        Ok(paths)
    }

    pub async fn counters_snapshot(&self, actor: &Actor) -> AdminResult<Vec<CounterSample>> {
        self.require_admin(actor, "counters_snapshot").await?;
        Ok(self.counters.snapshot())
    }

    /// 渲染标签页内容，标签页不存在或没有内容回调时返回 `None`
    pub async fn tab_content(
        &self,
        actor: &Actor,
        group: &str,
        key: &str,
    ) -> AdminResult<Option<serde_json::Value>> {
        self.require_admin(actor, "tab_content").await?;
        Ok(self.modules.tab(group, key).and_then(|tab| tab.render()))
    }

    /// 写入生效覆盖值，返回新版本号
    pub async fn override_property(
        &self,
        actor: &Actor,
        name: &str,
        raw_value: &str,
        token: &str,
    ) -> AdminResult<u64> {
        self.authorize_write(actor, actions::CONFIG_OVERRIDE, token)
            .await?;
        let value = self.config.parse_input(name, raw_value)?;
        let version = self.config.override_property(name, value, actor).await?;
        info!("[{}] {} 覆盖配置项 {}", self.scope, actor, name);
        Ok(version)
    }

    /// 暂存草稿，返回新版本号
    pub async fn save_draft(
        &self,
        actor: &Actor,
        name: &str,
        raw_value: &str,
        token: &str,
    ) -> AdminResult<u64> {
        self.authorize_write(actor, actions::CONFIG_SAVE_DRAFT, token)
            .await?;
        let value = self.config.parse_input(name, raw_value)?;
        self.config.save_draft(name, value, actor).await
    }

    pub async fn reset_property(&self, actor: &Actor, name: &str, token: &str) -> AdminResult<u64> {
        self.authorize_write(actor, actions::CONFIG_RESET, token)
            .await?;
        self.config.reset(name, actor).await
    }

    pub async fn promote_draft(&self, actor: &Actor, name: &str, token: &str) -> AdminResult<u64> {
        self.authorize_write(actor, actions::CONFIG_PROMOTE_DRAFT, token)
            .await?;
        self.config.promote_draft(name, actor).await
    }

    /// 启用模块，返回是否发生了状态转换
    pub async fn enable_module(&self, actor: &Actor, name: &str, token: &str) -> AdminResult<bool> {
        self.authorize_write(actor, actions::MODULE_ENABLE, token)
            .await?;
        let changed = self.modules.enable(name).await?;
        if changed {
            info!("[{}] {} 启用模块 {}", self.scope, actor, name);
        }
        Ok(changed)
    }

    /// 停用模块，返回是否发生了状态转换
    pub async fn disable_module(&self, actor: &Actor, name: &str, token: &str) -> AdminResult<bool> {
        self.authorize_write(actor, actions::MODULE_DISABLE, token)
            .await?;
        let changed = self.modules.disable(name).await?;
        if changed {
            info!("[{}] {} 停用模块 {}", self.scope, actor, name);
        }
        Ok(changed)
    }
}
