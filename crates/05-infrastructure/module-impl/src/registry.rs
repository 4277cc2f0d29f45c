//! 模块注册表实现

use crate::route_table::RouteTable;
use crate::tab_table::TabTable;
use async_trait::async_trait;
use infrastructure_common::{
    AdminError, AdminResult, InfrastructureError, Lifecycle, LifecycleCell, LifecycleState,
};
use module_abstractions::{
    Module, ModuleInfo, ModuleRegistry, PublishedRoute, RouteScope, TabBinding,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// 已注册模块及其状态
struct ModuleEntry {
    module: Module,
    enabled: AtomicBool,
    /// 同一模块的启用和停用互斥
    transition: Mutex<()>,
}

impl ModuleEntry {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

fn hook_failed(module: &str, hook: &'static str, source: &anyhow::Error) -> AdminError {
    AdminError::ModuleHookFailed {
        module: module.to_string(),
        hook,
        message: format!("{:#}", source),
    }
}

/// 模块注册表实现
///
/// 启用顺序：钩子、路由、标签页；停用顺序相反。
/// 不同模块的转换可以并发进行，路由冲突由路由表在发布时原子检查。
pub struct ModuleRegistryImpl {
    modules: RwLock<BTreeMap<String, Arc<ModuleEntry>>>,
    routes: RouteTable,
    tabs: TabTable,
    lifecycle: LifecycleCell,
}

impl std::fmt::Debug for ModuleRegistryImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistryImpl")
            .field("modules", &self.modules.read().keys().collect::<Vec<_>>())
            .field("routes", &self.routes.len())
            .field("lifecycle", &self.lifecycle.get())
            .finish()
    }
}

impl ModuleRegistryImpl {
    /// 创建新的模块注册表
    pub fn new() -> Self {
        Self {
            modules: RwLock::new(BTreeMap::new()),
            routes: RouteTable::new(),
            tabs: TabTable::new(),
            lifecycle: LifecycleCell::new("ModuleRegistry"),
        }
    }

    fn entry(&self, name: &str) -> AdminResult<Arc<ModuleEntry>> {
        self.modules
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| AdminError::UnknownModule {
                name: name.to_string(),
            })
    }

    /// 获取模块定义
    pub fn module(&self, name: &str) -> Option<Module> {
        self.modules
            .read()
            .get(name)
            .map(|entry| entry.module.clone())
    }

    /// 已启用模块的名称
    pub fn enabled_names(&self) -> Vec<String> {
        self.modules
            .read()
            .iter()
            .filter(|(_, entry)| entry.is_enabled())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// 已发布标签页的分组
    pub fn tab_groups(&self) -> Vec<String> {
        self.tabs.groups()
    }

    /// 钩子已经成功但发布失败时，撤销启用的副作用
    async fn compensate_enable(&self, module: &Module) {
        if let Some(hooks) = module.hooks() {
            if let Err(e) = hooks.on_disable().await {
                error!("模块 {} 启用回滚时 on_disable 失败: {:#}", module.name(), e);
            }
        }
    }
}

impl Default for ModuleRegistryImpl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModuleRegistry for ModuleRegistryImpl {
    fn register(&self, module: Module) -> AdminResult<()> {
        let mut seen = HashSet::new();
        for (scope, route) in module.route_entries() {
            if !seen.insert((scope, route.path.clone())) {
                return Err(AdminError::RouteConflict {
                    path: route.path,
                    owner: module.name().to_string(),
                });
            }
        }
        let mut seen_tabs = HashSet::new();
        for tab in module.tabs() {
            if !seen_tabs.insert((tab.group(), tab.key())) {
                return Err(AdminError::DuplicateName {
                    kind: "tab",
                    name: format!("{}/{}", tab.group(), tab.key()),
                });
            }
        }

        let mut modules = self.modules.write();
        if modules.contains_key(module.name()) {
            return Err(AdminError::DuplicateName {
                kind: "module",
                name: module.name().to_string(),
            });
        }

        info!(
            "注册模块: {} (全局路由 {}, 命名空间路由 {}, 标签页 {})",
            module.name(),
            module.global_routes().len(),
            module.namespaced_routes().len(),
            module.tabs().len()
        );
        modules.insert(
            module.name().to_string(),
            Arc::new(ModuleEntry {
                module,
                enabled: AtomicBool::new(false),
                transition: Mutex::new(()),
            }),
        );
        Ok(())
    }

    async fn enable(&self, name: &str) -> AdminResult<bool> {
        let entry = self.entry(name)?;
        let _guard = entry.transition.lock().await;
        if entry.is_enabled() {
            debug!("模块已启用: {}", name);
            return Ok(false);
        }

        let module = &entry.module;
        let routes = module.route_entries();
        self.routes.check_available(name, &routes)?;
        self.tabs.check_available(name, module.tabs())?;

        if let Some(hooks) = module.hooks() {
            hooks
                .on_enable()
                .await
                .map_err(|e| hook_failed(name, "on_enable", &e))?;
        }

        if let Err(e) = self.routes.publish(name, &routes) {
            warn!("模块 {} 路由发布失败: {}", name, e);
            self.compensate_enable(module).await;
            return Err(e);
        }
        if let Err(e) = self.tabs.publish(name, module.tabs()) {
            warn!("模块 {} 标签页发布失败: {}", name, e);
            self.routes.unpublish(name);
            self.compensate_enable(module).await;
            return Err(e);
        }

        entry.enabled.store(true, Ordering::SeqCst);
        info!(
            "模块已启用: {} (路由 {}, 标签页 {})",
            name,
            routes.len(),
            module.tabs().len()
        );
        Ok(true)
    }

    async fn disable(&self, name: &str) -> AdminResult<bool> {
        let entry = self.entry(name)?;
        let _guard = entry.transition.lock().await;
        if !entry.is_enabled() {
            debug!("模块已停用: {}", name);
            return Ok(false);
        }

        // 钩子返回前路径仍归本模块所有，失败时可以原样恢复
        let module = &entry.module;
        self.tabs.withdraw(name);
        self.routes.withdraw(name);

        if let Some(hooks) = module.hooks() {
            if let Err(e) = hooks.on_disable().await {
                warn!("模块 {} on_disable 失败，恢复路由和标签页: {:#}", name, e);
                self.routes.restore(name);
                self.tabs.restore(name);
                return Err(hook_failed(name, "on_disable", &e));
            }
        }

        let removed_routes = self.routes.release(name);
        let removed_tabs = self.tabs.release(name);
        entry.enabled.store(false, Ordering::SeqCst);
        info!(
            "模块已停用: {} (撤回路由 {}, 标签页 {})",
            name, removed_routes, removed_tabs
        );
        Ok(true)
    }

    fn list_registered(&self, include_disabled: bool) -> Vec<ModuleInfo> {
        self.modules
            .read()
            .values()
            .filter(|entry| include_disabled || entry.is_enabled())
            .map(|entry| entry.module.info(entry.is_enabled()))
            .collect()
    }

    fn is_enabled(&self, name: &str) -> AdminResult<bool> {
        Ok(self.entry(name)?.is_enabled())
    }

    fn route_owner(&self, scope: RouteScope, path: &str) -> Option<String> {
        self.routes.owner(scope, path)
    }

    fn routes(&self, scope: RouteScope) -> Vec<PublishedRoute> {
        self.routes.routes(scope)
    }

    fn tabs(&self, group: &str) -> Vec<TabBinding> {
        self.tabs.tabs(group)
    }

    fn tab(&self, group: &str, key: &str) -> Option<TabBinding> {
        self.tabs.tab(group, key)
    }
}

#[async_trait]
impl Lifecycle for ModuleRegistryImpl {
    async fn init(&self) -> Result<(), InfrastructureError> {
        self.lifecycle.transition(
            &[
                LifecycleState::Uninitialized,
                LifecycleState::Stopped,
                LifecycleState::Error,
            ],
            LifecycleState::Running,
        )?;
        info!("模块注册表已就绪: {} 个模块", self.modules.read().len());
        Ok(())
    }

    /// 按名称逆序停用所有已启用模块，使其钩子得以执行
    async fn shutdown(&self) -> Result<(), InfrastructureError> {
        self.lifecycle
            .transition(&[LifecycleState::Running], LifecycleState::Stopping)?;

        let mut failures = Vec::new();
        for name in self.enabled_names().into_iter().rev() {
            if let Err(e) = ModuleRegistry::disable(self, &name).await {
                error!("关闭时停用模块 {} 失败: {}", name, e);
                failures.push(name);
            }
        }

        if failures.is_empty() {
            self.lifecycle.set(LifecycleState::Stopped);
            info!("模块注册表已关闭");
            Ok(())
        } else {
            self.lifecycle.set(LifecycleState::Error);
            Err(InfrastructureError::ShutdownFailed {
                message: format!("以下模块停用失败: {}", failures.join(", ")),
            })
        }
    }

    fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.get()
    }
}
