//! 模块定义

use crate::route::{RouteDescriptor, RouteScope};
use crate::tab::{TabBinding, TabInfo};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// 模块启用和停用钩子
///
/// 钩子失败时模块保持转换前的状态
#[async_trait]
pub trait ModuleHooks: Send + Sync {
    /// 启用时调用，先于路由发布
    async fn on_enable(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// 停用时调用，晚于路由撤回
    async fn on_disable(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// 可插拔模块
#[derive(Clone)]
pub struct Module {
    name: String,
    description: String,
    global_routes: Vec<RouteDescriptor>,
    namespaced_routes: Vec<RouteDescriptor>,
    tabs: Vec<TabBinding>,
    hooks: Option<Arc<dyn ModuleHooks>>,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("global_routes", &self.global_routes)
            .field("namespaced_routes", &self.namespaced_routes)
            .field("tabs", &self.tabs)
            .field("has_hooks", &self.hooks.is_some())
            .finish()
    }
}

impl Module {
    /// 创建新的模块
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            global_routes: Vec::new(),
            namespaced_routes: Vec::new(),
            tabs: Vec::new(),
            hooks: None,
        }
    }

    /// 设置描述
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// 添加全局路由
    pub fn with_global_route(mut self, path: impl Into<String>, handler: impl Into<String>) -> Self {
        self.global_routes.push(RouteDescriptor::new(path, handler));
        self
    }

    /// 添加命名空间路由
    pub fn with_namespaced_route(
        mut self,
        path: impl Into<String>,
        handler: impl Into<String>,
    ) -> Self {
        self.namespaced_routes
            .push(RouteDescriptor::new(path, handler));
        self
    }

    /// 添加标签页绑定
    pub fn with_tab(mut self, tab: TabBinding) -> Self {
        self.tabs.push(tab);
        self
    }

    /// 设置钩子
    pub fn with_hooks(mut self, hooks: Arc<dyn ModuleHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn global_routes(&self) -> &[RouteDescriptor] {
        &self.global_routes
    }

    pub fn namespaced_routes(&self) -> &[RouteDescriptor] {
        &self.namespaced_routes
    }

    pub fn tabs(&self) -> &[TabBinding] {
        &self.tabs
    }

    pub fn hooks(&self) -> Option<&Arc<dyn ModuleHooks>> {
        self.hooks.as_ref()
    }

    /// 全部路由及其作用域，全局路由在前
    pub fn route_entries(&self) -> Vec<(RouteScope, RouteDescriptor)> {
        self.global_routes
            .iter()
            .map(|route| (RouteScope::Global, route.clone()))
            .chain(
                self.namespaced_routes
                    .iter()
                    .map(|route| (RouteScope::Namespaced, route.clone())),
            )
            .collect()
    }

    /// 导出列表展示用的描述信息
    pub fn info(&self, enabled: bool) -> ModuleInfo {
        let mut global_routes = self.global_routes.clone();
        global_routes.sort_by(|a, b| a.path.cmp(&b.path));
        let mut namespaced_routes = self.namespaced_routes.clone();
        namespaced_routes.sort_by(|a, b| a.path.cmp(&b.path));

        ModuleInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            enabled,
            global_routes,
            namespaced_routes,
            tabs: self.tabs.iter().map(TabBinding::info).collect(),
        }
    }
}

/// 模块描述信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    /// 按路径排序的全局路由
    pub global_routes: Vec<RouteDescriptor>,
    /// 按路径排序的命名空间路由
    pub namespaced_routes: Vec<RouteDescriptor>,
    pub tabs: Vec<TabInfo>,
}
