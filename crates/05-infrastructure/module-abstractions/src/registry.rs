//! 模块注册表抽象接口

use crate::module::{Module, ModuleInfo};
use crate::route::{PublishedRoute, RouteScope};
use crate::tab::TabBinding;
use async_trait::async_trait;
use infrastructure_common::AdminResult;

/// 模块注册表 trait
///
/// 已发布的路由和标签页始终恰好等于已启用模块的路由和标签页
#[async_trait]
pub trait ModuleRegistry: Send + Sync {
    /// 注册模块，注册后默认停用
    fn register(&self, module: Module) -> AdminResult<()>;

    /// 启用模块，返回状态是否发生变化
    async fn enable(&self, name: &str) -> AdminResult<bool>;

    /// 停用模块，返回状态是否发生变化
    async fn disable(&self, name: &str) -> AdminResult<bool>;

    /// 按名称排序的模块列表
    fn list_registered(&self, include_disabled: bool) -> Vec<ModuleInfo>;

    /// 模块是否已启用
    fn is_enabled(&self, name: &str) -> AdminResult<bool>;

    /// 路由当前所属的模块，路由不可达时返回 `None`
    fn route_owner(&self, scope: RouteScope, path: &str) -> Option<String>;

    /// 按路径排序的已发布路由
    fn routes(&self, scope: RouteScope) -> Vec<PublishedRoute>;

    /// 分组内按注册顺序排列的标签页
    fn tabs(&self, group: &str) -> Vec<TabBinding>;

    /// 查找标签页
    fn tab(&self, group: &str, key: &str) -> Option<TabBinding>;
}
