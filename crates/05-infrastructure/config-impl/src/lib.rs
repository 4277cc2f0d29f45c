//! # Configuration Implementation
//!
//! 配置注册表的具体实现。
//!
//! ## 主要组件
//!
//! - [`ConfigRegistry`] - 配置注册表，负责多来源优先级解析、快照和版本
//! - [`EnvironmentValues`] - 部署环境提供的只读配置值
//! - [`InMemoryPropertyStore`] - 内存覆盖记录存储
//! - [`JsonFilePropertyStore`] - JSON 文件覆盖记录存储
//! - [`StaticPermissionGate`] - 基于固定名单的权限检查
//! - [`ConfigEventHandler`] - 配置变更事件分发
//! - [`SnapshotRefresher`] - 快照到期时的后台刷新

pub mod environment;
pub mod event_handler;
pub mod permission;
pub mod refresher;
pub mod registry;
pub mod snapshot;
pub mod store;

pub use environment::*;
pub use event_handler::*;
pub use permission::*;
pub use refresher::*;
pub use registry::*;
pub use snapshot::*;
pub use store::*;
