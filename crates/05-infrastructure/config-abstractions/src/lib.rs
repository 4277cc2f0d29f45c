//! # Configuration Abstractions
//!
//! 配置注册表抽象层，定义配置项数据模型和外部协作者接口。
//!
//! ## 核心接口
//!
//! - [`ConfigProperty`] - 配置项定义
//! - [`PropertyStore`] - 覆盖记录存储接口
//! - [`PermissionGate`] - 权限检查接口
//! - [`ActionTokenVerifier`] - 操作令牌校验接口
//! - [`PropertyValidator`] - 配置值验证接口
//! - [`ConfigEventListener`] - 配置变更监听接口

pub mod events;
pub mod permission;
pub mod property;
pub mod store;
pub mod validator;

pub use events::*;
pub use permission::*;
pub use property::*;
pub use store::*;
pub use validator::*;
