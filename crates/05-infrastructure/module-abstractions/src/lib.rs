//! # Module Abstractions
//!
//! 可插拔模块的抽象接口。模块在启用时发布路由和标签页绑定，停用时撤回。
//!
//! ## 核心接口
//!
//! - [`Module`] - 模块定义
//! - [`ModuleHooks`] - 启用和停用钩子
//! - [`TabBinding`] - 标签页绑定
//! - [`ModuleRegistry`] - 模块注册表接口

pub mod module;
pub mod registry;
pub mod route;
pub mod tab;

pub use module::*;
pub use registry::*;
pub use route::*;
pub use tab::*;
