//! # 模块注册表实现
//!
//! 提供模块注册表以及路由表和标签页表这两张旁表

pub mod registry;
pub mod route_table;
pub mod tab_table;

pub use registry::*;
pub use route_table::*;
pub use tab_table::*;
