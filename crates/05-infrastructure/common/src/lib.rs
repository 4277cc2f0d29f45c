//! # Infrastructure Common
//!
//! 这个 crate 提供了管理面基础设施层的公共类型和工具。
//!
//! ## 核心组件
//!
//! - [`AdminError`] - 管理面错误分类
//! - [`Lifecycle`] - 注册表生命周期管理
//! - [`CounterRegistry`] - 进程内性能计数器
//!
//! ## 设计原则
//!
//! - 注册表显式构造、显式注入，不依赖隐式全局状态
//! - 异步优先的设计理念
//! - 错误按类别区分，权限、校验和存储故障互不混淆

pub mod counters;
pub mod errors;
pub mod lifecycle;

pub use counters::*;
pub use errors::*;
pub use lifecycle::*;
