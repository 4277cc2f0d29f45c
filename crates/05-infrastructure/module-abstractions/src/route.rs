//! 路由描述

use serde::{Deserialize, Serialize};
use std::fmt;

/// 路由作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteScope {
    /// 与租户无关的全局路由
    Global,
    /// 每个命名空间各自挂载的路由
    Namespaced,
}

impl fmt::Display for RouteScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Namespaced => f.write_str("namespaced"),
        }
    }
}

/// 路由描述
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// 路径
    pub path: String,
    /// 处理器标识，由外部路由层解释
    pub handler: String,
}

impl RouteDescriptor {
    pub fn new(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            handler: handler.into(),
        }
    }
}

/// 已发布到路由表的路由
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedRoute {
    /// 作用域
    pub scope: RouteScope,
    /// 路径
    pub path: String,
    /// 处理器标识
    pub handler: String,
    /// 所属模块
    pub module: String,
}
