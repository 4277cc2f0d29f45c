//! 权限检查抽象接口

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 操作者
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// 操作者标识（通常为登录邮箱）
    pub id: String,
}

impl Actor {
    /// 创建新的操作者
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// 权限检查 trait
///
/// 角色查询由外部系统提供，这里只消费布尔结果
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// 是否为管理员
    async fn is_admin(&self, actor: &Actor) -> bool;

    /// 是否可以修改指定配置项
    async fn can_modify_property(&self, actor: &Actor, name: &str) -> bool;
}

/// 操作令牌校验 trait
///
/// 所有写操作进入注册表之前都必须先通过令牌校验
pub trait ActionTokenVerifier: Send + Sync {
    /// 校验指定操作的令牌
    fn verify(&self, action: &str, token: &str) -> bool;
}

/// 写操作名称，用于令牌校验和审计
pub mod actions {
    pub const CONFIG_OVERRIDE: &str = "config_override";
    pub const CONFIG_SAVE_DRAFT: &str = "config_save_draft";
    pub const CONFIG_PROMOTE_DRAFT: &str = "config_promote_draft";
    pub const CONFIG_RESET: &str = "config_reset";
    pub const MODULE_ENABLE: &str = "module_enable";
    pub const MODULE_DISABLE: &str = "module_disable";
}
