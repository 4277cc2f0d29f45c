//! 静态权限检查实现

use async_trait::async_trait;
use config_abstractions::{ActionTokenVerifier, Actor, PermissionGate};
use std::collections::{HashMap, HashSet};

/// 基于固定名单的权限检查
///
/// 管理员可以修改除锁定配置项以外的全部配置项
#[derive(Debug, Clone, Default)]
pub struct StaticPermissionGate {
    admins: HashSet<String>,
    locked_properties: HashSet<String>,
    allow_everyone: bool,
}

impl StaticPermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有操作者都视为管理员
    pub fn allow_all() -> Self {
        Self {
            allow_everyone: true,
            ..Self::default()
        }
    }

    /// 添加管理员
    pub fn with_admin(mut self, id: impl Into<String>) -> Self {
        self.admins.insert(id.into());
        self
    }

    /// 锁定配置项，任何人都不能修改
    pub fn with_locked_property(mut self, name: impl Into<String>) -> Self {
        self.locked_properties.insert(name.into());
        self
    }

    fn admin(&self, actor: &Actor) -> bool {
        self.allow_everyone || self.admins.contains(&actor.id)
    }
}

#[async_trait]
impl PermissionGate for StaticPermissionGate {
    async fn is_admin(&self, actor: &Actor) -> bool {
        self.admin(actor)
    }

    async fn can_modify_property(&self, actor: &Actor, name: &str) -> bool {
        self.admin(actor) && !self.locked_properties.contains(name)
    }
}

/// 基于固定令牌表的操作令牌校验
///
/// 供运维命令行等受信任的本地调用方使用
#[derive(Debug, Clone, Default)]
pub struct StaticActionTokenVerifier {
    tokens: HashMap<String, String>,
    shared_token: Option<String>,
}

impl StaticActionTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为指定操作设置令牌
    pub fn with_token(mut self, action: impl Into<String>, token: impl Into<String>) -> Self {
        self.tokens.insert(action.into(), token.into());
        self
    }

    /// 设置所有操作通用的令牌
    pub fn with_shared_token(mut self, token: impl Into<String>) -> Self {
        self.shared_token = Some(token.into());
        self
    }
}

impl ActionTokenVerifier for StaticActionTokenVerifier {
    fn verify(&self, action: &str, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        match self.tokens.get(action) {
            Some(expected) => expected == token,
            None => self.shared_token.as_deref() == Some(token),
        }
    }
}
