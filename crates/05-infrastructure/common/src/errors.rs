//! 错误类型定义

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 权限拒绝原因
///
/// 令牌校验失败与管理员检查失败需要区分，便于审计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenialReason {
    /// 当前操作者不是管理员
    NotAdmin,
    /// 当前操作者无权修改该配置项
    PropertyNotModifiable,
    /// 操作令牌校验失败
    InvalidActionToken,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NotAdmin => "非管理员",
            Self::PropertyNotModifiable => "无权修改配置项",
            Self::InvalidActionToken => "操作令牌无效",
        };
        f.write_str(text)
    }
}

/// 错误分类
///
/// 边界层据此区分“无权操作”“输入非法”与“系统不可用”
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// 目标不存在
    NotFound,
    /// 名称或路由冲突
    Conflict,
    /// 权限不足
    Permission,
    /// 值校验失败
    Validation,
    /// 存储不可用
    Storage,
    /// 模块钩子失败
    Module,
}

/// 管理面核心错误类型
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("配置项未注册: {name}")]
    UnknownProperty { name: String },

    #[error("模块未注册: {name}")]
    UnknownModule { name: String },

    #[error("计数器未注册: {name}")]
    UnknownCounter { name: String },

    #[error("{kind} 名称重复: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("权限不足: 操作者 {actor}, 操作 {action}, 原因: {reason}")]
    PermissionDenied {
        actor: String,
        action: String,
        reason: DenialReason,
    },

    #[error("配置存储不可用: {message}")]
    StorageUnavailable { message: String },

    #[error("配置值校验失败: {name}, 原因: {message}")]
    Validation { name: String, message: String },

    #[error("草稿覆盖不存在: {name}")]
    DraftNotFound { name: String },

    #[error("路由冲突: {path} 已被模块 {owner} 占用")]
    RouteConflict { path: String, owner: String },

    #[error("模块钩子执行失败: {module}.{hook}, 原因: {message}")]
    ModuleHookFailed {
        module: String,
        hook: &'static str,
        message: String,
    },
}

impl AdminError {
    /// 创建存储不可用错误
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    /// 创建校验错误
    pub fn validation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// 创建权限拒绝错误
    pub fn permission_denied(
        actor: impl Into<String>,
        action: impl Into<String>,
        reason: DenialReason,
    ) -> Self {
        Self::PermissionDenied {
            actor: actor.into(),
            action: action.into(),
            reason,
        }
    }

    /// 获取错误分类
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownProperty { .. }
            | Self::UnknownModule { .. }
            | Self::UnknownCounter { .. }
            | Self::DraftNotFound { .. } => ErrorCategory::NotFound,
            Self::DuplicateName { .. } | Self::RouteConflict { .. } => ErrorCategory::Conflict,
            Self::PermissionDenied { .. } => ErrorCategory::Permission,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::StorageUnavailable { .. } => ErrorCategory::Storage,
            Self::ModuleHookFailed { .. } => ErrorCategory::Module,
        }
    }

    /// 是否可由调用方重试（仅存储故障）
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }

    /// 权限拒绝原因
    pub fn denial_reason(&self) -> Option<DenialReason> {
        match self {
            Self::PermissionDenied { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// 运行参数加载错误类型
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("运行参数加载失败: {source}")]
    LoadFailed {
        #[from]
        source: config::ConfigError,
    },

    #[error("部署配置文件读取失败: {path}, 原因: {source}")]
    FileReadError {
        path: String,
        source: std::io::Error,
    },

    #[error("部署配置解析失败: {message}")]
    ParseError { message: String },

    #[error("运行参数无效: {field}, 原因: {message}")]
    InvalidValue { field: String, message: String },
}

/// 生命周期管理错误类型
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("非法的生命周期状态转换: {component}, {from:?} -> {to:?}")]
    InvalidTransition {
        component: String,
        from: crate::lifecycle::LifecycleState,
        to: crate::lifecycle::LifecycleState,
    },

    #[error("生命周期管理失败: {message}")]
    LifecycleManagementFailed { message: String },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("管理面错误: {source}")]
    AdminError {
        #[from]
        source: AdminError,
    },

    #[error("运行参数错误: {source}")]
    SettingsError {
        #[from]
        source: SettingsError,
    },

    #[error("生命周期错误: {source}")]
    LifecycleError {
        #[from]
        source: LifecycleError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },

    #[error("基础设施关闭失败: {message}")]
    ShutdownFailed { message: String },
}

/// 结果类型别名
pub type AdminResult<T> = Result<T, AdminError>;
pub type SettingsResult<T> = Result<T, SettingsError>;
pub type LifecycleResult<T> = Result<T, LifecycleError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_distinguish_permission_from_storage() {
        let denied = AdminError::permission_denied("alice", "config_override", DenialReason::NotAdmin);
        let storage = AdminError::storage("timeout");

        assert_eq!(denied.category(), ErrorCategory::Permission);
        assert_eq!(storage.category(), ErrorCategory::Storage);
        assert!(storage.is_retryable());
        assert!(!denied.is_retryable());
    }

    #[test]
    fn test_token_rejection_is_distinct_from_admin_check() {
        let token = AdminError::permission_denied("bob", "module_enable", DenialReason::InvalidActionToken);
        let admin = AdminError::permission_denied("bob", "module_enable", DenialReason::NotAdmin);

        assert_eq!(token.denial_reason(), Some(DenialReason::InvalidActionToken));
        assert_ne!(token.denial_reason(), admin.denial_reason());
    }
}
