//! 注册表生命周期管理

use crate::errors::{InfrastructureError, LifecycleError};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// 组件生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// 未初始化
    Uninitialized,
    /// 初始化中
    Initializing,
    /// 运行中
    Running,
    /// 停止中
    Stopping,
    /// 已停止
    Stopped,
    /// 错误状态
    Error,
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self::Uninitialized
    }
}

/// 注册表生命周期 trait
///
/// 注册表是显式构造、显式初始化和关闭的对象，而不是隐式全局状态
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// 初始化
    async fn init(&self) -> Result<(), InfrastructureError>;

    /// 关闭
    async fn shutdown(&self) -> Result<(), InfrastructureError>;

    /// 获取生命周期状态
    fn lifecycle_state(&self) -> LifecycleState;

    /// 是否可以初始化
    fn can_init(&self) -> bool {
        matches!(
            self.lifecycle_state(),
            LifecycleState::Uninitialized | LifecycleState::Stopped | LifecycleState::Error
        )
    }

    /// 是否可以关闭
    fn can_shutdown(&self) -> bool {
        matches!(self.lifecycle_state(), LifecycleState::Running)
    }
}

/// 生命周期状态单元
///
/// 注册表内嵌使用，负责校验状态转换
#[derive(Debug)]
pub struct LifecycleCell {
    component: &'static str,
    state: RwLock<LifecycleState>,
}

impl LifecycleCell {
    /// 创建新的状态单元
    pub fn new(component: &'static str) -> Self {
        Self {
            component,
            state: RwLock::new(LifecycleState::Uninitialized),
        }
    }

    /// 当前状态
    pub fn get(&self) -> LifecycleState {
        *self.state.read()
    }

    /// 强制设置状态
    pub fn set(&self, state: LifecycleState) {
        *self.state.write() = state;
    }

    /// 在满足前置状态时转换到目标状态
    pub fn transition(
        &self,
        allowed_from: &[LifecycleState],
        to: LifecycleState,
    ) -> Result<LifecycleState, LifecycleError> {
        let mut state = self.state.write();
        let from = *state;
        if !allowed_from.contains(&from) {
            return Err(LifecycleError::InvalidTransition {
                component: self.component.to_string(),
                from,
                to,
            });
        }
        *state = to;
        Ok(from)
    }
}
