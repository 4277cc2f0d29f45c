//! 配置变更事件定义

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 配置变更事件
///
/// 每次成功的变更都会携带变更后的版本号，订阅方据此失效自身缓存
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigChangeEvent {
    /// 事件标识
    pub id: uuid::Uuid,
    /// 事件类型
    pub event_type: ConfigChangeEventType,
    /// 配置项名称（刷新事件为空）
    pub name: Option<String>,
    /// 旧值
    pub old_value: Option<String>,
    /// 新值
    pub new_value: Option<String>,
    /// 变更后的版本号
    pub version: u64,
    /// 操作者
    pub actor: Option<String>,
    /// 事件时间
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// 额外元数据
    pub metadata: HashMap<String, String>,
}

impl ConfigChangeEvent {
    fn new(event_type: ConfigChangeEventType, version: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            event_type,
            name: None,
            old_value: None,
            new_value: None,
            version,
            actor: None,
            timestamp: chrono::Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// 创建覆盖写入事件
    pub fn overridden(
        name: impl Into<String>,
        old_value: Option<String>,
        new_value: impl Into<String>,
        actor: impl Into<String>,
        version: u64,
    ) -> Self {
        let mut event = Self::new(ConfigChangeEventType::Overridden, version);
        event.name = Some(name.into());
        event.old_value = old_value;
        event.new_value = Some(new_value.into());
        event.actor = Some(actor.into());
        event
    }

    /// 创建草稿暂存事件
    pub fn draft_saved(
        name: impl Into<String>,
        new_value: impl Into<String>,
        actor: impl Into<String>,
        version: u64,
    ) -> Self {
        let mut event = Self::new(ConfigChangeEventType::DraftSaved, version);
        event.name = Some(name.into());
        event.new_value = Some(new_value.into());
        event.actor = Some(actor.into());
        event
    }

    /// 创建草稿提升事件
    pub fn draft_promoted(
        name: impl Into<String>,
        value: impl Into<String>,
        actor: impl Into<String>,
        version: u64,
    ) -> Self {
        let mut event = Self::new(ConfigChangeEventType::DraftPromoted, version);
        event.name = Some(name.into());
        event.new_value = Some(value.into());
        event.actor = Some(actor.into());
        event
    }

    /// 创建覆盖重置事件
    pub fn reset(
        name: impl Into<String>,
        old_value: Option<String>,
        actor: impl Into<String>,
        version: u64,
    ) -> Self {
        let mut event = Self::new(ConfigChangeEventType::Reset, version);
        event.name = Some(name.into());
        event.old_value = old_value;
        event.actor = Some(actor.into());
        event
    }

    /// 创建快照刷新事件
    pub fn refreshed(version: u64, override_count: usize) -> Self {
        Self::new(ConfigChangeEventType::Refreshed, version)
            .with_metadata("override_count", override_count.to_string())
    }

    /// 添加元数据
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// 配置变更事件类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ConfigChangeEventType {
    /// 写入生效覆盖
    Overridden,
    /// 暂存草稿
    DraftSaved,
    /// 草稿提升为生效覆盖
    DraftPromoted,
    /// 删除覆盖
    Reset,
    /// 从存储重新加载快照
    Refreshed,
}

/// 配置事件监听器 trait
pub trait ConfigEventListener: Send + Sync {
    /// 处理配置变更事件
    fn on_config_changed(&self, event: &ConfigChangeEvent);

    /// 获取监听器名称
    fn name(&self) -> &str;

    /// 是否启用
    fn is_enabled(&self) -> bool {
        true
    }

    /// 获取感兴趣的事件类型，空列表表示全部
    fn interested_event_types(&self) -> Vec<ConfigChangeEventType> {
        Vec::new()
    }
}
