//! 进程内性能计数器

use crate::errors::{AdminError, AdminResult};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 全局值提供者
///
/// 返回跨实例聚合后的值，`None` 表示暂不可用
pub type GlobalValueProvider = Arc<dyn Fn() -> Option<i64> + Send + Sync>;

/// 性能计数器
pub struct Counter {
    name: String,
    local_value: AtomicI64,
    global_value: Option<GlobalValueProvider>,
}

impl std::fmt::Debug for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counter")
            .field("name", &self.name)
            .field("local_value", &self.local_value())
            .field("has_global_value", &self.global_value.is_some())
            .finish()
    }
}

impl Counter {
    fn new(name: String, global_value: Option<GlobalValueProvider>) -> Self {
        Self {
            name,
            local_value: AtomicI64::new(0),
            global_value,
        }
    }

    /// 计数器名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 进程内计数值
    pub fn local_value(&self) -> i64 {
        self.local_value.load(Ordering::Relaxed)
    }

    /// 全局计数值
    pub fn global_value(&self) -> Option<i64> {
        self.global_value.as_ref().and_then(|provider| provider())
    }

    /// 计数加一
    pub fn inc(&self) {
        self.add(1);
    }

    /// 计数增加指定值
    pub fn add(&self, delta: i64) {
        self.local_value.fetch_add(delta, Ordering::Relaxed);
    }
}

/// 计数器快照条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSample {
    /// 计数器名称
    pub name: String,
    /// 进程内计数值
    pub local_value: i64,
    /// 全局计数值
    pub global_value: Option<i64>,
}

impl CounterSample {
    /// 以 “本地 / 全局” 形式展示，全局值缺失时显示 NA
    pub fn display_value(&self) -> String {
        match self.global_value {
            Some(global) => format!("{} / {}", self.local_value, global),
            None => format!("{} / NA", self.local_value),
        }
    }
}

/// 计数器注册表
#[derive(Debug, Default)]
pub struct CounterRegistry {
    counters: DashMap<String, Arc<Counter>>,
}

impl CounterRegistry {
    /// 创建新的计数器注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册计数器
    pub fn register(
        &self,
        name: impl Into<String>,
        global_value: Option<GlobalValueProvider>,
    ) -> AdminResult<Arc<Counter>> {
        let name = name.into();
        match self.counters.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AdminError::DuplicateName {
                kind: "counter",
                name,
            }),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                debug!("注册计数器: {}", name);
                let counter = Arc::new(Counter::new(name, global_value));
                entry.insert(counter.clone());
                Ok(counter)
            }
        }
    }

    /// 获取计数器
    pub fn get(&self, name: &str) -> Option<Arc<Counter>> {
        self.counters.get(name).map(|entry| entry.value().clone())
    }

    /// 增加计数
    pub fn increment(&self, name: &str, delta: i64) -> AdminResult<()> {
        let counter = self.get(name).ok_or_else(|| AdminError::UnknownCounter {
            name: name.to_string(),
        })?;
        counter.add(delta);
        Ok(())
    }

    /// 按名称排序的计数器快照
    pub fn snapshot(&self) -> Vec<CounterSample> {
        let mut samples: Vec<CounterSample> = self
            .counters
            .iter()
            .map(|entry| {
                let counter = entry.value();
                CounterSample {
                    name: counter.name().to_string(),
                    local_value: counter.local_value(),
                    global_value: counter.global_value(),
                }
            })
            .collect();
        samples.sort_by(|a, b| a.name.cmp(&b.name));
        samples
    }

    /// 已注册的计数器数量
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// 是否没有任何计数器
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}
