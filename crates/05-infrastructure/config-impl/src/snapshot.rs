//! 覆盖记录快照

use chrono::{DateTime, Utc};
use config_abstractions::OverrideRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// 注册表快照
///
/// 快照只会被整体替换，读者持有的引用始终是一致的时间点视图
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    /// 按名称索引的覆盖记录
    pub overrides: BTreeMap<String, OverrideRecord>,
    /// 变更版本号
    pub version: u64,
    /// 最近一次从存储全量加载的时间
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl RegistrySnapshot {
    /// 从存储加载结果构建快照
    pub fn loaded(records: Vec<OverrideRecord>, version: u64, refreshed_at: DateTime<Utc>) -> Self {
        Self {
            overrides: records
                .into_iter()
                .map(|record| (record.name.clone(), record))
                .collect(),
            version,
            last_refreshed_at: Some(refreshed_at),
        }
    }

    /// 替换或移除单条记录，返回版本号加一的新快照
    pub fn with_record(&self, name: &str, record: Option<OverrideRecord>) -> Self {
        let mut overrides = self.overrides.clone();
        match record {
            Some(record) => {
                overrides.insert(name.to_string(), record);
            }
            None => {
                overrides.remove(name);
            }
        }
        Self {
            overrides,
            version: self.version + 1,
            last_refreshed_at: self.last_refreshed_at,
        }
    }

    /// 获取覆盖记录
    pub fn get(&self, name: &str) -> Option<&OverrideRecord> {
        self.overrides.get(name)
    }

    /// 生效中（非草稿）的覆盖记录数量
    pub fn active_count(&self) -> usize {
        self.overrides.values().filter(|record| !record.is_draft).count()
    }
}
