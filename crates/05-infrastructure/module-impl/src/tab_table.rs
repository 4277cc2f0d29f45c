//! 标签页表

use infrastructure_common::{AdminError, AdminResult};
use module_abstractions::TabBinding;
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct TabEntry {
    module: String,
    binding: TabBinding,
    /// 撤回中的标签页不展示，但键仍归原模块所有
    live: bool,
}

/// 标签页表
///
/// 按分组保存，分组内保持注册顺序
#[derive(Debug, Default)]
pub struct TabTable {
    groups: RwLock<BTreeMap<String, Vec<TabEntry>>>,
}

impl TabTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_conflict(
        groups: &BTreeMap<String, Vec<TabEntry>>,
        module: &str,
        tabs: &[TabBinding],
    ) -> AdminResult<()> {
        for tab in tabs {
            let taken = groups.get(tab.group()).and_then(|entries| {
                entries
                    .iter()
                    .find(|entry| entry.binding.key() == tab.key() && entry.module != module)
            });
            if taken.is_some() {
                return Err(AdminError::DuplicateName {
                    kind: "tab",
                    name: format!("{}/{}", tab.group(), tab.key()),
                });
            }
        }
        Ok(())
    }

    /// 检查标签页是否都可以发布
    pub fn check_available(&self, module: &str, tabs: &[TabBinding]) -> AdminResult<()> {
        Self::find_conflict(&self.groups.read(), module, tabs)
    }

    /// 发布模块的全部标签页，任一冲突时一个都不发布
    pub fn publish(&self, module: &str, tabs: &[TabBinding]) -> AdminResult<()> {
        let mut groups = self.groups.write();
        Self::find_conflict(&groups, module, tabs)?;
        for tab in tabs {
            groups
                .entry(tab.group().to_string())
                .or_default()
                .push(TabEntry {
                    module: module.to_string(),
                    binding: tab.clone(),
                    live: true,
                });
        }
        Ok(())
    }

    /// 撤回模块的全部标签页，返回撤回数量
    pub fn unpublish(&self, module: &str) -> usize {
        let mut groups = self.groups.write();
        let mut removed = 0;
        for entries in groups.values_mut() {
            let before = entries.len();
            entries.retain(|entry| entry.module != module);
            removed += before - entries.len();
        }
        groups.retain(|_, entries| !entries.is_empty());
        removed
    }

    fn set_live(&self, module: &str, live: bool) -> usize {
        let mut changed = 0;
        for entry in self.groups.write().values_mut().flatten() {
            if entry.module == module && entry.live != live {
                entry.live = live;
                changed += 1;
            }
        }
        changed
    }

    /// 隐藏模块的标签页，保留键的归属
    pub fn withdraw(&self, module: &str) -> usize {
        self.set_live(module, false)
    }

    /// 恢复撤回中的标签页，位置不变
    pub fn restore(&self, module: &str) -> usize {
        self.set_live(module, true)
    }

    /// 释放撤回中的标签页，返回释放数量
    pub fn release(&self, module: &str) -> usize {
        let mut groups = self.groups.write();
        let mut removed = 0;
        for entries in groups.values_mut() {
            let before = entries.len();
            entries.retain(|entry| entry.live || entry.module != module);
            removed += before - entries.len();
        }
        groups.retain(|_, entries| !entries.is_empty());
        removed
    }

    /// 分组内的标签页
    pub fn tabs(&self, group: &str) -> Vec<TabBinding> {
        self.groups
            .read()
            .get(group)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.live)
                    .map(|entry| entry.binding.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 查找标签页
    pub fn tab(&self, group: &str, key: &str) -> Option<TabBinding> {
        self.groups.read().get(group).and_then(|entries| {
            entries
                .iter()
                .find(|entry| entry.live && entry.binding.key() == key)
                .map(|entry| entry.binding.clone())
        })
    }

    /// 有可见标签页的分组名称
    pub fn groups(&self) -> Vec<String> {
        self.groups
            .read()
            .iter()
            .filter(|(_, entries)| entries.iter().any(|entry| entry.live))
            .map(|(group, _)| group.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tabs_keep_registration_order_within_group() {
        let table = TabTable::new();
        table
            .publish(
                "m1",
                &[
                    TabBinding::new("admin", "settings", "Settings"),
                    TabBinding::new("admin", "perf", "Metrics"),
                ],
            )
            .unwrap();
        table
            .publish("m2", &[TabBinding::new("admin", "analytics", "Analytics")])
            .unwrap();

        let keys: Vec<String> = table
            .tabs("admin")
            .iter()
            .map(|tab| tab.key().to_string())
            .collect();
        assert_eq!(keys, vec!["settings", "perf", "analytics"]);

        assert!(table
            .publish("m2", &[TabBinding::new("admin", "perf", "Other")])
            .is_err());

        assert_eq!(table.unpublish("m1"), 2);
        assert!(table.tab("admin", "settings").is_none());
        assert_eq!(table.groups(), vec!["admin".to_string()]);
    }
}
