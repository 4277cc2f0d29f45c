//! 部署环境提供的配置值

use infrastructure_common::{SettingsError, SettingsResult};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// 环境配置值集合
///
/// 进程启动时加载一次，运行期间只读
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentValues {
    values: BTreeMap<String, String>,
}

impl EnvironmentValues {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 从键值对构建
    pub fn from_map<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// 从带前缀的进程环境变量加载
    ///
    /// `ADMIN_PROP_MAX_ITEMS=25` 对应配置项 `max-items`
    pub fn from_process_env(prefix: &str) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    fn from_vars(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let values: BTreeMap<String, String> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_ascii_lowercase().replace('_', "-"), value))
            })
            .collect();
        debug!("从环境变量加载配置值 {} 个, 前缀 {}", values.len(), prefix);
        Self { values }
    }

    /// 从 TOML 文本的 `[properties]` 表解析
    pub fn from_toml_str(content: &str) -> SettingsResult<Self> {
        let document: toml::Table = content.parse().map_err(|e: toml::de::Error| {
            SettingsError::ParseError {
                message: e.to_string(),
            }
        })?;

        let Some(table) = document.get("properties") else {
            return Ok(Self::default());
        };
        let table = table.as_table().ok_or_else(|| SettingsError::ParseError {
            message: "properties 必须是表".to_string(),
        })?;

        let mut values = BTreeMap::new();
        for (name, value) in table {
            let raw = match value {
                toml::Value::String(text) => text.clone(),
                toml::Value::Integer(number) => number.to_string(),
                toml::Value::Boolean(flag) => flag.to_string(),
                other => {
                    return Err(SettingsError::InvalidValue {
                        field: format!("properties.{}", name),
                        message: format!("不支持的值类型: {}", other.type_str()),
                    })
                }
            };
            values.insert(name.clone(), raw);
        }
        Ok(Self { values })
    }

    /// 从 TOML 文件加载
    pub fn from_toml_file(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| SettingsError::FileReadError {
                path: path.display().to_string(),
                source,
            })?;
        let values = Self::from_toml_str(&content)?;
        info!("从 {} 加载部署配置值 {} 个", path.display(), values.len());
        Ok(values)
    }

    /// 合并另一个集合，同名时后者优先
    pub fn merge(mut self, other: Self) -> Self {
        self.values.extend(other.values);
        self
    }

    /// 获取原始值
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 按名称排序的配置项名称
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_vars_are_normalized() {
        let values = EnvironmentValues::from_vars(
            "ADMIN_PROP_",
            vec![
                ("ADMIN_PROP_MAX_ITEMS".to_string(), "25".to_string()),
                ("ADMIN_PROP_".to_string(), "ignored".to_string()),
                ("PATH".to_string(), "/usr/bin".to_string()),
            ],
        );

        assert_eq!(values.len(), 1);
        assert_eq!(values.get("max-items"), Some("25"));
    }

    #[test]
    fn test_toml_properties_table() {
        let values = EnvironmentValues::from_toml_str(
            r#"
            [properties]
            max-items = 40
            maintenance = true
            banner = "hello"
            "#,
        )
        .unwrap();

        assert_eq!(values.get("max-items"), Some("40"));
        assert_eq!(values.get("maintenance"), Some("true"));
        assert_eq!(values.get("banner"), Some("hello"));

        assert!(EnvironmentValues::from_toml_str("[properties]\nbad = [1, 2]").is_err());
        assert!(EnvironmentValues::from_toml_str("title = 'x'").unwrap().is_empty());
    }

    #[test]
    fn test_merge_prefers_later_source() {
        let file = EnvironmentValues::from_map([("a", "1"), ("b", "2")]);
        let env = EnvironmentValues::from_map([("b", "3")]);

        let merged = file.merge(env);
        assert_eq!(merged.get("a"), Some("1"));
        assert_eq!(merged.get("b"), Some("3"));
    }
}
