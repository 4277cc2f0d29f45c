//! 管理面自身的运行参数

use config_impl::{EnvironmentValues, DEFAULT_UPDATE_INTERVAL_SECS, MAX_UPDATE_INTERVAL_SECS};
use infrastructure_common::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 运行参数环境变量前缀，例如 `ADMIN__STORE__KIND=json_file`
pub const SETTINGS_ENV_PREFIX: &str = "ADMIN";

/// 覆盖记录存储类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// 进程内存储，重启后丢失
    #[default]
    Memory,
    /// JSON 文件存储
    JsonFile,
}

/// 存储参数
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub kind: StoreKind,
    /// 文件存储路径
    pub path: Option<PathBuf>,
}

/// 部署环境配置值来源
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    /// 进程环境变量前缀
    pub prefix: Option<String>,
    /// 带 `[properties]` 表的 TOML 文件
    pub file: Option<PathBuf>,
    /// 直接写在运行参数里的值
    pub values: BTreeMap<String, String>,
}

/// 日志参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
    pub show_target: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            show_target: true,
        }
    }
}

/// 模块参数
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleSettings {
    /// 启动时启用的模块
    pub enabled: Vec<String>,
}

/// 管理面运行参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    /// 快照过期阈值默认值（秒）
    pub staleness_threshold_secs: i64,
    pub store: StoreSettings,
    pub environment: EnvironmentSettings,
    pub logging: LoggingSettings,
    pub modules: ModuleSettings,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            staleness_threshold_secs: DEFAULT_UPDATE_INTERVAL_SECS,
            store: StoreSettings::default(),
            environment: EnvironmentSettings::default(),
            logging: LoggingSettings::default(),
            modules: ModuleSettings::default(),
        }
    }
}

impl AdminSettings {
    /// 从可选的 TOML 文件和 `ADMIN__` 前缀环境变量加载
    pub fn load(path: Option<&Path>) -> SettingsResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!("加载运行参数文件: {}", path.display());
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        builder = builder.add_source(
            config::Environment::with_prefix(SETTINGS_ENV_PREFIX).separator("__"),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 从 TOML 文本解析，不读取环境变量
    pub fn from_toml_str(content: &str) -> SettingsResult<Self> {
        let settings: Self = config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 校验运行参数
    pub fn validate(&self) -> SettingsResult<()> {
        if !(1..=MAX_UPDATE_INTERVAL_SECS).contains(&self.staleness_threshold_secs) {
            return Err(SettingsError::InvalidValue {
                field: "staleness_threshold_secs".to_string(),
                message: format!(
                    "必须在 1 到 {} 之间，实际为 {}",
                    MAX_UPDATE_INTERVAL_SECS, self.staleness_threshold_secs
                ),
            });
        }
        if self.store.kind == StoreKind::JsonFile && self.store.path.is_none() {
            return Err(SettingsError::InvalidValue {
                field: "store.path".to_string(),
                message: "json_file 存储必须指定路径".to_string(),
            });
        }
        Ok(())
    }

    /// 加载部署环境配置值
    ///
    /// 优先级从低到高：运行参数内的值、TOML 文件、进程环境变量
    pub fn load_environment(&self) -> SettingsResult<EnvironmentValues> {
        let mut values = EnvironmentValues::from_map(self.environment.values.clone());
        if let Some(file) = &self.environment.file {
            values = values.merge(EnvironmentValues::from_toml_file(file)?);
        }
        if let Some(prefix) = &self.environment.prefix {
            values = values.merge(EnvironmentValues::from_process_env(prefix));
        }
        Ok(values)
    }
}
