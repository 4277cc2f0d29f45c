//! 基础设施构建器

use crate::builtin::{register_builtin_counters, site_admin_module};
use crate::infrastructure::AdminInfrastructure;
use crate::logging::{init_logging, LoggingConfig};
use crate::settings::{AdminSettings, StoreKind};
use config_abstractions::{
    ActionTokenVerifier, ConfigEventListener, ConfigProperty, PermissionGate, PropertyStore,
};
use config_impl::{
    ConfigEventHandler, ConfigRegistry, EnvironmentValues, InMemoryPropertyStore,
    JsonFilePropertyStore, LoggingConfigEventListener, RegistryOptions, StaticActionTokenVerifier,
    StaticPermissionGate,
};
use infrastructure_common::{CounterRegistry, InfrastructureError, SettingsError};
use module_abstractions::{Module, ModuleRegistry};
use module_impl::ModuleRegistryImpl;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 管理基础设施构建器
///
/// 未指定的协作者按运行参数创建；权限和令牌默认全部拒绝
pub struct AdminInfrastructureBuilder {
    settings: AdminSettings,
    store: Option<Arc<dyn PropertyStore>>,
    gate: Option<Arc<dyn PermissionGate>>,
    verifier: Option<Arc<dyn ActionTokenVerifier>>,
    environment: Option<EnvironmentValues>,
    properties: Vec<ConfigProperty>,
    modules: Vec<Module>,
    listeners: Vec<Arc<dyn ConfigEventListener>>,
    logging: Option<LoggingConfig>,
    builtin_module: bool,
}

impl std::fmt::Debug for AdminInfrastructureBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminInfrastructureBuilder")
            .field("settings", &self.settings)
            .field("has_store", &self.store.is_some())
            .field("properties", &self.properties.len())
            .field("modules", &self.modules.len())
            .field("listeners", &self.listeners.len())
            .field("builtin_module", &self.builtin_module)
            .finish()
    }
}

impl AdminInfrastructureBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            settings: AdminSettings::default(),
            store: None,
            gate: None,
            verifier: None,
            environment: None,
            properties: Vec::new(),
            modules: Vec::new(),
            listeners: Vec::new(),
            logging: None,
            builtin_module: true,
        }
    }

    /// 使用指定的运行参数
    pub fn with_settings(mut self, settings: AdminSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 从 TOML 文件加载运行参数
    pub fn with_settings_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        info!("加载运行参数: {}", path.display());
        self.settings = AdminSettings::load(Some(path))?;
        Ok(self)
    }

    /// 使用自定义覆盖记录存储，优先于运行参数中的存储配置
    pub fn with_store(mut self, store: Arc<dyn PropertyStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_permission_gate(mut self, gate: Arc<dyn PermissionGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_token_verifier(mut self, verifier: Arc<dyn ActionTokenVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// 使用指定的部署环境配置值，不再读取运行参数中的来源
    pub fn with_environment(mut self, environment: EnvironmentValues) -> Self {
        self.environment = Some(environment);
        self
    }

    /// 添加配置项定义
    pub fn with_property(mut self, property: ConfigProperty) -> Self {
        debug!("添加配置项定义: {}", property.name());
        self.properties.push(property);
        self
    }

    /// 添加模块定义
    pub fn with_module(mut self, module: Module) -> Self {
        debug!("添加模块定义: {}", module.name());
        self.modules.push(module);
        self
    }

    /// 添加配置变更监听器
    pub fn with_listener(mut self, listener: Arc<dyn ConfigEventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// 构建时初始化全局日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// 不注册内置管理模块
    pub fn without_builtin_module(mut self) -> Self {
        self.builtin_module = false;
        self
    }

    fn create_store(settings: &AdminSettings) -> Result<Arc<dyn PropertyStore>, SettingsError> {
        match settings.store.kind {
            StoreKind::Memory => Ok(Arc::new(InMemoryPropertyStore::new())),
            StoreKind::JsonFile => {
                let path = settings
                    .store
                    .path
                    .clone()
                    .ok_or_else(|| SettingsError::InvalidValue {
                        field: "store.path".to_string(),
                        message: "json_file 存储必须指定路径".to_string(),
                    })?;
                Ok(Arc::new(JsonFilePropertyStore::new(path)))
            }
        }
    }

    /// 构建基础设施实例，注册表尚未初始化，需要调用 `start`
    pub async fn build(self) -> Result<AdminInfrastructure, InfrastructureError> {
        if let Some(logging) = &self.logging {
            init_logging(logging)?;
        }

        let settings = self.settings;
        settings.validate()?;

        let store = match self.store {
            Some(store) => store,
            None => Self::create_store(&settings)?,
        };
        let environment = match self.environment {
            Some(environment) => environment,
            None => settings.load_environment()?,
        };
        let gate = self
            .gate
            .unwrap_or_else(|| Arc::new(StaticPermissionGate::new()));
        let verifier = self
            .verifier
            .unwrap_or_else(|| Arc::new(StaticActionTokenVerifier::new()));

        info!(
            "构建管理基础设施: 存储 {}, 环境值 {} 个",
            store.name(),
            environment.len()
        );

        let config = Arc::new(ConfigRegistry::with_options(
            store,
            gate.clone(),
            environment,
            RegistryOptions::default()
                .with_staleness_threshold_secs(settings.staleness_threshold_secs),
        ));
        for property in self.properties {
            config.register(property)?;
        }

        let started_at = chrono::Utc::now();
        let counters = Arc::new(CounterRegistry::new());
        register_builtin_counters(&counters, config.clone(), started_at)?;

        let modules = Arc::new(ModuleRegistryImpl::new());
        if self.builtin_module {
            modules.register(site_admin_module(config.clone(), counters.clone()))?;
        }
        for module in self.modules {
            modules.register(module)?;
        }

        let event_handler = ConfigEventHandler::new();
        event_handler
            .register_listener(Arc::new(LoggingConfigEventListener::new()))
            .await;
        for listener in self.listeners {
            event_handler.register_listener(listener).await;
        }

        Ok(AdminInfrastructure::new(
            config,
            modules,
            counters,
            gate,
            verifier,
            event_handler,
            settings.modules.enabled,
        ))
    }
}

impl Default for AdminInfrastructureBuilder {
    fn default() -> Self {
        Self::new()
    }
}
