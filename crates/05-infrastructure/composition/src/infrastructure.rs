//! 管理基础设施主入口

use crate::builder::AdminInfrastructureBuilder;
use crate::console::{AdminConsole, AdminScope};
use config_abstractions::{ActionTokenVerifier, PermissionGate};
use config_impl::{ConfigEventHandler, ConfigRegistry, SnapshotRefresher};
use infrastructure_common::{CounterRegistry, InfrastructureError, Lifecycle};
use module_abstractions::ModuleRegistry;
use module_impl::ModuleRegistryImpl;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

/// 管理基础设施
///
/// 持有配置注册表、模块注册表和计数器注册表，并驱动它们的生命周期
pub struct AdminInfrastructure {
    config: Arc<ConfigRegistry>,
    modules: Arc<ModuleRegistryImpl>,
    counters: Arc<CounterRegistry>,
    gate: Arc<dyn PermissionGate>,
    verifier: Arc<dyn ActionTokenVerifier>,
    event_handler: Mutex<ConfigEventHandler>,
    refresher: Mutex<SnapshotRefresher>,
    /// 启动时启用的模块
    enabled_on_start: Vec<String>,
    status: RwLock<InfrastructureStatus>,
    metrics: RwLock<InfrastructureMetrics>,
}

impl std::fmt::Debug for AdminInfrastructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminInfrastructure")
            .field("config", &self.config)
            .field("modules", &self.modules)
            .field("enabled_on_start", &self.enabled_on_start)
            .finish()
    }
}

impl AdminInfrastructure {
    /// 创建基础设施构建器
    pub fn builder() -> AdminInfrastructureBuilder {
        AdminInfrastructureBuilder::new()
    }

    pub(crate) fn new(
        config: Arc<ConfigRegistry>,
        modules: Arc<ModuleRegistryImpl>,
        counters: Arc<CounterRegistry>,
        gate: Arc<dyn PermissionGate>,
        verifier: Arc<dyn ActionTokenVerifier>,
        event_handler: ConfigEventHandler,
        enabled_on_start: Vec<String>,
    ) -> Self {
        let refresher = SnapshotRefresher::new(config.clone());
        Self {
            config,
            modules,
            counters,
            gate,
            verifier,
            event_handler: Mutex::new(event_handler),
            refresher: Mutex::new(refresher),
            enabled_on_start,
            status: RwLock::new(InfrastructureStatus::Initialized),
            metrics: RwLock::new(InfrastructureMetrics::default()),
        }
    }

    async fn set_status(&self, status: InfrastructureStatus) {
        *self.status.write().await = status;
    }

    /// 启动基础设施
    ///
    /// 先订阅变更事件，再初始化配置注册表，使首次刷新也进入审计日志。
    /// 注册表就绪后启动快照刷新任务。
    pub async fn start(&self) -> Result<(), InfrastructureError> {
        info!("启动管理基础设施");
        self.set_status(InfrastructureStatus::Starting).await;
        self.metrics.write().await.start_time = Some(chrono::Utc::now());

        self.event_handler
            .lock()
            .await
            .start(self.config.subscribe());

        if let Err(e) = self.start_registries().await {
            error!("管理基础设施启动失败: {}", e);
            self.set_status(InfrastructureStatus::Failed).await;
            return Err(e);
        }
        self.refresher.lock().await.start();

        self.set_status(InfrastructureStatus::Running).await;
        info!("管理基础设施启动完成");
        Ok(())
    }

    async fn start_registries(&self) -> Result<(), InfrastructureError> {
        self.config.init().await?;
        self.modules.init().await?;
        for name in &self.enabled_on_start {
            self.modules.enable(name).await?;
        }
        Ok(())
    }

    /// 停止基础设施
    ///
    /// 模块先停用，配置注册表后关闭；任一步失败仍会继续执行后续步骤
    pub async fn stop(&self) -> Result<(), InfrastructureError> {
        info!("停止管理基础设施");
        self.set_status(InfrastructureStatus::Stopping).await;
        self.refresher.lock().await.stop();

        let mut first_error = None;
        if let Err(e) = self.modules.shutdown().await {
            error!("模块注册表关闭失败: {}", e);
            first_error.get_or_insert(e);
        }
        if let Err(e) = self.config.shutdown().await {
            error!("配置注册表关闭失败: {}", e);
            first_error.get_or_insert(e);
        }
        self.event_handler.lock().await.stop();
        self.metrics.write().await.stop_time = Some(chrono::Utc::now());

        match first_error {
            Some(e) => {
                self.set_status(InfrastructureStatus::Failed).await;
                Err(e)
            }
            None => {
                self.set_status(InfrastructureStatus::Stopped).await;
                info!("管理基础设施停止完成");
                Ok(())
            }
        }
    }

    /// 创建指定作用域的管理控制台
    pub fn console(&self, scope: AdminScope) -> AdminConsole {
        AdminConsole::new(
            scope,
            self.config.clone(),
            self.modules.clone(),
            self.counters.clone(),
            self.gate.clone(),
            self.verifier.clone(),
        )
    }

    /// 获取运行状态
    pub async fn get_status(&self) -> InfrastructureStatus {
        *self.status.read().await
    }

    /// 获取统计信息
    pub async fn get_metrics(&self) -> InfrastructureMetrics {
        self.metrics.read().await.clone()
    }

    pub fn config(&self) -> &Arc<ConfigRegistry> {
        &self.config
    }

    pub fn modules(&self) -> &Arc<ModuleRegistryImpl> {
        &self.modules
    }

    pub fn counters(&self) -> &Arc<CounterRegistry> {
        &self.counters
    }

    /// 配置变更事件处理器
    pub fn event_handler(&self) -> &Mutex<ConfigEventHandler> {
        &self.event_handler
    }

    /// 快照刷新任务是否在运行
    pub async fn is_refreshing(&self) -> bool {
        self.refresher.lock().await.is_running()
    }
}

/// 基础设施运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfrastructureStatus {
    /// 已构建，尚未启动
    Initialized,
    /// 启动中
    Starting,
    /// 运行中
    Running,
    /// 停止中
    Stopping,
    /// 已停止
    Stopped,
    /// 失败
    Failed,
}

/// 基础设施统计信息
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfrastructureMetrics {
    /// 启动时间
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    /// 停止时间
    pub stop_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl InfrastructureMetrics {
    /// 计算运行时间
    pub fn uptime(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.stop_time) {
            (Some(start), Some(stop)) => Some(stop - start),
            (Some(start), None) => Some(chrono::Utc::now() - start),
            _ => None,
        }
    }
}
