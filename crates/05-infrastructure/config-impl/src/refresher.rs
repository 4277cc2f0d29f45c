//! 快照后台刷新任务

use crate::registry::ConfigRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 两次检查之间的最短间隔
const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// 快照刷新器
///
/// 在快照到期时执行非强制刷新，使其他实例写入的覆盖记录在一个过期阈值内可见。
/// 读取路径仍然只加载当前快照，不等待存储。
pub struct SnapshotRefresher {
    registry: Arc<ConfigRegistry>,
    refresh_task: Option<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for SnapshotRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotRefresher")
            .field("is_running", &self.is_running())
            .finish()
    }
}

impl SnapshotRefresher {
    pub fn new(registry: Arc<ConfigRegistry>) -> Self {
        Self {
            registry,
            refresh_task: None,
        }
    }

    /// 启动刷新任务，已在运行时忽略
    pub fn start(&mut self) {
        if self.refresh_task.is_some() {
            return;
        }

        info!(
            "启动配置快照刷新任务, 过期阈值 {} 秒",
            self.registry.staleness_threshold_secs()
        );
        let registry = self.registry.clone();
        let handle = tokio::spawn(async move {
            let mut delay = registry.next_refresh_in();
            loop {
                tokio::time::sleep(delay.max(MIN_CHECK_INTERVAL)).await;
                delay = match registry.refresh(false).await {
                    Ok(refreshed) => {
                        if !refreshed {
                            debug!("快照尚未过期，跳过刷新");
                        }
                        registry.next_refresh_in()
                    }
                    // 失败后快照仍是过期状态，等满一个阈值再重试
                    Err(e) => {
                        warn!("后台刷新配置快照失败: {}", e);
                        Duration::from_secs(
                            u64::try_from(registry.staleness_threshold_secs()).unwrap_or(1),
                        )
                    }
                };
            }
        });
        self.refresh_task = Some(handle);
    }

    /// 停止刷新任务
    pub fn stop(&mut self) {
        if let Some(handle) = self.refresh_task.take() {
            handle.abort();
            info!("配置快照刷新任务已停止");
        }
    }

    pub fn is_running(&self) -> bool {
        self.refresh_task
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}

impl Drop for SnapshotRefresher {
    fn drop(&mut self) {
        self.stop();
    }
}
