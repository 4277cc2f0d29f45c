//! 配置变更事件处理器实现

use config_abstractions::events::{ConfigChangeEvent, ConfigChangeEventType, ConfigEventListener};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// 配置事件处理器
///
/// 订阅注册表的变更广播，并分发到各个监听器
pub struct ConfigEventHandler {
    /// 事件监听器映射
    listeners: Arc<RwLock<BTreeMap<String, Arc<dyn ConfigEventListener>>>>,
    /// 事件处理任务句柄
    handler_task: Option<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for ConfigEventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigEventHandler")
            .field("is_running", &self.is_running())
            .finish()
    }
}

impl ConfigEventHandler {
    /// 创建新的配置事件处理器
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(BTreeMap::new())),
            handler_task: None,
        }
    }

    /// 注册事件监听器，同名监听器被替换
    pub async fn register_listener(&self, listener: Arc<dyn ConfigEventListener>) {
        info!("注册配置事件监听器: {}", listener.name());
        let mut listeners = self.listeners.write().await;
        listeners.insert(listener.name().to_string(), listener);
    }

    /// 移除事件监听器
    pub async fn unregister_listener(&self, listener_name: &str) -> bool {
        let removed = self.listeners.write().await.remove(listener_name).is_some();
        if removed {
            info!("移除配置事件监听器: {}", listener_name);
        }
        removed
    }

    /// 启动事件处理任务
    pub fn start(&mut self, mut receiver: broadcast::Receiver<ConfigChangeEvent>) {
        if self.handler_task.is_some() {
            return;
        }

        info!("启动配置事件处理器");
        let listeners = self.listeners.clone();
        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => Self::dispatch_event(&listeners, &event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("配置事件处理落后，丢弃 {} 条事件", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("配置事件通道已关闭");
                        break;
                    }
                }
            }
        });
        self.handler_task = Some(handle);
    }

    /// 停止事件处理任务
    pub fn stop(&mut self) {
        if let Some(handle) = self.handler_task.take() {
            handle.abort();
            info!("配置事件处理器已停止");
        }
    }

    /// 按监听器名称顺序分发事件
    async fn dispatch_event(
        listeners: &RwLock<BTreeMap<String, Arc<dyn ConfigEventListener>>>,
        event: &ConfigChangeEvent,
    ) {
        let listeners = listeners.read().await;
        let targets = listeners.values().filter(|listener| {
            listener.is_enabled() && {
                let wanted = listener.interested_event_types();
                wanted.is_empty() || wanted.contains(&event.event_type)
            }
        });

        let mut delivered = 0usize;
        for listener in targets {
            listener.on_config_changed(event);
            delivered += 1;
        }
        debug!(
            "配置事件 {:?} (版本 {}) 已分发给 {} 个监听器",
            event.event_type, event.version, delivered
        );
    }

    /// 获取监听器数量
    pub async fn get_listener_count(&self) -> usize {
        self.listeners.read().await.len()
    }

    /// 是否正在运行
    pub fn is_running(&self) -> bool {
        self.handler_task
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}

impl Default for ConfigEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConfigEventHandler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 日志审计监听器
///
/// 把每一次配置变更连同操作者和版本号写入日志
#[derive(Debug)]
pub struct LoggingConfigEventListener {
    name: String,
    enabled: bool,
}

impl LoggingConfigEventListener {
    pub fn new() -> Self {
        Self {
            name: "LoggingConfigEventListener".to_string(),
            enabled: true,
        }
    }

    /// 设置是否启用
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl Default for LoggingConfigEventListener {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigEventListener for LoggingConfigEventListener {
    fn on_config_changed(&self, event: &ConfigChangeEvent) {
        let name = event.name.as_deref().unwrap_or("-");
        let actor = event.actor.as_deref().unwrap_or("-");
        match event.event_type {
            ConfigChangeEventType::Overridden => info!(
                "[审计] 覆盖 {}: {:?} -> {:?}, 操作者 {}, 版本 {}",
                name, event.old_value, event.new_value, actor, event.version
            ),
            ConfigChangeEventType::DraftSaved => info!(
                "[审计] 草稿 {}: {:?}, 操作者 {}, 版本 {}",
                name, event.new_value, actor, event.version
            ),
            ConfigChangeEventType::DraftPromoted => info!(
                "[审计] 提升草稿 {}: {:?}, 操作者 {}, 版本 {}",
                name, event.new_value, actor, event.version
            ),
            ConfigChangeEventType::Reset => warn!(
                "[审计] 重置 {}: 原值 {:?}, 操作者 {}, 版本 {}",
                name, event.old_value, actor, event.version
            ),
            ConfigChangeEventType::Refreshed => debug!(
                "[审计] 快照刷新, 版本 {} at {}",
                event.version, event.timestamp
            ),
        }

        if !event.metadata.is_empty() {
            debug!("事件元数据: {:?}", event.metadata);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListener {
        seen: AtomicUsize,
    }

    impl ConfigEventListener for CountingListener {
        fn on_config_changed(&self, _event: &ConfigChangeEvent) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &str {
            "counting"
        }

        fn interested_event_types(&self) -> Vec<ConfigChangeEventType> {
            vec![ConfigChangeEventType::Overridden]
        }
    }

    #[tokio::test]
    async fn test_register_and_unregister_listener() {
        let handler = ConfigEventHandler::new();
        handler
            .register_listener(Arc::new(LoggingConfigEventListener::new()))
            .await;
        assert_eq!(handler.get_listener_count().await, 1);

        assert!(handler.unregister_listener("LoggingConfigEventListener").await);
        assert!(!handler.unregister_listener("LoggingConfigEventListener").await);
        assert_eq!(handler.get_listener_count().await, 0);
    }

    #[tokio::test]
    async fn test_dispatch_respects_interested_types() {
        let (sender, receiver) = broadcast::channel(16);
        let listener = Arc::new(CountingListener {
            seen: AtomicUsize::new(0),
        });

        let mut handler = ConfigEventHandler::new();
        handler.register_listener(listener.clone()).await;
        handler.start(receiver);
        assert!(handler.is_running());

        sender
            .send(ConfigChangeEvent::overridden("a", None, "1", "ops", 1))
            .unwrap();
        sender.send(ConfigChangeEvent::refreshed(2, 0)).unwrap();
        sender
            .send(ConfigChangeEvent::overridden("a", Some("1".into()), "2", "ops", 3))
            .unwrap();
        drop(sender);

        for _ in 0..50 {
            if !handler.is_running() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(listener.seen.load(Ordering::SeqCst), 2);
    }
}
