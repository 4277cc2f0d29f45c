//! 配置注册表实现

use crate::environment::EnvironmentValues;
use crate::snapshot::RegistrySnapshot;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use config_abstractions::{
    actions, Actor, ConfigChangeEvent, ConfigProperty, EffectiveValue, OverrideRecord,
    PermissionGate, PropertyStore, PropertyValue, RangeValidator, SourceClass,
};
use infrastructure_common::{
    AdminError, AdminResult, DenialReason, InfrastructureError, Lifecycle, LifecycleCell,
    LifecycleState,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

/// 刷新间隔配置项名称，其生效值即快照过期阈值
pub const UPDATE_INTERVAL_PROPERTY: &str = "config-update-interval-sec";

/// 默认快照过期阈值（秒）
pub const DEFAULT_UPDATE_INTERVAL_SECS: i64 = 15;

/// 快照过期阈值上限（秒）
pub const MAX_UPDATE_INTERVAL_SECS: i64 = 300;

/// 注册表选项
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// 刷新间隔配置项的默认值
    pub staleness_threshold_secs: i64,
    /// 变更事件通道容量
    pub event_channel_capacity: usize,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            staleness_threshold_secs: DEFAULT_UPDATE_INTERVAL_SECS,
            event_channel_capacity: 256,
        }
    }
}

impl RegistryOptions {
    pub fn with_staleness_threshold_secs(mut self, secs: i64) -> Self {
        self.staleness_threshold_secs = secs;
        self
    }
}

/// 配置注册表
///
/// 生效值按 持久化覆盖 > 部署环境 > 默认值 的顺序解析。
/// 读取只加载当前快照，不等待任何锁；写操作和刷新共用一把变更锁，
/// 新快照构建完成后一次性替换。
pub struct ConfigRegistry {
    properties: RwLock<BTreeMap<String, ConfigProperty>>,
    snapshot: ArcSwap<RegistrySnapshot>,
    mutation_lock: Mutex<()>,
    store: Arc<dyn PropertyStore>,
    gate: Arc<dyn PermissionGate>,
    environment: EnvironmentValues,
    default_threshold_secs: i64,
    events: broadcast::Sender<ConfigChangeEvent>,
    lifecycle: LifecycleCell,
    created_at: DateTime<Utc>,
}

impl std::fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("properties", &self.properties.read().len())
            .field("version", &self.version())
            .field("store", &self.store.name())
            .field("environment", &self.environment.len())
            .field("lifecycle", &self.lifecycle.get())
            .finish()
    }
}

impl ConfigRegistry {
    /// 使用默认选项创建注册表
    pub fn new(store: Arc<dyn PropertyStore>, gate: Arc<dyn PermissionGate>) -> Self {
        Self::with_options(
            store,
            gate,
            EnvironmentValues::default(),
            RegistryOptions::default(),
        )
    }

    /// 创建注册表
    pub fn with_options(
        store: Arc<dyn PropertyStore>,
        gate: Arc<dyn PermissionGate>,
        environment: EnvironmentValues,
        options: RegistryOptions,
    ) -> Self {
        let threshold = options
            .staleness_threshold_secs
            .clamp(1, MAX_UPDATE_INTERVAL_SECS);
        let interval = ConfigProperty::integer(
            UPDATE_INTERVAL_PROPERTY,
            threshold,
            "How often to check for updates to the persisted configuration overrides, in seconds.",
        )
        .with_validator(RangeValidator::between(1, MAX_UPDATE_INTERVAL_SECS));

        let mut properties = BTreeMap::new();
        properties.insert(UPDATE_INTERVAL_PROPERTY.to_string(), interval);

        let (events, _) = broadcast::channel(options.event_channel_capacity.max(1));

        Self {
            properties: RwLock::new(properties),
            snapshot: ArcSwap::from_pointee(RegistrySnapshot::default()),
            mutation_lock: Mutex::new(()),
            store,
            gate,
            environment,
            default_threshold_secs: threshold,
            events,
            lifecycle: LifecycleCell::new("ConfigRegistry"),
            created_at: Utc::now(),
        }
    }

    /// 注册配置项
    ///
    /// 同名同类型的重复注册保留已有定义；类型不同时返回 [`AdminError::DuplicateName`]
    pub fn register(&self, property: ConfigProperty) -> AdminResult<()> {
        property
            .validate(property.default_value())
            .map_err(|message| AdminError::validation(property.name(), message))?;

        let mut properties = self.properties.write();
        if let Some(existing) = properties.get(property.name()) {
            if existing.value_type() != property.value_type() {
                warn!(
                    "配置项类型冲突: {} 已注册为 {}, 拒绝注册为 {}",
                    property.name(),
                    existing.value_type(),
                    property.value_type()
                );
                return Err(AdminError::DuplicateName {
                    kind: "property",
                    name: property.name().to_string(),
                });
            }
            debug!("配置项重复注册，保留已有定义: {}", property.name());
            return Ok(());
        }

        info!(
            "注册配置项: {} ({})",
            property.name(),
            property.value_type()
        );
        properties.insert(property.name().to_string(), property);
        Ok(())
    }

    /// 获取配置项定义
    pub fn property(&self, name: &str) -> Option<ConfigProperty> {
        self.properties.read().get(name).cloned()
    }

    /// 按名称排序的全部配置项定义
    pub fn properties(&self) -> Vec<ConfigProperty> {
        self.properties.read().values().cloned().collect()
    }

    fn definition(&self, name: &str) -> AdminResult<ConfigProperty> {
        self.property(name).ok_or_else(|| AdminError::UnknownProperty {
            name: name.to_string(),
        })
    }

    /// 按声明类型解析并校验外部输入
    pub fn parse_input(&self, name: &str, raw: &str) -> AdminResult<PropertyValue> {
        self.definition(name)?
            .parse_value(raw)
            .map_err(|message| AdminError::validation(name, message))
    }

    /// 解析生效值，草稿不可见
    pub fn resolve(&self, name: &str) -> AdminResult<EffectiveValue> {
        let property = self.definition(name)?;
        let snapshot = self.snapshot.load();
        Ok(self.resolve_with(&property, &snapshot, false))
    }

    /// 解析生效值，草稿优先，仅供管理界面展示
    pub fn resolve_including_drafts(&self, name: &str) -> AdminResult<EffectiveValue> {
        let property = self.definition(name)?;
        let snapshot = self.snapshot.load();
        Ok(self.resolve_with(&property, &snapshot, true))
    }

    /// 按名称排序解析全部配置项
    pub fn resolve_all(&self) -> Vec<(String, EffectiveValue)> {
        self.resolve_all_with(false)
    }

    /// 按名称排序解析全部配置项，草稿可见
    pub fn resolve_all_including_drafts(&self) -> Vec<(String, EffectiveValue)> {
        self.resolve_all_with(true)
    }

    fn resolve_all_with(&self, include_drafts: bool) -> Vec<(String, EffectiveValue)> {
        let snapshot = self.snapshot.load();
        self.properties
            .read()
            .values()
            .map(|property| {
                (
                    property.name().to_string(),
                    self.resolve_with(property, &snapshot, include_drafts),
                )
            })
            .collect()
    }

    fn resolve_with(
        &self,
        property: &ConfigProperty,
        snapshot: &RegistrySnapshot,
        include_drafts: bool,
    ) -> EffectiveValue {
        let name = property.name();

        if let Some(record) = snapshot.get(name) {
            if !record.is_draft || include_drafts {
                match property.parse_value(&record.value) {
                    Ok(value) => {
                        let source = if record.is_draft {
                            SourceClass::DraftOverride
                        } else {
                            SourceClass::PersistedOverride
                        };
                        return EffectiveValue::new(value, source);
                    }
                    Err(message) => debug!("忽略无效的覆盖值: {}: {}", name, message),
                }
            }
        }

        if let Some(raw) = self.environment.get(name) {
            match property.parse_value(raw) {
                Ok(value) => return EffectiveValue::new(value, SourceClass::Environment),
                Err(message) => debug!("忽略无效的环境值: {}: {}", name, message),
            }
        }

        EffectiveValue::new(property.default_value().clone(), SourceClass::Default)
    }

    /// 当前生效的快照过期阈值（秒）
    pub fn staleness_threshold_secs(&self) -> i64 {
        self.resolve(UPDATE_INTERVAL_PROPERTY)
            .ok()
            .and_then(|effective| effective.value.as_int())
            .unwrap_or(self.default_threshold_secs)
    }

    /// 快照是否已过期
    pub fn is_stale(&self) -> bool {
        match self.last_refreshed_at() {
            None => true,
            Some(at) => {
                (Utc::now() - at).num_milliseconds() >= self.staleness_threshold_secs() * 1000
            }
        }
    }

    /// 距快照过期还有多久，已过期时为零
    pub fn next_refresh_in(&self) -> Duration {
        let Some(at) = self.last_refreshed_at() else {
            return Duration::ZERO;
        };
        let remaining =
            self.staleness_threshold_secs() * 1000 - (Utc::now() - at).num_milliseconds();
        Duration::from_millis(u64::try_from(remaining).unwrap_or(0))
    }

    /// 从存储重新加载快照
    ///
    /// 返回是否实际读取了存储。读取失败时保留原快照并返回错误。
    pub async fn refresh(&self, force: bool) -> AdminResult<bool> {
        if !force && !self.is_stale() {
            return Ok(false);
        }

        let _guard = self.mutation_lock.lock().await;
        // 等锁期间可能已有其他调用方完成刷新
        if !force && !self.is_stale() {
            debug!("快照已由并发调用方刷新，跳过");
            return Ok(false);
        }

        let started = Instant::now();
        let records = match self.store.get_all().await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "从存储 {} 加载覆盖记录失败，保留当前快照: {}",
                    self.store.name(),
                    e
                );
                return Err(e);
            }
        };

        let current = self.snapshot.load_full();
        let next = RegistrySnapshot::loaded(records, current.version + 1, Utc::now());
        self.audit_loaded_records(&next);

        let version = next.version;
        let count = next.overrides.len();
        self.snapshot.store(Arc::new(next));

        info!(
            "配置快照已刷新: 版本 {}, 覆盖记录 {} 条, 耗时 {:?}",
            version,
            count,
            started.elapsed()
        );
        self.publish(ConfigChangeEvent::refreshed(version, count));
        Ok(true)
    }

    fn audit_loaded_records(&self, snapshot: &RegistrySnapshot) {
        let properties = self.properties.read();
        for record in snapshot.overrides.values() {
            match properties.get(&record.name) {
                None => warn!("存储中存在未注册配置项的覆盖记录，已忽略: {}", record.name),
                Some(property) => {
                    if let Err(message) = property.parse_value(&record.value) {
                        warn!(
                            "覆盖记录值无效，解析时将跳过: {} = '{}': {}",
                            record.name, record.value, message
                        );
                    }
                }
            }
        }
    }

    async fn authorize(&self, actor: &Actor, name: &str, action: &str) -> AdminResult<()> {
        if self.gate.can_modify_property(actor, name).await {
            return Ok(());
        }
        warn!(
            "拒绝修改配置项: 操作者 {}, 配置项 {}, 操作 {}",
            actor, name, action
        );
        Err(AdminError::permission_denied(
            actor.id.clone(),
            action,
            DenialReason::PropertyNotModifiable,
        ))
    }

    fn install(&self, current: &RegistrySnapshot, name: &str, record: Option<OverrideRecord>) -> u64 {
        let next = current.with_record(name, record);
        let version = next.version;
        self.snapshot.store(Arc::new(next));
        version
    }

    fn publish(&self, event: ConfigChangeEvent) {
        if self.events.send(event).is_err() {
            debug!("没有配置变更订阅者");
        }
    }

    /// 写入生效覆盖值，返回新版本号
    pub async fn override_property(
        &self,
        name: &str,
        value: PropertyValue,
        actor: &Actor,
    ) -> AdminResult<u64> {
        self.write_override(name, value, actor, false).await
    }

    /// 暂存草稿覆盖值，返回新版本号
    ///
    /// 每个配置项只有一条覆盖记录，草稿会替换已生效的覆盖
    pub async fn save_draft(
        &self,
        name: &str,
        value: PropertyValue,
        actor: &Actor,
    ) -> AdminResult<u64> {
        self.write_override(name, value, actor, true).await
    }

    async fn write_override(
        &self,
        name: &str,
        value: PropertyValue,
        actor: &Actor,
        is_draft: bool,
    ) -> AdminResult<u64> {
        let action = if is_draft {
            actions::CONFIG_SAVE_DRAFT
        } else {
            actions::CONFIG_OVERRIDE
        };
        let property = self.definition(name)?;
        self.authorize(actor, name, action).await?;
        property
            .validate(&value)
            .map_err(|message| AdminError::validation(name, message))?;

        let raw = value.to_raw();
        let record = if is_draft {
            OverrideRecord::draft(name, raw.clone())
        } else {
            OverrideRecord::active(name, raw.clone())
        };

        let _guard = self.mutation_lock.lock().await;
        // 旧值取自存储而不是快照，其他实例写入的记录也会进入变更事件
        let previous = self.store.get(name).await?;
        self.store.put(record.clone()).await?;

        let current = self.snapshot.load_full();
        let version = self.install(&current, name, Some(record));

        let event = if is_draft {
            info!("暂存草稿: {} = '{}', 操作者 {}, 版本 {}", name, raw, actor, version);
            ConfigChangeEvent::draft_saved(name, raw, actor.id.clone(), version)
        } else {
            info!("写入覆盖: {} = '{}', 操作者 {}, 版本 {}", name, raw, actor, version);
            ConfigChangeEvent::overridden(
                name,
                previous.map(|record| record.value),
                raw,
                actor.id.clone(),
                version,
            )
        };
        self.publish(event);
        Ok(version)
    }

    /// 删除覆盖记录，返回当前版本号
    ///
    /// 没有覆盖记录时为空操作，版本号不变
    pub async fn reset(&self, name: &str, actor: &Actor) -> AdminResult<u64> {
        self.definition(name)?;
        self.authorize(actor, name, actions::CONFIG_RESET).await?;

        let _guard = self.mutation_lock.lock().await;
        let current = self.snapshot.load_full();
        let persisted = self.store.get(name).await?;
        let cached = current.get(name).cloned();

        if persisted.is_none() && cached.is_none() {
            debug!("配置项没有覆盖记录，重置为空操作: {}", name);
            return Ok(current.version);
        }

        if persisted.is_some() {
            self.store.delete(name).await?;
        }
        let version = self.install(&current, name, None);

        info!("重置覆盖: {}, 操作者 {}, 版本 {}", name, actor, version);
        let old_value = persisted.or(cached).map(|record| record.value);
        self.publish(ConfigChangeEvent::reset(
            name,
            old_value,
            actor.id.clone(),
            version,
        ));
        Ok(version)
    }

    /// 将草稿提升为生效覆盖，返回当前版本号
    ///
    /// 记录已生效时为空操作；没有记录时返回 [`AdminError::DraftNotFound`]
    pub async fn promote_draft(&self, name: &str, actor: &Actor) -> AdminResult<u64> {
        let property = self.definition(name)?;
        self.authorize(actor, name, actions::CONFIG_PROMOTE_DRAFT)
            .await?;

        let _guard = self.mutation_lock.lock().await;
        let current = self.snapshot.load_full();
        let Some(record) = self.store.get(name).await? else {
            return Err(AdminError::DraftNotFound {
                name: name.to_string(),
            });
        };

        if !record.is_draft {
            debug!("覆盖记录已生效，提升草稿为空操作: {}", name);
            return Ok(current.version);
        }

        property
            .parse_value(&record.value)
            .map_err(|message| AdminError::validation(name, message))?;

        let promoted = OverrideRecord::active(name, record.value.clone());
        self.store.put(promoted.clone()).await?;
        let version = self.install(&current, name, Some(promoted));

        info!(
            "提升草稿: {} = '{}', 操作者 {}, 版本 {}",
            name, record.value, actor, version
        );
        self.publish(ConfigChangeEvent::draft_promoted(
            name,
            record.value,
            actor.id.clone(),
            version,
        ));
        Ok(version)
    }

    /// 获取当前快照中的覆盖记录
    pub fn get_override(&self, name: &str) -> AdminResult<Option<OverrideRecord>> {
        self.definition(name)?;
        Ok(self.snapshot.load().get(name).cloned())
    }

    /// 当前版本号
    pub fn version(&self) -> u64 {
        self.snapshot.load().version
    }

    /// 当前快照
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.load_full()
    }

    /// 最近一次全量加载时间
    pub fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.load().last_refreshed_at
    }

    /// 距最近一次全量加载的秒数，从未加载时从注册表创建时算起
    pub fn age_seconds(&self) -> i64 {
        let since = self.last_refreshed_at().unwrap_or(self.created_at);
        (Utc::now() - since).num_seconds().max(0)
    }

    /// 生效中的覆盖记录数量
    pub fn active_override_count(&self) -> usize {
        self.snapshot.load().active_count()
    }

    /// 部署环境配置值
    pub fn environment(&self) -> &EnvironmentValues {
        &self.environment
    }

    /// 订阅配置变更事件
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChangeEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl Lifecycle for ConfigRegistry {
    async fn init(&self) -> Result<(), InfrastructureError> {
        self.lifecycle.transition(
            &[
                LifecycleState::Uninitialized,
                LifecycleState::Stopped,
                LifecycleState::Error,
            ],
            LifecycleState::Initializing,
        )?;

        info!("初始化配置注册表, 存储 {}", self.store.name());
        if let Err(e) = self.refresh(true).await {
            self.lifecycle.set(LifecycleState::Error);
            return Err(e.into());
        }

        self.lifecycle.set(LifecycleState::Running);
        info!(
            "配置注册表已就绪: {} 个配置项, 版本 {}",
            self.properties.read().len(),
            self.version()
        );
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), InfrastructureError> {
        self.lifecycle
            .transition(&[LifecycleState::Running], LifecycleState::Stopping)?;
        // 等待进行中的写操作结束
        let _guard = self.mutation_lock.lock().await;
        self.lifecycle.set(LifecycleState::Stopped);
        info!("配置注册表已关闭, 最终版本 {}", self.version());
        Ok(())
    }

    fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.get()
    }
}
