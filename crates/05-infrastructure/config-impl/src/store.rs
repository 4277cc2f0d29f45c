//! 覆盖记录存储实现

use async_trait::async_trait;
use config_abstractions::{OverrideRecord, PropertyStore};
use infrastructure_common::{AdminError, AdminResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// 内存覆盖记录存储
///
/// 主要用于测试，可以模拟存储不可用并统计读取次数
#[derive(Debug)]
pub struct InMemoryPropertyStore {
    records: RwLock<BTreeMap<String, OverrideRecord>>,
    available: AtomicBool,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl InMemoryPropertyStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            available: AtomicBool::new(true),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// 使用初始记录创建存储
    pub fn with_records(records: impl IntoIterator<Item = OverrideRecord>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.write();
            for record in records {
                map.insert(record.name.clone(), record);
            }
        }
        store
    }

    /// 设置存储是否可用
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// 读取次数（get 与 get_all）
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// 写入次数（put 与 delete）
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// 绕过注册表直接写入记录，模拟其他实例的修改
    pub fn insert_raw(&self, record: OverrideRecord) {
        self.records.write().insert(record.name.clone(), record);
    }

    /// 绕过注册表直接读取记录，不计入读取次数
    pub fn get_raw(&self, name: &str) -> Option<OverrideRecord> {
        self.records.read().get(name).cloned()
    }

    /// 绕过注册表直接删除记录
    pub fn remove_raw(&self, name: &str) {
        self.records.write().remove(name);
    }

    fn ensure_available(&self) -> AdminResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AdminError::storage("内存存储已被标记为不可用"))
        }
    }
}

impl Default for InMemoryPropertyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PropertyStore for InMemoryPropertyStore {
    async fn get(&self, name: &str) -> Result<Option<OverrideRecord>, AdminError> {
        self.ensure_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.read().get(name).cloned())
    }

    async fn get_all(&self) -> Result<Vec<OverrideRecord>, AdminError> {
        self.ensure_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.read().values().cloned().collect())
    }

    async fn put(&self, record: OverrideRecord) -> Result<(), AdminError> {
        self.ensure_available()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records.write().insert(record.name.clone(), record);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), AdminError> {
        self.ensure_available()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records.write().remove(name);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// 存储文件格式
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    records: Vec<OverrideRecord>,
}

/// JSON 文件覆盖记录存储
///
/// 每次写入都先写临时文件再重命名，避免读者看到半写入的文件
#[derive(Debug)]
pub struct JsonFilePropertyStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFilePropertyStore {
    /// 创建文件存储，文件不存在时视为空存储
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// 存储文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> AdminResult<BTreeMap<String, OverrideRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("存储文件不存在，视为空存储: {}", self.path.display());
                return Ok(BTreeMap::new());
            }
            Err(e) => {
                return Err(AdminError::storage(format!(
                    "读取存储文件失败: {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let document: StoreDocument = serde_json::from_str(&content).map_err(|e| {
            AdminError::storage(format!("存储文件格式错误: {}: {}", self.path.display(), e))
        })?;
        Ok(document
            .records
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect())
    }

    async fn save(&self, records: BTreeMap<String, OverrideRecord>) -> AdminResult<()> {
        let document = StoreDocument {
            records: records.into_values().collect(),
        };
        let content = serde_json::to_string_pretty(&document)
            .map_err(|e| AdminError::storage(format!("序列化覆盖记录失败: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AdminError::storage(format!("创建存储目录失败: {}", e)))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, content)
            .await
            .map_err(|e| AdminError::storage(format!("写入临时文件失败: {}", e)))?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            warn!("替换存储文件失败: {}", e);
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(AdminError::storage(format!("替换存储文件失败: {}", e)));
        }
        Ok(())
    }
}

#[async_trait]
impl PropertyStore for JsonFilePropertyStore {
    async fn get(&self, name: &str) -> Result<Option<OverrideRecord>, AdminError> {
        Ok(self.load().await?.remove(name))
    }

    async fn get_all(&self) -> Result<Vec<OverrideRecord>, AdminError> {
        Ok(self.load().await?.into_values().collect())
    }

    async fn put(&self, record: OverrideRecord) -> Result<(), AdminError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        records.insert(record.name.clone(), record);
        self.save(records).await
    }

    async fn delete(&self, name: &str) -> Result<(), AdminError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        if records.remove(name).is_none() {
            return Ok(());
        }
        self.save(records).await
    }

    fn name(&self) -> &str {
        "json_file"
    }
}
