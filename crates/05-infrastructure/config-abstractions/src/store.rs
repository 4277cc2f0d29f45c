//! 覆盖记录存储抽象接口

use crate::property::OverrideRecord;
use async_trait::async_trait;
use infrastructure_common::AdminError;

/// 覆盖记录存储 trait
///
/// 持久化的唯一数据源，注册表只持有其读穿缓存。
/// 传输故障以 [`AdminError::StorageUnavailable`] 返回，由调用方决定是否重试。
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// 获取单条覆盖记录
    async fn get(&self, name: &str) -> Result<Option<OverrideRecord>, AdminError>;

    /// 获取全部覆盖记录
    async fn get_all(&self) -> Result<Vec<OverrideRecord>, AdminError>;

    /// 写入覆盖记录，同名记录被替换
    async fn put(&self, record: OverrideRecord) -> Result<(), AdminError>;

    /// 删除覆盖记录，记录不存在时不报错
    async fn delete(&self, name: &str) -> Result<(), AdminError>;

    /// 获取存储名称
    fn name(&self) -> &str;
}
