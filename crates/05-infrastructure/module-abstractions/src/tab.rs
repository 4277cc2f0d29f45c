//! 标签页绑定

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// 标签页内容回调
///
/// 返回交给外部渲染层的 JSON 文档
pub trait TabContent: Send + Sync {
    fn render(&self) -> serde_json::Value;
}

impl<F> TabContent for F
where
    F: Fn() -> serde_json::Value + Send + Sync,
{
    fn render(&self) -> serde_json::Value {
        self()
    }
}

/// 标签页绑定
///
/// 同一分组内按注册顺序排列，`href` 存在时表示外部链接
#[derive(Clone)]
pub struct TabBinding {
    group: String,
    key: String,
    label: String,
    href: Option<String>,
    target: Option<String>,
    content: Option<Arc<dyn TabContent>>,
}

impl fmt::Debug for TabBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabBinding")
            .field("group", &self.group)
            .field("key", &self.key)
            .field("label", &self.label)
            .field("href", &self.href)
            .field("target", &self.target)
            .field("has_content", &self.content.is_some())
            .finish()
    }
}

impl TabBinding {
    /// 创建标签页绑定
    pub fn new(group: impl Into<String>, key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            key: key.into(),
            label: label.into(),
            href: None,
            target: None,
            content: None,
        }
    }

    /// 设置外部链接
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// 设置链接打开目标
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// 设置内容回调
    pub fn with_content(mut self, content: impl TabContent + 'static) -> Self {
        self.content = Some(Arc::new(content));
        self
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// 渲染内容，没有内容回调时返回 `None`
    pub fn render(&self) -> Option<serde_json::Value> {
        self.content.as_ref().map(|content| content.render())
    }

    /// 导出不含回调的描述信息
    pub fn info(&self) -> TabInfo {
        TabInfo {
            group: self.group.clone(),
            key: self.key.clone(),
            label: self.label.clone(),
            href: self.href.clone(),
            target: self.target.clone(),
        }
    }
}

/// 标签页描述信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabInfo {
    pub group: String,
    pub key: String,
    pub label: String,
    pub href: Option<String>,
    pub target: Option<String>,
}
