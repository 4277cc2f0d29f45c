//! 配置项数据模型

use crate::validator::PropertyValidator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 配置项值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// 单行字符串
    String,
    /// 整数
    Integer,
    /// 布尔值
    Boolean,
    /// 多行文本
    MultilineText,
}

impl ValueType {
    /// 将持久化或环境中的原始文本解析为类型化值
    pub fn parse(&self, raw: &str) -> Result<PropertyValue, String> {
        match self {
            Self::String | Self::MultilineText => Ok(PropertyValue::Str(raw.to_string())),
            Self::Integer => raw
                .trim()
                .parse::<i64>()
                .map(PropertyValue::Int)
                .map_err(|e| format!("无法解析为整数: '{}' ({})", raw, e)),
            Self::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(PropertyValue::Bool(true)),
                "false" | "0" | "no" | "off" => Ok(PropertyValue::Bool(false)),
                _ => Err(format!("无法解析为布尔值: '{}'", raw)),
            },
        }
    }

    /// 值是否与类型匹配
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        matches!(
            (self, value),
            (Self::String | Self::MultilineText, PropertyValue::Str(_))
                | (Self::Integer, PropertyValue::Int(_))
                | (Self::Boolean, PropertyValue::Bool(_))
        )
    }

    /// 类型名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::MultilineText => "text",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 类型化配置值
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// 字符串或多行文本
    Str(String),
    /// 整数
    Int(i64),
    /// 布尔值
    Bool(bool),
}

impl PropertyValue {
    /// 序列化为持久化文本
    pub fn to_raw(&self) -> String {
        self.to_string()
    }

    /// 获取整数值
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// 获取布尔值
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// 获取字符串值
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => f.write_str(value),
            Self::Int(value) => write!(f, "{}", value),
            Self::Bool(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// 配置项定义
///
/// 名称在注册表生命周期内唯一，类型在注册时显式声明
#[derive(Clone)]
pub struct ConfigProperty {
    name: String,
    value_type: ValueType,
    default_value: PropertyValue,
    doc_string: String,
    requires_restart: bool,
    validators: Vec<Arc<dyn PropertyValidator>>,
}

impl fmt::Debug for ConfigProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigProperty")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("default_value", &self.default_value)
            .field("requires_restart", &self.requires_restart)
            .field(
                "validators",
                &self.validators.iter().map(|v| v.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ConfigProperty {
    /// 创建新的配置项定义
    pub fn new(
        name: impl Into<String>,
        value_type: ValueType,
        default_value: impl Into<PropertyValue>,
        doc_string: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value_type,
            default_value: default_value.into(),
            doc_string: doc_string.into(),
            requires_restart: false,
            validators: Vec::new(),
        }
    }

    /// 创建字符串配置项
    pub fn string(name: impl Into<String>, default_value: &str, doc_string: impl Into<String>) -> Self {
        Self::new(name, ValueType::String, default_value, doc_string)
    }

    /// 创建整数配置项
    pub fn integer(name: impl Into<String>, default_value: i64, doc_string: impl Into<String>) -> Self {
        Self::new(name, ValueType::Integer, default_value, doc_string)
    }

    /// 创建布尔配置项
    pub fn boolean(name: impl Into<String>, default_value: bool, doc_string: impl Into<String>) -> Self {
        Self::new(name, ValueType::Boolean, default_value, doc_string)
    }

    /// 创建多行文本配置项
    pub fn text(name: impl Into<String>, default_value: &str, doc_string: impl Into<String>) -> Self {
        Self::new(name, ValueType::MultilineText, default_value, doc_string)
    }

    /// 添加值验证器
    pub fn with_validator(mut self, validator: impl PropertyValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// 标记修改后需要重启才能生效
    pub fn with_requires_restart(mut self, requires_restart: bool) -> Self {
        self.requires_restart = requires_restart;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn default_value(&self) -> &PropertyValue {
        &self.default_value
    }

    pub fn doc_string(&self) -> &str {
        &self.doc_string
    }

    pub fn requires_restart(&self) -> bool {
        self.requires_restart
    }

    /// 带默认值说明的文档，文档为空时给出占位说明
    pub fn describe(&self) -> String {
        let doc = if self.doc_string.trim().is_empty() {
            "No documentation available."
        } else {
            self.doc_string.trim()
        };
        format!("{} Default: '{}'.", doc, self.default_value)
    }

    /// 校验类型化值
    pub fn validate(&self, value: &PropertyValue) -> Result<(), String> {
        if !self.value_type.accepts(value) {
            return Err(format!(
                "值 '{}' 与声明类型 {} 不匹配",
                value, self.value_type
            ));
        }
        for validator in &self.validators {
            validator
                .validate(value)
                .map_err(|message| format!("{}: {}", validator.name(), message))?;
        }
        Ok(())
    }

    /// 解析并校验原始文本
    pub fn parse_value(&self, raw: &str) -> Result<PropertyValue, String> {
        let value = self.value_type.parse(raw)?;
        self.validate(&value)?;
        Ok(value)
    }
}

/// 持久化的覆盖记录
///
/// 每个配置项至多一条，`is_draft` 为真时仅暂存、不参与正常解析
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    /// 配置项名称
    pub name: String,
    /// 序列化后的值
    pub value: String,
    /// 是否为草稿
    pub is_draft: bool,
}

impl OverrideRecord {
    /// 创建生效中的覆盖记录
    pub fn active(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_draft: false,
        }
    }

    /// 创建草稿覆盖记录
    pub fn draft(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_draft: true,
        }
    }
}

/// 生效值来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceClass {
    /// 注册时的默认值
    Default,
    /// 部署环境提供的值
    Environment,
    /// 已持久化的覆盖值
    PersistedOverride,
    /// 未提升的草稿覆盖值
    DraftOverride,
}

impl fmt::Display for SourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Default => "default",
            Self::Environment => "environment",
            Self::PersistedOverride => "persisted_override",
            Self::DraftOverride => "draft_override",
        };
        f.write_str(text)
    }
}

/// 解析得到的生效值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveValue {
    /// 生效值
    pub value: PropertyValue,
    /// 值来源
    pub source: SourceClass,
}

impl EffectiveValue {
    pub fn new(value: PropertyValue, source: SourceClass) -> Self {
        Self { value, source }
    }
}
