//! 配置值验证器

use crate::property::PropertyValue;
use regex::Regex;

/// 配置值验证器 trait
///
/// 在注册时挂到配置项上，写入覆盖值和读取持久化值时都会执行
pub trait PropertyValidator: Send + Sync {
    /// 验证配置值
    fn validate(&self, value: &PropertyValue) -> Result<(), String>;

    /// 获取验证器名称
    fn name(&self) -> &str;

    /// 获取验证器描述
    fn description(&self) -> Option<String> {
        None
    }
}

/// 整数范围验证器
#[derive(Debug, Clone)]
pub struct RangeValidator {
    min: Option<i64>,
    max: Option<i64>,
}

impl RangeValidator {
    /// 创建新的范围验证器，边界均为闭区间
    pub fn new(min: Option<i64>, max: Option<i64>) -> Self {
        Self { min, max }
    }

    /// 最小值约束
    pub fn at_least(min: i64) -> Self {
        Self::new(Some(min), None)
    }

    /// 闭区间约束
    pub fn between(min: i64, max: i64) -> Self {
        Self::new(Some(min), Some(max))
    }
}

impl PropertyValidator for RangeValidator {
    fn validate(&self, value: &PropertyValue) -> Result<(), String> {
        let Some(number) = value.as_int() else {
            return Err(format!("期望整数，实际为 '{}'", value));
        };
        if let Some(min) = self.min {
            if number < min {
                return Err(format!("值 {} 小于最小值 {}", number, min));
            }
        }
        if let Some(max) = self.max {
            if number > max {
                return Err(format!("值 {} 大于最大值 {}", number, max));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "RangeValidator"
    }

    fn description(&self) -> Option<String> {
        Some(format!(
            "范围: [{}, {}]",
            self.min.map_or_else(|| "-".to_string(), |v| v.to_string()),
            self.max.map_or_else(|| "-".to_string(), |v| v.to_string())
        ))
    }
}

/// 正则表达式验证器
#[derive(Debug, Clone)]
pub struct RegexValidator {
    pattern: Regex,
}

impl RegexValidator {
    /// 创建新的正则验证器
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl PropertyValidator for RegexValidator {
    fn validate(&self, value: &PropertyValue) -> Result<(), String> {
        let Some(text) = value.as_str() else {
            return Err(format!("期望字符串，实际为 '{}'", value));
        };
        if self.pattern.is_match(text) {
            Ok(())
        } else {
            Err(format!("值 '{}' 不匹配模式 {}", text, self.pattern.as_str()))
        }
    }

    fn name(&self) -> &str {
        "RegexValidator"
    }

    fn description(&self) -> Option<String> {
        Some(format!("模式: {}", self.pattern.as_str()))
    }
}

/// 非空字符串验证器
#[derive(Debug, Clone, Copy, Default)]
pub struct NonEmptyValidator;

impl PropertyValidator for NonEmptyValidator {
    fn validate(&self, value: &PropertyValue) -> Result<(), String> {
        match value.as_str() {
            Some(text) if !text.trim().is_empty() => Ok(()),
            Some(_) => Err("值不能为空".to_string()),
            None => Err(format!("期望字符串，实际为 '{}'", value)),
        }
    }

    fn name(&self) -> &str {
        "NonEmptyValidator"
    }
}
