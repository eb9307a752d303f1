//! 配置存储抽象
//!
//! 提供扁平的、以点分 key 寻址的配置存储接口，本身不包含任何层级语义

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

use super::replaceable::ReplaceableConfigMap;
use crate::error::{ConfigError, Result};

/// 原始配置值包装
///
/// 可以是字符串、数字、布尔值，也可以是嵌套对象或数组
///
/// # 示例
/// ```
/// use config_facade::ConfigValue;
///
/// let value = ConfigValue::from("8080");
/// assert_eq!(value.to_string_form(), "8080");
///
/// let value = ConfigValue::from(8080);
/// assert_eq!(value.to_string_form(), "8080");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValue(pub JsonValue);

impl ConfigValue {
    /// 创建新的 ConfigValue
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    /// 转换为指定类型（消费 self）
    pub fn into_type<T: DeserializeOwned>(self) -> Result<T> {
        let text = self.to_string_form();
        serde_json::from_value(self.0)
            .map_err(|e| ConfigError::conversion(&text, std::any::type_name::<T>(), e))
    }

    /// 引用方式转换为指定类型
    pub fn as_type<T: DeserializeOwned>(&self) -> Result<T> {
        self.clone().into_type()
    }

    /// 获取内部的 JsonValue 引用
    pub fn as_value(&self) -> &JsonValue {
        &self.0
    }

    /// 获取内部的 JsonValue（消费 self）
    pub fn into_value(self) -> JsonValue {
        self.0
    }

    /// 如果原始值本身是字符串，返回其引用
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// 值的字符串形式：字符串原样返回，其余类型返回 JSON 文本
    pub fn to_string_form(&self) -> String {
        match &self.0 {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_form())
    }
}

impl From<JsonValue> for ConfigValue {
    fn from(value: JsonValue) -> Self {
        Self(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self(JsonValue::String(value.to_string()))
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self(JsonValue::String(value))
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self(JsonValue::Bool(value))
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        Self(JsonValue::from(value))
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self(JsonValue::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self(JsonValue::from(value))
    }
}

/// 扁平配置存储
///
/// 所有适配器（内存 map、properties、序列化对象、环境变量、文件）都实现此 trait
pub trait ConfigMap: Send + Sync {
    /// 读取原始 key 对应的值，不存在时返回 None
    fn get(&self, key: &str) -> Option<ConfigValue>;

    /// 判断原始 key 是否存在
    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// 返回当前快照中所有原始 key，适配器应尽量保持插入顺序
    fn raw_keys(&self) -> Vec<String>;

    /// 如果自身已经支持替换，返回可替换视图
    fn as_replaceable(self: Arc<Self>) -> Option<Arc<dyn ReplaceableConfigMap>> {
        None
    }
}

impl fmt::Debug for dyn ConfigMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigMap")
            .field("keys", &self.raw_keys())
            .finish()
    }
}
