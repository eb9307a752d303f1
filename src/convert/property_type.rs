use serde_json::Value as JsonValue;
use std::any::TypeId;
use std::fmt;
use std::str::FromStr;

use super::from_config_value::FromConfigValue;
use crate::error::{ConfigError, Result};
use crate::map::ConfigValue;

/// 内置支持的属性类型（封闭集合）
///
/// 通用代码可以按类型名或 `PropertyType` 分发，而不需要在运行时检查值的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    String,
    Boolean,
    Integer,
    Long,
    Double,
}

/// 按 `PropertyType` 转换得到的值
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    String(String),
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Double(f64),
}

impl PropertyType {
    pub const ALL: [PropertyType; 5] = [
        PropertyType::String,
        PropertyType::Boolean,
        PropertyType::Integer,
        PropertyType::Long,
        PropertyType::Double,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Boolean => "boolean",
            PropertyType::Integer => "integer",
            PropertyType::Long => "long",
            PropertyType::Double => "double",
        }
    }

    /// 按名称查找类型，大小写不敏感
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnsupportedType(name.to_string()))
    }

    /// Rust 类型对应的属性类型
    pub fn of<T: 'static>() -> Option<Self> {
        let id = TypeId::of::<T>();
        if id == TypeId::of::<String>() {
            Some(PropertyType::String)
        } else if id == TypeId::of::<bool>() {
            Some(PropertyType::Boolean)
        } else if id == TypeId::of::<i32>() {
            Some(PropertyType::Integer)
        } else if id == TypeId::of::<i64>() {
            Some(PropertyType::Long)
        } else if id == TypeId::of::<f64>() {
            Some(PropertyType::Double)
        } else {
            None
        }
    }

    /// 原始值的类型是否已经与本类型一致（无需转换）
    pub fn matches(&self, value: &ConfigValue) -> bool {
        match (self, value.as_value()) {
            (PropertyType::String, JsonValue::String(_)) => true,
            (PropertyType::Boolean, JsonValue::Bool(_)) => true,
            (PropertyType::Integer, JsonValue::Number(n)) => n
                .as_i64()
                .is_some_and(|v| i32::try_from(v).is_ok()),
            (PropertyType::Long, JsonValue::Number(n)) => n.is_i64(),
            (PropertyType::Double, JsonValue::Number(_)) => true,
            _ => false,
        }
    }

    /// 把原始值转换为本类型
    ///
    /// 原始值的类型已经一致时直接取出，否则从字符串形式解析
    pub fn convert(&self, value: &ConfigValue) -> Result<TypedValue> {
        let text;
        let value = if self.matches(value) {
            value
        } else {
            text = ConfigValue::from(value.to_string_form());
            &text
        };
        Ok(match self {
            PropertyType::String => TypedValue::String(String::from_config_value(value)?),
            PropertyType::Boolean => TypedValue::Boolean(bool::from_config_value(value)?),
            PropertyType::Integer => TypedValue::Integer(i32::from_config_value(value)?),
            PropertyType::Long => TypedValue::Long(i64::from_config_value(value)?),
            PropertyType::Double => TypedValue::Double(f64::from_config_value(value)?),
        })
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PropertyType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl TypedValue {
    pub fn property_type(&self) -> PropertyType {
        match self {
            TypedValue::String(_) => PropertyType::String,
            TypedValue::Boolean(_) => PropertyType::Boolean,
            TypedValue::Integer(_) => PropertyType::Integer,
            TypedValue::Long(_) => PropertyType::Long,
            TypedValue::Double(_) => PropertyType::Double,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::String(v) => f.write_str(v),
            TypedValue::Boolean(v) => write!(f, "{}", v),
            TypedValue::Integer(v) => write!(f, "{}", v),
            TypedValue::Long(v) => write!(f, "{}", v),
            TypedValue::Double(v) => write!(f, "{}", v),
        }
    }
}
