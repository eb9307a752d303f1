use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{ConfigError, Result};
use crate::map::ConfigValue;

/// 从原始配置值转换为目标类型的 trait
///
/// 原始值的类型已经与目标类型一致时直接使用，否则从其字符串形式解析。
/// 结构体等复杂类型可以通过 `#[derive(FromConfigValue)]` 使用 JSON 反序列化。
pub trait FromConfigValue: Sized {
    fn from_config_value(value: &ConfigValue) -> Result<Self>;
}

impl FromConfigValue for String {
    fn from_config_value(value: &ConfigValue) -> Result<Self> {
        Ok(value.to_string_form())
    }
}

/// 只有忽略大小写的 "true" 为真，其余字符串一律为假
impl FromConfigValue for bool {
    fn from_config_value(value: &ConfigValue) -> Result<Self> {
        if let JsonValue::Bool(b) = value.as_value() {
            return Ok(*b);
        }
        Ok(value.to_string_form().eq_ignore_ascii_case("true"))
    }
}

// 整数类型：JSON 数字在目标范围内时直接使用
macro_rules! impl_from_config_value_integer {
    ($($ty:ty),*) => {
        $(
            impl FromConfigValue for $ty {
                fn from_config_value(value: &ConfigValue) -> Result<Self> {
                    if let Some(n) = value.as_value().as_i64() {
                        if let Ok(v) = <$ty>::try_from(n) {
                            return Ok(v);
                        }
                    }
                    if let Some(n) = value.as_value().as_u64() {
                        if let Ok(v) = <$ty>::try_from(n) {
                            return Ok(v);
                        }
                    }
                    parse_string_form(value, stringify!($ty))
                }
            }
        )*
    };
}

// 浮点类型：任何 JSON 数字都直接使用
macro_rules! impl_from_config_value_float {
    ($($ty:ty),*) => {
        $(
            impl FromConfigValue for $ty {
                fn from_config_value(value: &ConfigValue) -> Result<Self> {
                    if let Some(n) = value.as_value().as_f64() {
                        return Ok(n as $ty);
                    }
                    parse_string_form(value, stringify!($ty))
                }
            }
        )*
    };
}

impl_from_config_value_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize);
impl_from_config_value_float!(f32, f64);

// serde_json::Value 总是原样返回
impl FromConfigValue for JsonValue {
    fn from_config_value(value: &ConfigValue) -> Result<Self> {
        Ok(value.as_value().clone())
    }
}

impl FromConfigValue for ConfigValue {
    fn from_config_value(value: &ConfigValue) -> Result<Self> {
        Ok(value.clone())
    }
}

fn parse_string_form<T>(value: &ConfigValue, target: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let text = value.to_string_form();
    text.parse()
        .map_err(|e| ConfigError::conversion(&text, target, e))
}

/// 通过 JSON 反序列化转换复杂类型
///
/// 原始值是字符串时按 JSON 文本解析，其余情况直接从 JSON 值反序列化。
/// `#[derive(FromConfigValue)]` 生成的实现调用此函数。
pub fn deserialize_config_value<T: DeserializeOwned>(value: &ConfigValue) -> Result<T> {
    let target = std::any::type_name::<T>();
    match value.as_value() {
        JsonValue::String(text) => serde_json::from_str(text)
            .map_err(|e| ConfigError::conversion(text, target, e)),
        other => serde_json::from_value(other.clone())
            .map_err(|e| ConfigError::conversion(&value.to_string_form(), target, e)),
    }
}
