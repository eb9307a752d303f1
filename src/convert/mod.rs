//! convert 模块 - 原始值到类型化值的转换

pub mod from_config_value;
pub mod property_type;
pub mod registry;

pub use from_config_value::{deserialize_config_value, FromConfigValue};
pub use property_type::{PropertyType, TypedValue};
pub use registry::{converter_for, is_registered, register_converter, register_type, Converter};
