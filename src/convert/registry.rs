// 类型转换器注册表

use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::from_config_value::FromConfigValue;
use crate::error::{ConfigError, Result};
use crate::map::ConfigValue;

/// 原始值到目标类型的转换函数
pub type Converter<T> = Arc<dyn Fn(&ConfigValue) -> Result<T> + Send + Sync>;

// 全局注册表：key 为目标类型的 TypeId，value 为 Converter<T>
static REGISTRY: Lazy<RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>> = Lazy::new(|| {
    let mut registry: HashMap<TypeId, Box<dyn Any + Send + Sync>> = HashMap::new();
    insert_builtin::<String>(&mut registry);
    insert_builtin::<bool>(&mut registry);
    insert_builtin::<i32>(&mut registry);
    insert_builtin::<i64>(&mut registry);
    insert_builtin::<f64>(&mut registry);
    RwLock::new(registry)
});

fn insert_builtin<T>(registry: &mut HashMap<TypeId, Box<dyn Any + Send + Sync>>)
where
    T: FromConfigValue + 'static,
{
    let converter: Converter<T> = Arc::new(T::from_config_value);
    registry.insert(TypeId::of::<T>(), Box::new(converter));
}

/// 注册实现了 FromConfigValue 的类型
///
/// # 示例
/// ```
/// use config_facade::{register_type, ConfigFactory};
///
/// register_type::<u16>().unwrap();
/// let config = ConfigFactory::from_pairs([("port", "8080")]);
/// assert_eq!(config.get_property::<u16>("port").unwrap().get().unwrap(), 8080);
/// ```
pub fn register_type<T>() -> Result<()>
where
    T: FromConfigValue + 'static,
{
    register_converter::<T, _>(T::from_config_value)
}

/// 为类型注册自定义转换函数，已存在时覆盖
pub fn register_converter<T, F>(converter: F) -> Result<()>
where
    T: 'static,
    F: Fn(&ConfigValue) -> Result<T> + Send + Sync + 'static,
{
    let converter: Converter<T> = Arc::new(converter);
    let mut registry = REGISTRY
        .write()
        .map_err(|_| ConfigError::Source("Failed to acquire write lock".to_string()))?;
    registry.insert(TypeId::of::<T>(), Box::new(converter));
    Ok(())
}

/// 查找类型对应的转换函数，未注册时返回 UnsupportedType
pub fn converter_for<T: 'static>() -> Result<Converter<T>> {
    let registry = REGISTRY
        .read()
        .map_err(|_| ConfigError::Source("Failed to acquire read lock".to_string()))?;

    registry
        .get(&TypeId::of::<T>())
        .and_then(|entry| entry.downcast_ref::<Converter<T>>())
        .cloned()
        .ok_or_else(|| ConfigError::UnsupportedType(std::any::type_name::<T>().to_string()))
}

/// 类型是否已注册
pub fn is_registered<T: 'static>() -> bool {
    REGISTRY
        .read()
        .map(|registry| registry.contains_key(&TypeId::of::<T>()))
        .unwrap_or(false)
}
