use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::callback::{Executor, ListenerHandle};
use crate::convert::{converter_for, FromConfigValue, PropertyType, TypedValue};
use crate::error::{ConfigError, Result};
use crate::map::{ChainedConfigMap, ConfigMap, ConfigValue, MapListener, ReplaceableConfigMap};
use crate::property::{ChangeSource, MapNotifier, Property, PropertyValue, SupplierProperty};

/// 路径分隔符
pub const SEPARATOR: char = '.';

/// 配置视图
///
/// 在扁平的点分 key 存储之上提供层级访问。视图由底层可替换存储和基础路径组成，
/// 相对路径 `p` 解析为原始 key `base + p`。`at_path` 只创建新视图，不复制数据。
///
/// # 示例
/// ```
/// use config_facade::ConfigFactory;
///
/// let config = ConfigFactory::from_pairs([("db.host", "localhost"), ("db.port", "5432")]);
/// let db = config.at_path("db").unwrap();
///
/// assert_eq!(db.get_string("host").get().unwrap(), "localhost");
/// assert_eq!(db.get_integer("port").get().unwrap(), 5432);
/// assert_eq!(db.get_keys(), vec!["host", "port"]);
/// ```
#[derive(Clone)]
pub struct Config {
    map: Arc<dyn ReplaceableConfigMap>,
    base: String,
}

impl Config {
    /// 根视图
    pub fn new(map: Arc<dyn ReplaceableConfigMap>) -> Self {
        Self {
            map,
            base: String::new(),
        }
    }

    /// 子路径视图，新的基础路径为 `base + path + "."`
    pub fn at_path(&self, path: &str) -> Result<Config> {
        validate_path(path)?;
        Ok(Self {
            map: Arc::clone(&self.map),
            base: format!("{}{}{}", self.base, path, SEPARATOR),
        })
    }

    /// 当前基础路径，根视图为空字符串，其余以 '.' 结尾
    pub fn current_path(&self) -> &str {
        &self.base
    }

    /// 相对路径对应的原始 key
    pub fn resolve(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn has_path(&self, path: &str) -> bool {
        self.map.contains_key(&self.resolve(path))
    }

    /// 原始值
    pub fn get(&self, path: &str) -> Option<ConfigValue> {
        self.map.get(&self.resolve(path))
    }

    pub fn get_string(&self, path: &str) -> Property<String> {
        self.get_as(path)
    }

    pub fn get_long(&self, path: &str) -> Property<i64> {
        self.get_as(path)
    }

    pub fn get_integer(&self, path: &str) -> Property<i32> {
        self.get_as(path)
    }

    pub fn get_boolean(&self, path: &str) -> Property<bool> {
        self.get_as(path)
    }

    pub fn get_double(&self, path: &str) -> Property<f64> {
        self.get_as(path)
    }

    /// 按编译期已知的 `FromConfigValue` 实现绑定属性
    pub fn get_as<T>(&self, path: &str) -> Property<T>
    where
        T: FromConfigValue + PropertyValue,
    {
        self.bind(path, T::from_config_value)
    }

    /// 按注册表中的转换器绑定属性，未注册的类型在绑定时返回 `UnsupportedType`
    pub fn get_property<T: PropertyValue>(&self, path: &str) -> Result<Property<T>> {
        let converter = converter_for::<T>()?;
        Ok(self.bind(path, move |value| converter(value)))
    }

    /// 使用自定义转换函数绑定属性，转换函数接收原始值的字符串形式
    pub fn get_property_with<T, F>(&self, path: &str, converter: F) -> Property<T>
    where
        T: PropertyValue,
        F: Fn(&str) -> Result<T> + Send + Sync + 'static,
    {
        self.bind(path, move |value| converter(&value.to_string_form()))
    }

    /// 按运行时给出的类型绑定属性
    pub fn get_typed(&self, path: &str, property_type: PropertyType) -> Property<TypedValue> {
        self.bind(path, move |value| property_type.convert(value))
    }

    /// 直接子节点名称
    pub fn get_keys(&self) -> Vec<String> {
        self.get_paths()
            .into_iter()
            .filter(|path| !path.contains(SEPARATOR))
            .collect()
    }

    /// 所有后代路径（去掉基础路径）
    pub fn get_paths(&self) -> Vec<String> {
        self.descendants(&self.map.snapshot())
    }

    /// 带回退的新视图：先查当前存储，再查 `fallback`
    ///
    /// 两者按同一个原始 key 查询，基础路径保持不变。
    /// 新视图的 replace / reload 作用于当前存储；`fallback` 可替换时它的变更同样会通知监听器
    pub fn with_fallback(&self, fallback: Arc<dyn ConfigMap>) -> Config {
        let chained = ChainedConfigMap::new(Arc::clone(&self.map), fallback);
        Self {
            map: Arc::new(chained),
            base: self.base.clone(),
        }
    }

    /// 当前视图下所有原始值
    pub fn to_map(&self) -> IndexMap<String, ConfigValue> {
        let snapshot = self.map.snapshot();
        self.descendants(&snapshot)
            .into_iter()
            .filter_map(|path| {
                let value = snapshot.get(&self.resolve(&path))?;
                Some((path, value))
            })
            .collect()
    }

    /// 当前视图下所有值的字符串形式
    pub fn to_properties(&self) -> IndexMap<String, String> {
        self.to_map()
            .into_iter()
            .map(|(path, value)| (path, value.to_string_form()))
            .collect()
    }

    /// 每行一个 `path=value`，以换行开头
    pub fn pretty_print(&self) -> String {
        let mut out = String::from("\n");
        for (path, value) in self.to_properties() {
            out.push_str(&path);
            out.push('=');
            out.push_str(&value);
            out.push('\n');
        }
        out
    }

    /// 替换整个底层存储（与视图的基础路径无关）
    pub fn replace(&self, map: Arc<dyn ConfigMap>) {
        self.map.replace(map);
    }

    pub fn reload(&self) {
        self.map.reload();
    }

    pub fn add_listener(&self, listener: MapListener, executor: Arc<dyn Executor>) -> ListenerHandle {
        self.map.add_listener(listener, executor)
    }

    /// 底层可替换存储
    pub fn config_map(&self) -> Arc<dyn ReplaceableConfigMap> {
        Arc::clone(&self.map)
    }

    fn descendants(&self, snapshot: &Arc<dyn ConfigMap>) -> Vec<String> {
        snapshot
            .raw_keys()
            .into_iter()
            .filter(|key| key != &self.base && key.starts_with(&self.base))
            .map(|key| key[self.base.len()..].to_string())
            .collect()
    }

    fn bind<T, F>(&self, path: &str, converter: F) -> Property<T>
    where
        T: PropertyValue,
        F: Fn(&ConfigValue) -> Result<T> + Send + Sync + 'static,
    {
        let raw_key = self.resolve(path);
        let map = Arc::clone(&self.map);
        let key = raw_key.clone();
        let source: Arc<dyn ChangeSource> = Arc::new(MapNotifier::new(Arc::clone(&self.map)));

        Property::from_node(Arc::new(SupplierProperty::new(
            raw_key,
            move || match map.get(&key) {
                Some(value) => converter(&value).map(Some).map_err(|e| e.with_key(&key)),
                None => Ok(None),
            },
            Some(source),
        )))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_path", &self.base)
            .field("keys", &self.get_paths().len())
            .finish()
    }
}

fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ConfigError::invalid_path(path, "path should not be empty"));
    }
    if path.starts_with(SEPARATOR) {
        return Err(ConfigError::invalid_path(path, "path should not start with a '.'"));
    }
    if path.ends_with(SEPARATOR) {
        return Err(ConfigError::invalid_path(path, "path should not end with a '.'"));
    }
    Ok(())
}
