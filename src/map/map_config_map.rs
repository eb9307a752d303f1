use indexmap::IndexMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::core::{ConfigMap, ConfigValue};

/// 基于内存 map 的配置存储
///
/// 保持插入顺序；克隆得到的句柄共享同一份数据。
/// `insert` / `remove` 原地修改数据，不会触发任何变更通知，
/// 需要下游感知时由调用方在外层 `ReplaceableConfigMap` 上调用 `reload`。
///
/// # 示例
/// ```
/// use config_facade::{ConfigMap, MapConfigMap};
///
/// let map = MapConfigMap::new();
/// map.insert("server.port", 8080);
/// assert_eq!(map.get("server.port").unwrap().to_string_form(), "8080");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapConfigMap {
    entries: Arc<RwLock<IndexMap<String, ConfigValue>>>,
}

impl MapConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖一个原始值，返回旧值
    pub fn insert(&self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Option<ConfigValue> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into())
    }

    /// 删除一个原始值，保持剩余 key 的相对顺序
    pub fn remove(&self, key: &str) -> Option<ConfigValue> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> FromIterator<(K, V)> for MapConfigMap
where
    K: Into<String>,
    V: Into<ConfigValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<IndexMap<_, _>>();
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }
}

impl ConfigMap for MapConfigMap {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    fn raw_keys(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
