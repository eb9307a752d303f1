//! 可热替换的配置存储
//!
//! 把任意 `ConfigMap` 放进一个可原子替换的槽位，替换或重新加载时通知所有监听器

use arc_swap::ArcSwap;
use std::sync::Arc;

use super::core::{ConfigMap, ConfigValue};
use crate::callback::{CallbackExecutionList, Executor, FutureCallback, ListenerHandle};

/// 配置存储变更监听器，收到的是变更后的完整快照
pub type MapListener = Arc<dyn FutureCallback<Arc<dyn ConfigMap>>>;

/// 支持热替换的配置存储
pub trait ReplaceableConfigMap: ConfigMap {
    /// 原子地安装新的快照，然后同步通知所有监听器
    fn replace(&self, map: Arc<dyn ConfigMap>);

    /// 不修改快照，仅以当前快照重新通知所有监听器
    fn reload(&self);

    /// 当前快照
    fn snapshot(&self) -> Arc<dyn ConfigMap>;

    /// 注册监听器，之后每一次 replace / reload 都会触发
    fn add_listener(&self, listener: MapListener, executor: Arc<dyn Executor>) -> ListenerHandle;
}

/// 基于 ArcSwap 槽位的可替换配置存储
///
/// 读操作无锁，读者永远只能看到完整的旧快照或完整的新快照
///
/// # 示例
/// ```
/// use config_facade::{ConfigMap, MapConfigMap, ReplaceableConfigMap, VolatileConfigMap};
/// use std::sync::Arc;
///
/// let map = VolatileConfigMap::new(Arc::new(MapConfigMap::from_iter([("host", "a")])));
/// map.replace(Arc::new(MapConfigMap::from_iter([("host", "b")])));
/// assert_eq!(map.get("host").unwrap().to_string_form(), "b");
/// ```
pub struct VolatileConfigMap {
    current: ArcSwap<Arc<dyn ConfigMap>>,
    listeners: CallbackExecutionList<Arc<dyn ConfigMap>>,
}

impl VolatileConfigMap {
    pub fn new(map: Arc<dyn ConfigMap>) -> Self {
        Self {
            current: ArcSwap::from_pointee(map),
            listeners: CallbackExecutionList::new(),
        }
    }

    /// 当前注册的监听器数量
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl ConfigMap for VolatileConfigMap {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.current.load().get(key)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.current.load().contains_key(key)
    }

    fn raw_keys(&self) -> Vec<String> {
        self.snapshot().raw_keys()
    }

    fn as_replaceable(self: Arc<Self>) -> Option<Arc<dyn ReplaceableConfigMap>> {
        Some(self)
    }
}

impl ReplaceableConfigMap for VolatileConfigMap {
    fn replace(&self, map: Arc<dyn ConfigMap>) {
        self.current.store(Arc::new(Arc::clone(&map)));
        tracing::debug!(
            listeners = self.listeners.len(),
            "config map replaced, notifying listeners"
        );
        self.listeners.on_success(map);
    }

    fn reload(&self) {
        let map = self.snapshot();
        tracing::debug!(
            listeners = self.listeners.len(),
            "config map reloaded, notifying listeners"
        );
        self.listeners.on_success(map);
    }

    fn snapshot(&self) -> Arc<dyn ConfigMap> {
        Arc::clone(&**self.current.load())
    }

    fn add_listener(&self, listener: MapListener, executor: Arc<dyn Executor>) -> ListenerHandle {
        self.listeners.add(listener, executor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::DirectExecutor;
    use crate::error::ConfigError;
    use crate::map::MapConfigMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn map_of(pairs: &[(&str, &str)]) -> Arc<dyn ConfigMap> {
        Arc::new(pairs.iter().copied().collect::<MapConfigMap>())
    }

    #[test]
    fn test_replace_swaps_snapshot_and_notifies() {
        let map = VolatileConfigMap::new(map_of(&[("host", "localhost")]));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        map.add_listener(
            Arc::new(move |result: Result<Arc<dyn ConfigMap>, ConfigError>| {
                let snapshot = result.unwrap();
                seen_clone
                    .lock()
                    .unwrap()
                    .push(snapshot.get("host").map(|v| v.to_string_form()));
            }),
            DirectExecutor::shared(),
        );

        assert_eq!(map.get("host"), Some(ConfigValue::from("localhost")));

        map.replace(map_of(&[("host", "remote")]));
        assert_eq!(map.get("host"), Some(ConfigValue::from("remote")));

        map.replace(map_of(&[]));
        assert!(!map.contains_key("host"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("remote".to_string()), None]
        );
    }

    #[test]
    fn test_reload_renotifies_current_snapshot() {
        let inner = MapConfigMap::from_iter([("a", "1")]);
        let map = VolatileConfigMap::new(Arc::new(inner.clone()));
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        map.add_listener(
            Arc::new(move |result: Result<Arc<dyn ConfigMap>, ConfigError>| {
                assert_eq!(result.unwrap().get("a"), Some(ConfigValue::from("2")));
                count_clone.fetch_add(1, Ordering::SeqCst);
            }),
            DirectExecutor::shared(),
        );

        inner.insert("a", "2");
        map.reload();
        map.reload();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(map.listener_count(), 1);
    }

    #[test]
    fn test_cancelled_listener_is_not_notified() {
        let map = VolatileConfigMap::new(map_of(&[]));
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let handle = map.add_listener(
            Arc::new(move |_: Result<Arc<dyn ConfigMap>, ConfigError>| {
                count_clone.fetch_add(1, Ordering::SeqCst);
            }),
            DirectExecutor::shared(),
        );

        map.reload();
        handle.cancel();
        map.reload();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(map.listener_count(), 0);
    }

    #[test]
    fn test_raw_keys_from_single_snapshot() {
        let map = Arc::new(VolatileConfigMap::new(map_of(&[("a", "1"), ("b", "2")])));
        let snapshot = map.snapshot();
        map.replace(map_of(&[("c", "3")]));

        assert_eq!(snapshot.raw_keys(), vec!["a", "b"]);
        assert_eq!(map.raw_keys(), vec!["c"]);
    }

    #[test]
    fn test_as_replaceable() {
        let plain: Arc<dyn ConfigMap> = map_of(&[]);
        assert!(plain.as_replaceable().is_none());

        let volatile: Arc<dyn ConfigMap> = Arc::new(VolatileConfigMap::new(map_of(&[])));
        assert!(volatile.as_replaceable().is_some());
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let map = Arc::new(VolatileConfigMap::new(map_of(&[("a", "0"), ("b", "0")])));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let map = map.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let snapshot = map.snapshot();
                        assert_eq!(snapshot.get("a"), snapshot.get("b"));
                    }
                })
            })
            .collect();

        for i in 1..200 {
            let v = i.to_string();
            map.replace(map_of(&[("a", v.as_str()), ("b", v.as_str())]));
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
