use indexmap::IndexSet;
use std::sync::{Arc, Weak};

use super::core::{ConfigMap, ConfigValue};
use super::replaceable::{MapListener, ReplaceableConfigMap};
use crate::callback::{Executor, ListenerHandle};
use crate::error::ConfigError;

/// 带回退的配置存储
///
/// 查询时先查主存储，取不到再查回退存储，取第一个存在的原始值。
/// `replace` / `reload` 作用于主存储；监听器同时注册在主存储和（可替换的）回退存储上，
/// 收到的快照是两者当前快照的组合。
pub struct ChainedConfigMap {
    primary: Arc<dyn ReplaceableConfigMap>,
    fallback: Arc<dyn ConfigMap>,
}

impl ChainedConfigMap {
    pub fn new(primary: Arc<dyn ReplaceableConfigMap>, fallback: Arc<dyn ConfigMap>) -> Self {
        Self { primary, fallback }
    }

    /// 回退存储同样可替换时使用，它的变更也会通知监听器
    pub fn with_replaceable_fallback(
        primary: Arc<dyn ReplaceableConfigMap>,
        fallback: Arc<dyn ReplaceableConfigMap>,
    ) -> Self {
        Self::new(primary, Arc::new(ReplaceableFallback(fallback)))
    }

    fn fallback_snapshot(fallback: &Arc<dyn ConfigMap>) -> Arc<dyn ConfigMap> {
        match Arc::clone(fallback).as_replaceable() {
            Some(replaceable) => replaceable.snapshot(),
            None => Arc::clone(fallback),
        }
    }
}

// 把可替换存储当作普通 ConfigMap 持有，同时保留 as_replaceable
struct ReplaceableFallback(Arc<dyn ReplaceableConfigMap>);

impl ConfigMap for ReplaceableFallback {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.0.get(key)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    fn raw_keys(&self) -> Vec<String> {
        self.0.raw_keys()
    }

    fn as_replaceable(self: Arc<Self>) -> Option<Arc<dyn ReplaceableConfigMap>> {
        Some(Arc::clone(&self.0))
    }
}

/// 两个快照组合成的只读视图
struct ChainedSnapshot {
    primary: Arc<dyn ConfigMap>,
    fallback: Arc<dyn ConfigMap>,
}

impl ConfigMap for ChainedSnapshot {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.primary.get(key).or_else(|| self.fallback.get(key))
    }

    fn contains_key(&self, key: &str) -> bool {
        self.primary.contains_key(key) || self.fallback.contains_key(key)
    }

    fn raw_keys(&self) -> Vec<String> {
        self.primary
            .raw_keys()
            .into_iter()
            .chain(self.fallback.raw_keys())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }
}

impl ConfigMap for ChainedConfigMap {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.primary.get(key).or_else(|| self.fallback.get(key))
    }

    fn contains_key(&self, key: &str) -> bool {
        self.primary.contains_key(key) || self.fallback.contains_key(key)
    }

    fn raw_keys(&self) -> Vec<String> {
        self.snapshot().raw_keys()
    }

    fn as_replaceable(self: Arc<Self>) -> Option<Arc<dyn ReplaceableConfigMap>> {
        Some(self)
    }
}

impl ReplaceableConfigMap for ChainedConfigMap {
    fn replace(&self, map: Arc<dyn ConfigMap>) {
        self.primary.replace(map);
    }

    fn reload(&self) {
        self.primary.reload();
    }

    fn snapshot(&self) -> Arc<dyn ConfigMap> {
        Arc::new(ChainedSnapshot {
            primary: self.primary.snapshot(),
            fallback: Self::fallback_snapshot(&self.fallback),
        })
    }

    fn add_listener(&self, listener: MapListener, executor: Arc<dyn Executor>) -> ListenerHandle {
        // 监听器挂在主存储上，只持有弱引用，避免 存储 -> 监听器 -> 存储 的循环
        let primary: Weak<dyn ReplaceableConfigMap> = Arc::downgrade(&self.primary);
        let fallback: Weak<dyn ConfigMap> = Arc::downgrade(&self.fallback);
        let forward: MapListener = Arc::new(
            move |result: Result<Arc<dyn ConfigMap>, ConfigError>| {
                let (Some(primary), Some(fallback)) = (primary.upgrade(), fallback.upgrade()) else {
                    return;
                };
                match result {
                    Ok(_) => listener.on_success(Arc::new(ChainedSnapshot {
                        primary: primary.snapshot(),
                        fallback: ChainedConfigMap::fallback_snapshot(&fallback),
                    })),
                    Err(e) => listener.on_failure(e),
                }
            },
        );

        let mut handles = vec![self
            .primary
            .add_listener(Arc::clone(&forward), Arc::clone(&executor))];
        if let Some(fallback) = Arc::clone(&self.fallback).as_replaceable() {
            handles.push(fallback.add_listener(forward, executor));
        }
        ListenerHandle::merge(handles)
    }
}
