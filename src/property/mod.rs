//! property 模块 - 惰性求值的类型化属性
//!
//! `Property<T>` 是一个可廉价克隆的句柄，内部是五种节点之一：
//!
//! - `StaticProperty`：固定值
//! - `SupplierProperty`：每次读取都重新求值（绑定到配置路径的属性）
//! - `ChainedProperty`：按顺序回退（`or`）
//! - `CachedProperty`：缓存到下一次上游变更（`cache`）
//! - `BackupProperty`：上游缺失时使用最后一个有效值（`backup`）
//!
//! 所有节点对外只暴露 `key`、`optional` 与变更来源，组合子之间不互相探查内部状态。
//!
//! # 示例
//! ```
//! use config_facade::Property;
//!
//! let port = Property::<i32>::absent().or([Property::of(8080)]);
//! assert_eq!(port.get().unwrap(), 8080);
//! ```

pub mod backup_property;
pub mod cached_property;
pub mod chained_property;
pub mod relay;
pub mod static_property;
pub mod supplier_property;

pub use backup_property::BackupProperty;
pub use cached_property::CachedProperty;
pub use chained_property::ChainedProperty;
pub use relay::{ChangeSource, MapNotifier, Relay, Signal};
pub use static_property::StaticProperty;
pub use supplier_property::{Evaluator, SupplierProperty};

use std::fmt;
use std::sync::Arc;

use crate::callback::{Executor, FutureCallback, ListenerHandle};
use crate::error::{ConfigError, Result};

/// 属性值需要满足的约束
pub trait PropertyValue: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> PropertyValue for T where T: Clone + fmt::Debug + Send + Sync + 'static {}

/// 属性节点
///
/// `optional` 的三种结果：`Ok(Some(v))` 存在、`Ok(None)` 不存在、`Err(e)` 求值失败
pub trait PropertyNode<T>: Send + Sync {
    /// 诊断用的名称，组合子沿用最内层属性的 key
    fn key(&self) -> &str;

    fn optional(&self) -> Result<Option<T>>;

    /// 变更事件来源，不会变化的属性返回 `None`
    fn change_source(&self) -> Option<Arc<dyn ChangeSource>>;
}

/// 类型化的配置属性
pub struct Property<T> {
    node: Arc<dyn PropertyNode<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
        }
    }
}

impl<T: PropertyValue> Property<T> {
    /// 固定值属性
    pub fn of(value: T) -> Self {
        Self::named("", value)
    }

    /// 带名称的固定值属性
    pub fn named(key: impl Into<String>, value: T) -> Self {
        Self::from_node(Arc::new(StaticProperty::new(key, Some(value))))
    }

    /// 永远不存在的属性
    pub fn absent() -> Self {
        Self::from_node(Arc::new(StaticProperty::new("", None)))
    }

    /// 每次读取都调用 `f` 求值的属性，没有变更事件
    pub fn from_fn<F>(key: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Result<Option<T>> + Send + Sync + 'static,
    {
        Self::from_node(Arc::new(SupplierProperty::new(key, f, None)))
    }

    pub fn from_node(node: Arc<dyn PropertyNode<T>>) -> Self {
        Self { node }
    }

    pub fn key(&self) -> &str {
        self.node.key()
    }

    /// 当前值，不存在时返回 `Ok(None)`
    pub fn optional(&self) -> Result<Option<T>> {
        self.node.optional()
    }

    /// 当前值，不存在时返回 `PropertyAbsent`
    pub fn get(&self) -> Result<T> {
        self.optional()?
            .ok_or_else(|| ConfigError::PropertyAbsent(self.key().to_string()))
    }

    /// 当前值，不存在时返回默认值；求值错误仍然返回错误
    pub fn get_or(&self, default: T) -> Result<T> {
        Ok(self.optional()?.unwrap_or(default))
    }

    /// 值是否存在，求值失败视为不存在
    pub fn is_present(&self) -> bool {
        matches!(self.optional(), Ok(Some(_)))
    }

    /// 缓存当前值，直到上游下一次变更
    pub fn cache(&self) -> Self {
        Self::from_node(Arc::new(CachedProperty::new(self.clone())))
    }

    /// 上游缺失或失败时使用最后一个有效值
    ///
    /// 构造时立即读取一次作为初始备份，此时不存在则返回错误
    pub fn backup(&self) -> Result<Self> {
        let seed = self.get()?;
        Ok(Self::from_node(Arc::new(BackupProperty::new(
            self.clone(),
            seed,
        ))))
    }

    /// 依次回退到其他属性或字面值
    ///
    /// ```
    /// use config_facade::Property;
    ///
    /// let host = Property::<String>::absent().or(["localhost".to_string()]);
    /// assert_eq!(host.get().unwrap(), "localhost");
    /// ```
    pub fn or<I, A>(&self, alternatives: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Property<T>>,
    {
        let rest = alternatives.into_iter().map(Into::into).collect();
        Self::from_node(Arc::new(ChainedProperty::new(self.clone(), rest)))
    }

    /// 注册监听器
    ///
    /// 注册时立即投递一次当前结果，之后每次上游变更都重新求值并投递。
    /// 求值在通知线程上进行，回调在 `executor` 上执行；
    /// 不存在时回调收到 `PropertyAbsent`。
    pub fn add_listener<C>(&self, callback: C, executor: Arc<dyn Executor>) -> ListenerHandle
    where
        C: FutureCallback<T> + 'static,
    {
        let callback: Arc<dyn FutureCallback<T>> = Arc::new(callback);

        // 先订阅再投递，保证不会漏掉两者之间发生的变更
        let handle = match self.change_source() {
            Some(source) => {
                let property = self.clone();
                let callback = Arc::clone(&callback);
                let executor = Arc::clone(&executor);
                source.subscribe(Arc::new(move || property.deliver(&callback, &executor)))
            }
            None => ListenerHandle::detached(),
        };

        self.deliver(&callback, &executor);
        handle
    }

    /// 变更事件来源
    pub fn change_source(&self) -> Option<Arc<dyn ChangeSource>> {
        self.node.change_source()
    }

    /// 转换为读取函数
    pub fn supplier(&self) -> impl Fn() -> Result<T> + Send + Sync + 'static {
        let property = self.clone();
        move || property.get()
    }

    fn deliver(&self, callback: &Arc<dyn FutureCallback<T>>, executor: &Arc<dyn Executor>) {
        let result = self.get();
        let callback = Arc::clone(callback);
        executor.execute(Box::new(move || match result {
            Ok(value) => callback.on_success(value),
            Err(err) => callback.on_failure(err),
        }));
    }
}

impl<T: PropertyValue> From<T> for Property<T> {
    fn from(value: T) -> Self {
        Property::of(value)
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("key", &self.node.key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::DirectExecutor;
    use crate::map::{ConfigMap, MapConfigMap, ReplaceableConfigMap, VolatileConfigMap};
    use std::sync::Mutex;

    fn live(map: &Arc<VolatileConfigMap>, key: &str) -> Property<String> {
        let snapshot = Arc::clone(map);
        let raw_key = key.to_string();
        Property::from_node(Arc::new(SupplierProperty::new(
            key,
            move || Ok(snapshot.get(&raw_key).map(|v| v.to_string_form())),
            Some(Arc::new(MapNotifier::new(map.clone())) as Arc<dyn ChangeSource>),
        )))
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl FutureCallback<String>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        let callback = move |result: Result<String>| {
            let entry = match result {
                Ok(v) => format!("ok:{}", v),
                Err(e) => format!("err:{}", e),
            };
            events_clone.lock().unwrap().push(entry);
        };
        (events, callback)
    }

    #[test]
    fn test_get_and_absent() {
        let p = Property::named("port", 80);
        assert_eq!(p.get().unwrap(), 80);
        assert!(p.is_present());
        assert_eq!(p.key(), "port");

        let absent = Property::<i32>::absent();
        assert_eq!(absent.get().unwrap_err(), ConfigError::PropertyAbsent(String::new()));
        assert_eq!(absent.get_or(5).unwrap(), 5);
        assert!(!absent.is_present());
    }

    #[test]
    fn test_is_present_treats_error_as_absent() {
        let p = Property::<i32>::from_fn("bad", || Err(ConfigError::conversion("x", "i32", "nope")));
        assert!(!p.is_present());
        assert!(p.get_or(1).is_err());
    }

    #[test]
    fn test_or_first_present_wins() {
        let a = Property::<String>::absent();
        let b = Property::of("x".to_string());
        let c = Property::of("y".to_string());
        assert_eq!(a.or([b, c]).get().unwrap(), "x");
    }

    #[test]
    fn test_cache_invalidated_only_by_events() {
        let inner = MapConfigMap::from_iter([("host", "a")]);
        let map = Arc::new(VolatileConfigMap::new(Arc::new(inner.clone())));
        let cached = live(&map, "host").cache();

        assert_eq!(cached.get().unwrap(), "a");
        inner.insert("host", "b");
        assert_eq!(cached.get().unwrap(), "a");

        map.reload();
        assert_eq!(cached.get().unwrap(), "b");
    }

    #[test]
    fn test_backup_survives_absence() {
        let map = Arc::new(VolatileConfigMap::new(Arc::new(MapConfigMap::from_iter([("k", "v1")]))));
        let backup = live(&map, "k").backup().unwrap();

        map.replace(Arc::new(MapConfigMap::new()));
        assert_eq!(backup.get().unwrap(), "v1");

        map.replace(Arc::new(MapConfigMap::from_iter([("k", "v2")])));
        assert_eq!(backup.get().unwrap(), "v2");

        assert!(Property::<String>::absent().backup().is_err());
    }

    #[test]
    fn test_listener_receives_initial_and_updates() {
        let inner = MapConfigMap::from_iter([("host", "localhost")]);
        let map = Arc::new(VolatileConfigMap::new(Arc::new(inner.clone())));
        let (events, callback) = recorder();

        let handle = live(&map, "host").add_listener(callback, DirectExecutor::shared());
        inner.insert("host", "remote");
        map.reload();
        map.replace(Arc::new(MapConfigMap::new()));

        handle.cancel();
        map.reload();

        assert_eq!(
            *events.lock().unwrap(),
            vec!["ok:localhost", "ok:remote", "err:Property 'host' is absent"]
        );
    }

    #[test]
    fn test_listener_on_static_property() {
        let (events, callback) = recorder();
        let handle = Property::of("fixed".to_string()).add_listener(callback, DirectExecutor::shared());
        assert!(handle.is_cancelled());
        assert_eq!(*events.lock().unwrap(), vec!["ok:fixed"]);
    }

    #[test]
    fn test_chain_over_same_map_fires_once() {
        let map = Arc::new(VolatileConfigMap::new(Arc::new(MapConfigMap::from_iter([("b", "2")]))));
        let chain = live(&map, "a").or([live(&map, "b")]);
        let (events, callback) = recorder();

        chain.add_listener(callback, DirectExecutor::shared());
        map.replace(Arc::new(MapConfigMap::from_iter([("a", "1")])));

        assert_eq!(*events.lock().unwrap(), vec!["ok:2", "ok:1"]);
        assert_eq!(map.listener_count(), 1);
    }

    #[test]
    fn test_cached_listener_sees_fresh_value() {
        let inner = MapConfigMap::from_iter([("host", "a")]);
        let map = Arc::new(VolatileConfigMap::new(Arc::new(inner.clone())));
        let cached = live(&map, "host").cache();
        let (events, callback) = recorder();

        cached.add_listener(callback, DirectExecutor::shared());
        inner.insert("host", "b");
        map.reload();

        assert_eq!(*events.lock().unwrap(), vec!["ok:a", "ok:b"]);
    }

    #[test]
    fn test_supplier() {
        let read = Property::of(3).supplier();
        assert_eq!(read().unwrap(), 3);
    }
}
