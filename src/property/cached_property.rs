use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

use super::relay::{ChangeSource, Relay};
use super::{Property, PropertyNode, PropertyValue};
use crate::error::Result;

enum CacheState<T> {
    Empty,
    Populated(Option<T>),
}

/// 缓存上游结果的属性
///
/// 构造时立即订阅上游，每次上游变更都清空缓存，下一次读取时重新计算。
/// 缓存只因变更事件失效，与时间无关；求值错误不会被缓存。
pub struct CachedProperty<T> {
    upstream: Property<T>,
    slot: Arc<ArcSwap<CacheState<T>>>,
    relay: Option<Arc<Relay>>,
}

impl<T: PropertyValue> CachedProperty<T> {
    pub fn new(upstream: Property<T>) -> Self {
        let slot = Arc::new(ArcSwap::from_pointee(CacheState::Empty));
        let relay = upstream.change_source().map(|source| {
            let slot = Arc::clone(&slot);
            let key = upstream.key().to_string();
            let relay = Relay::with_hook(
                [source],
                Arc::new(move || {
                    tracing::debug!(key = %key, "cached property invalidated");
                    slot.store(Arc::new(CacheState::Empty));
                }),
            );
            relay.attach();
            relay
        });

        Self {
            upstream,
            slot,
            relay,
        }
    }

    /// 缓存中是否已有值
    pub fn is_populated(&self) -> bool {
        matches!(**self.slot.load(), CacheState::Populated(_))
    }
}

impl<T: PropertyValue> PropertyNode<T> for CachedProperty<T> {
    fn key(&self) -> &str {
        self.upstream.key()
    }

    fn optional(&self) -> Result<Option<T>> {
        let current = self.slot.load_full();
        if let CacheState::Populated(value) = &*current {
            return Ok(value.clone());
        }

        let value = self.upstream.optional()?;
        // 计算期间如果发生了失效，槽位已被替换，CAS 失败即放弃写入
        let _ = self.slot.compare_and_swap(
            &current,
            Arc::new(CacheState::Populated(value.clone())),
        );
        Ok(value)
    }

    fn change_source(&self) -> Option<Arc<dyn ChangeSource>> {
        self.relay
            .as_ref()
            .map(|relay| Arc::clone(relay) as Arc<dyn ChangeSource>)
    }
}

impl<T: PropertyValue> fmt::Debug for CachedProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedProperty")
            .field("key", &self.upstream.key())
            .finish()
    }
}
