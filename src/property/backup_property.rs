use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

use super::relay::{ChangeSource, Relay};
use super::{Property, PropertyNode, PropertyValue};
use crate::error::Result;

/// 记住上游最后一个有效值的属性
///
/// 上游不存在或求值失败时返回最后一次读到的有效值，上游重新出现值后跟随新值
pub struct BackupProperty<T> {
    upstream: Property<T>,
    last: ArcSwap<T>,
    source: Option<Arc<dyn ChangeSource>>,
}

impl<T: PropertyValue> BackupProperty<T> {
    /// `seed` 是构造时读到的上游值
    pub fn new(upstream: Property<T>, seed: T) -> Self {
        let source = Relay::combine(upstream.change_source());
        Self {
            upstream,
            last: ArcSwap::from_pointee(seed),
            source,
        }
    }
}

impl<T: PropertyValue> PropertyNode<T> for BackupProperty<T> {
    fn key(&self) -> &str {
        self.upstream.key()
    }

    fn optional(&self) -> Result<Option<T>> {
        match self.upstream.optional() {
            Ok(Some(value)) => {
                self.last.store(Arc::new(value.clone()));
                Ok(Some(value))
            }
            other => {
                if let Err(err) = &other {
                    tracing::debug!(key = self.key(), error = %err, "using backup value");
                }
                Ok(Some(T::clone(&self.last.load())))
            }
        }
    }

    fn change_source(&self) -> Option<Arc<dyn ChangeSource>> {
        self.source.clone()
    }
}

impl<T: PropertyValue> fmt::Debug for BackupProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupProperty")
            .field("key", &self.upstream.key())
            .finish()
    }
}
