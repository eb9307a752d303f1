use std::fmt;
use std::sync::Arc;

use super::relay::ChangeSource;
use super::{PropertyNode, PropertyValue};
use crate::error::Result;

/// 属性求值函数
pub type Evaluator<T> = Arc<dyn Fn() -> Result<Option<T>> + Send + Sync>;

/// 每次读取都重新求值的属性
///
/// 绑定到配置路径的属性都是这种类型：求值函数每次都从当前快照读取，
/// 变更事件来自配置存储本身
pub struct SupplierProperty<T> {
    key: String,
    evaluator: Evaluator<T>,
    source: Option<Arc<dyn ChangeSource>>,
}

impl<T: PropertyValue> SupplierProperty<T> {
    pub fn new<F>(key: impl Into<String>, evaluator: F, source: Option<Arc<dyn ChangeSource>>) -> Self
    where
        F: Fn() -> Result<Option<T>> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            evaluator: Arc::new(evaluator),
            source,
        }
    }
}

impl<T: PropertyValue> PropertyNode<T> for SupplierProperty<T> {
    fn key(&self) -> &str {
        &self.key
    }

    fn optional(&self) -> Result<Option<T>> {
        (self.evaluator)()
    }

    fn change_source(&self) -> Option<Arc<dyn ChangeSource>> {
        self.source.clone()
    }
}

impl<T> fmt::Debug for SupplierProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupplierProperty")
            .field("key", &self.key)
            .field("observable", &self.source.is_some())
            .finish()
    }
}
