use std::sync::Arc;

use super::relay::ChangeSource;
use super::{PropertyNode, PropertyValue};
use crate::error::Result;

/// 固定值属性，值永远不变，也不产生变更事件
#[derive(Debug, Clone)]
pub struct StaticProperty<T> {
    key: String,
    value: Option<T>,
}

impl<T: PropertyValue> StaticProperty<T> {
    pub fn new(key: impl Into<String>, value: Option<T>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

impl<T: PropertyValue> PropertyNode<T> for StaticProperty<T> {
    fn key(&self) -> &str {
        &self.key
    }

    fn optional(&self) -> Result<Option<T>> {
        Ok(self.value.clone())
    }

    fn change_source(&self) -> Option<Arc<dyn ChangeSource>> {
        None
    }
}
