use std::fmt;
use std::sync::Arc;

use super::relay::{ChangeSource, Relay};
use super::{Property, PropertyNode, PropertyValue};
use crate::error::Result;

/// 按顺序回退的属性链
///
/// 返回第一个存在的成员值。除最后一个成员外，成员的错误都被视为不存在，
/// 最后一个成员的结果（包括错误）原样返回。
/// 多个成员来自同一个配置存储时，变更事件只订阅一次。
pub struct ChainedProperty<T> {
    key: String,
    head: Property<T>,
    rest: Vec<Property<T>>,
    source: Option<Arc<dyn ChangeSource>>,
}

impl<T: PropertyValue> ChainedProperty<T> {
    pub fn new(head: Property<T>, rest: Vec<Property<T>>) -> Self {
        let source = Relay::combine(
            std::iter::once(&head)
                .chain(rest.iter())
                .filter_map(|member| member.change_source()),
        );
        Self {
            key: head.key().to_string(),
            head,
            rest,
            source,
        }
    }

    fn members(&self) -> impl Iterator<Item = &Property<T>> {
        std::iter::once(&self.head).chain(self.rest.iter())
    }
}

impl<T: PropertyValue> PropertyNode<T> for ChainedProperty<T> {
    fn key(&self) -> &str {
        &self.key
    }

    fn optional(&self) -> Result<Option<T>> {
        let last = self.members().count() - 1;
        for (index, member) in self.members().enumerate() {
            match member.optional() {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) if index < last => continue,
                Err(err) if index < last => {
                    tracing::debug!(key = member.key(), error = %err, "chain member failed, trying next");
                    continue;
                }
                result => return result,
            }
        }
        Ok(None)
    }

    fn change_source(&self) -> Option<Arc<dyn ChangeSource>> {
        self.source.clone()
    }
}

impl<T> fmt::Debug for ChainedProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedProperty")
            .field("key", &self.key)
            .field("members", &(self.rest.len() + 1))
            .finish()
    }
}
