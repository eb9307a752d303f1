//! 变更通知中继
//!
//! 属性组合子不直接订阅配置存储，而是通过 `ChangeSource` 订阅上游：
//!
//! - `MapNotifier` 把 `ReplaceableConfigMap` 的 replace / reload 事件转换为无参信号
//! - `Relay` 是组合子自己的本地通知器，对每个不同的上游只订阅一次，
//!   然后通过自己的 `CallbackExecutionList` 向本地监听器扇出
//!
//! 同一个上游（按 `source_id` 判断）在一个 Relay 中只会被订阅一次，
//! 因此一次 replace 对同一个组合子只触发一次事件。

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::callback::{CallbackExecutionList, DirectExecutor, ListenerHandle};
use crate::error::ConfigError;
use crate::map::{ConfigMap, ReplaceableConfigMap};

/// 无参变更信号
pub type Signal = Arc<dyn Fn() + Send + Sync>;

/// 变更事件来源
pub trait ChangeSource: Send + Sync {
    /// 来源标识，相同标识的来源被视为同一个上游
    fn source_id(&self) -> usize;

    /// 订阅变更信号，信号在通知线程上同步执行
    fn subscribe(&self, signal: Signal) -> ListenerHandle;
}

/// 把可替换存储的变更事件转换为信号
pub struct MapNotifier {
    map: Arc<dyn ReplaceableConfigMap>,
}

impl MapNotifier {
    pub fn new(map: Arc<dyn ReplaceableConfigMap>) -> Self {
        Self { map }
    }
}

impl ChangeSource for MapNotifier {
    fn source_id(&self) -> usize {
        Arc::as_ptr(&self.map) as *const () as usize
    }

    fn subscribe(&self, signal: Signal) -> ListenerHandle {
        self.map.add_listener(
            Arc::new(move |_: Result<Arc<dyn ConfigMap>, ConfigError>| signal()),
            DirectExecutor::shared(),
        )
    }
}

/// 组合子的本地通知器
///
/// 第一次有本地订阅时（或调用 `attach` 时）才向上游订阅，之后不再重复订阅。
/// 上游持有的只是 Relay 的弱引用，Relay 被释放时取消全部上游订阅。
pub struct Relay {
    this: Weak<Relay>,
    upstreams: Vec<Arc<dyn ChangeSource>>,
    on_change: Option<Signal>,
    attached: OnceCell<ListenerHandle>,
    listeners: CallbackExecutionList<()>,
}

impl Relay {
    /// 合并多个上游
    ///
    /// 没有上游时返回 `None`。即使只有一个上游也创建新的 Relay，
    /// 组合子上的本地监听器再多，上游也只看到一个订阅
    pub fn combine(
        upstreams: impl IntoIterator<Item = Arc<dyn ChangeSource>>,
    ) -> Option<Arc<dyn ChangeSource>> {
        let upstreams = dedup(upstreams);
        if upstreams.is_empty() {
            return None;
        }
        Some(Self::new(upstreams, None) as Arc<dyn ChangeSource>)
    }

    /// 创建带钩子的 Relay，钩子在本地扇出之前执行
    pub fn with_hook(
        upstreams: impl IntoIterator<Item = Arc<dyn ChangeSource>>,
        on_change: Signal,
    ) -> Arc<Self> {
        Self::new(dedup(upstreams), Some(on_change))
    }

    fn new(upstreams: Vec<Arc<dyn ChangeSource>>, on_change: Option<Signal>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            upstreams,
            on_change,
            attached: OnceCell::new(),
            listeners: CallbackExecutionList::new(),
        })
    }

    /// 向所有上游订阅，重复调用无副作用
    pub fn attach(&self) {
        self.attached.get_or_init(|| {
            let handles = self.upstreams.iter().map(|upstream| {
                let this = self.this.clone();
                upstream.subscribe(Arc::new(move || {
                    if let Some(relay) = this.upgrade() {
                        relay.fire();
                    }
                }))
            });
            ListenerHandle::merge(handles.collect::<Vec<_>>())
        });
    }

    /// 本地监听器数量
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn fire(&self) {
        if let Some(hook) = &self.on_change {
            hook();
        }
        self.listeners.on_success(());
    }
}

impl ChangeSource for Relay {
    fn source_id(&self) -> usize {
        self as *const Relay as usize
    }

    fn subscribe(&self, signal: Signal) -> ListenerHandle {
        self.attach();
        self.listeners.add(
            Arc::new(move |_: Result<(), ConfigError>| signal()),
            DirectExecutor::shared(),
        )
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        if let Some(handle) = self.attached.get() {
            handle.cancel();
        }
    }
}

impl fmt::Debug for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay")
            .field("upstreams", &self.upstreams.len())
            .field("attached", &self.attached.get().is_some())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn dedup(upstreams: impl IntoIterator<Item = Arc<dyn ChangeSource>>) -> Vec<Arc<dyn ChangeSource>> {
    let mut unique: Vec<Arc<dyn ChangeSource>> = Vec::new();
    for upstream in upstreams {
        if !unique.iter().any(|u| u.source_id() == upstream.source_id()) {
            unique.push(upstream);
        }
    }
    unique
}
