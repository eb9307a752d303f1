//! 多订阅者回调列表
//!
//! 把一个事件广播给多个回调，每个回调提交到自己注册时指定的执行器。
//!
//! # 并发模型
//!
//! - 列表只追加：新节点以 CAS 方式插入到头部，指向旧的头节点
//! - 读取无锁：广播时加载一次头指针，得到注册时刻的快照
//! - 取消注册先清空节点中的回调槽位，下一次注册或广播时重建链表，去掉已取消的节点

use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::executor::Executor;
use crate::error::ConfigError;

/// 异步结果回调
///
/// 任何 `Fn(Result<V, ConfigError>)` 闭包都自动实现此 trait
pub trait FutureCallback<V>: Send + Sync {
    fn on_success(&self, value: V);

    fn on_failure(&self, error: ConfigError);
}

impl<V, F> FutureCallback<V> for F
where
    F: Fn(Result<V, ConfigError>) + Send + Sync,
{
    fn on_success(&self, value: V) {
        self(Ok(value))
    }

    fn on_failure(&self, error: ConfigError) {
        self(Err(error))
    }
}

trait Cancel: Send + Sync {
    fn cancel(&self);

    fn is_cancelled(&self) -> bool;
}

/// 监听句柄
///
/// 调用 `cancel` 后回调不再被触发，回调对象随即释放。
/// 丢弃句柄不会取消注册。
#[derive(Clone, Default)]
pub struct ListenerHandle {
    slots: Vec<Arc<dyn Cancel>>,
}

impl ListenerHandle {
    /// 不关联任何注册的句柄（例如静态属性上的监听）
    pub fn detached() -> Self {
        Self::default()
    }

    /// 合并多个句柄，取消时一并取消
    pub fn merge(handles: impl IntoIterator<Item = ListenerHandle>) -> Self {
        Self {
            slots: handles.into_iter().flat_map(|h| h.slots).collect(),
        }
    }

    pub fn cancel(&self) {
        for slot in &self.slots {
            slot.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_cancelled())
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("registrations", &self.slots.len())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

struct Registration<V> {
    callback: Arc<dyn FutureCallback<V>>,
    executor: Arc<dyn Executor>,
}

struct Slot<V> {
    registration: ArcSwapOption<Registration<V>>,
    // 所属列表中已取消但尚未移除的节点数
    cancelled: Arc<AtomicUsize>,
}

impl<V> Slot<V> {
    fn is_live(&self) -> bool {
        self.registration.load().is_some()
    }
}

impl<V> Cancel for Slot<V> {
    fn cancel(&self) {
        if self.registration.swap(None).is_some() {
            self.cancelled.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn is_cancelled(&self) -> bool {
        !self.is_live()
    }
}

struct Node<V> {
    slot: Arc<Slot<V>>,
    next: Option<Arc<Node<V>>>,
}

// 逐个释放后继节点，长链表不会递归析构
impl<V> Drop for Node<V> {
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut node) => next = node.next.take(),
                Err(_) => break,
            }
        }
    }
}

// 只保留仍然有效的节点，相对顺序不变
fn live_chain<V>(head: &Option<Arc<Node<V>>>) -> Option<Arc<Node<V>>> {
    let mut slots = Vec::new();
    let mut node = head.clone();
    while let Some(current) = node {
        if current.slot.is_live() {
            slots.push(Arc::clone(&current.slot));
        }
        node = current.next.clone();
    }
    slots.into_iter().rev().fold(None, |next, slot| {
        Some(Arc::new(Node { slot, next }))
    })
}

/// 回调执行列表
///
/// # 示例
/// ```
/// use config_facade::{CallbackExecutionList, ConfigError, DirectExecutor};
/// use std::sync::Arc;
///
/// let list = CallbackExecutionList::<String>::new();
/// let handle = list.add(
///     Arc::new(|result: Result<String, ConfigError>| println!("{:?}", result)),
///     DirectExecutor::shared(),
/// );
/// list.on_success("updated".to_string());
/// handle.cancel();
/// ```
pub struct CallbackExecutionList<V> {
    head: ArcSwapOption<Node<V>>,
    cancelled: Arc<AtomicUsize>,
}

impl<V> Default for CallbackExecutionList<V> {
    fn default() -> Self {
        Self {
            head: ArcSwapOption::empty(),
            cancelled: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<V> CallbackExecutionList<V>
where
    V: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册回调及其执行器
    pub fn add(
        &self,
        callback: Arc<dyn FutureCallback<V>>,
        executor: Arc<dyn Executor>,
    ) -> ListenerHandle {
        let slot = Arc::new(Slot {
            registration: ArcSwapOption::from_pointee(Registration {
                callback,
                executor,
            }),
            cancelled: Arc::clone(&self.cancelled),
        });

        let prune = self.cancelled.swap(0, Ordering::AcqRel) > 0;
        self.head.rcu(|head| {
            let next = if prune { live_chain(head) } else { head.clone() };
            Some(Arc::new(Node {
                slot: Arc::clone(&slot),
                next,
            }))
        });

        ListenerHandle { slots: vec![slot] }
    }

    /// 当前仍然有效的注册数量
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 向所有回调广播成功值
    pub fn on_success(&self, value: V) {
        for registration in self.snapshot() {
            let callback = Arc::clone(&registration.callback);
            let value = value.clone();
            registration
                .executor
                .execute(Box::new(move || callback.on_success(value)));
        }
    }

    /// 向所有回调广播失败
    pub fn on_failure(&self, error: ConfigError) {
        for registration in self.snapshot() {
            let callback = Arc::clone(&registration.callback);
            let error = error.clone();
            registration
                .executor
                .execute(Box::new(move || callback.on_failure(error)));
        }
    }

    /// 移除已取消的节点
    fn prune(&self) {
        if self.cancelled.swap(0, Ordering::AcqRel) > 0 {
            self.head.rcu(live_chain);
        }
    }

    /// 加载一次头指针，按注册顺序返回仍然有效的注册
    fn snapshot(&self) -> Vec<Arc<Registration<V>>> {
        self.prune();
        let mut registrations = Vec::new();
        let mut node = self.head.load_full();
        while let Some(current) = node {
            if let Some(registration) = current.slot.registration.load_full() {
                registrations.push(registration);
            }
            node = current.next.clone();
        }
        registrations.reverse();
        registrations
    }

    #[cfg(test)]
    fn node_count(&self) -> usize {
        let mut count = 0;
        let mut node = self.head.load_full();
        while let Some(current) = node {
            count += 1;
            node = current.next.clone();
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::executor::{DirectExecutor, ThreadPoolExecutor, ThreadPoolExecutorConfig};
    use crossbeam::channel;
    use std::sync::Mutex;
    use std::time::Duration;

    fn recorder(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<dyn FutureCallback<i32>> {
        Arc::new(move |result: Result<i32, ConfigError>| {
            let entry = match result {
                Ok(v) => format!("{}:ok:{}", name, v),
                Err(e) => format!("{}:err:{}", name, e),
            };
            log.lock().unwrap().push(entry);
        })
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let list = CallbackExecutionList::new();
        list.add(recorder("a", log.clone()), DirectExecutor::shared());
        list.add(recorder("b", log.clone()), DirectExecutor::shared());
        list.add(recorder("c", log.clone()), DirectExecutor::shared());

        list.on_success(1);
        list.on_failure(ConfigError::PropertyAbsent("x".to_string()));

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "a:ok:1",
                "b:ok:1",
                "c:ok:1",
                "a:err:Property 'x' is absent",
                "b:err:Property 'x' is absent",
                "c:err:Property 'x' is absent",
            ]
        );
    }

    #[test]
    fn test_cancel_skips_callback() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let list = CallbackExecutionList::new();
        let a = list.add(recorder("a", log.clone()), DirectExecutor::shared());
        list.add(recorder("b", log.clone()), DirectExecutor::shared());
        assert_eq!(list.len(), 2);

        a.cancel();
        assert!(a.is_cancelled());
        assert_eq!(list.len(), 1);

        list.on_success(7);
        assert_eq!(*log.lock().unwrap(), vec!["b:ok:7"]);
    }

    #[test]
    fn test_merged_handle() {
        let list = CallbackExecutionList::<i32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = list.add(recorder("a", log.clone()), DirectExecutor::shared());
        let b = list.add(recorder("b", log.clone()), DirectExecutor::shared());

        let merged = ListenerHandle::merge([a, b]);
        assert!(!merged.is_cancelled());
        merged.cancel();
        assert!(merged.is_cancelled());
        assert!(list.is_empty());
    }

    #[test]
    fn test_concurrent_add_and_dispatch() {
        let list = Arc::new(CallbackExecutionList::<i32>::new());
        let (tx, rx) = channel::unbounded();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let list = list.clone();
                let tx = tx.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let tx = tx.clone();
                        list.add(
                            Arc::new(move |r: Result<i32, ConfigError>| {
                                let _ = tx.send(r.unwrap());
                            }),
                            DirectExecutor::shared(),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(list.len(), 400);
        list.on_success(3);
        drop(tx);
        assert_eq!(rx.try_iter().count(), 400);
    }

    #[test]
    fn test_cancelled_nodes_are_removed() {
        let list = CallbackExecutionList::<i32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let keep = list.add(recorder("keep", log.clone()), DirectExecutor::shared());

        for _ in 0..10_000 {
            list.add(recorder("tmp", log.clone()), DirectExecutor::shared())
                .cancel();
        }
        assert!(list.node_count() <= 2);

        list.on_success(5);
        assert_eq!(list.node_count(), 1);
        assert_eq!(*log.lock().unwrap(), vec!["keep:ok:5"]);
        assert!(!keep.is_cancelled());
    }

    #[test]
    fn test_drop_long_list() {
        let list = CallbackExecutionList::<i32>::new();
        for _ in 0..200_000 {
            list.add(
                Arc::new(|_: Result<i32, ConfigError>| {}),
                DirectExecutor::shared(),
            );
        }
        assert_eq!(list.node_count(), 200_000);
        drop(list);
    }

    #[test]
    fn test_each_callback_uses_own_executor() {
        let pool: Arc<dyn Executor> = Arc::new(
            ThreadPoolExecutor::new(ThreadPoolExecutorConfig {
                worker_threads: 1,
                thread_name_prefix: "listener-pool".to_string(),
            })
            .unwrap(),
        );
        let (tx, rx) = channel::unbounded();
        let list = CallbackExecutionList::<i32>::new();

        let tx_inline = tx.clone();
        list.add(
            Arc::new(move |_: Result<i32, ConfigError>| {
                let name = std::thread::current().name().map(str::to_string);
                tx_inline.send(("inline", name)).unwrap();
            }),
            DirectExecutor::shared(),
        );
        list.add(
            Arc::new(move |_: Result<i32, ConfigError>| {
                let name = std::thread::current().name().map(str::to_string);
                tx.send(("pool", name)).unwrap();
            }),
            pool,
        );

        list.on_success(1);
        let mut events = vec![
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        ];
        events.sort();
        assert_eq!(events[0].0, "inline");
        assert_eq!(events[1], ("pool", Some("listener-pool-0".to_string())));
    }
}
