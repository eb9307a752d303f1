//! 回调执行上下文
//!
//! 每个监听器在注册时指定自己的执行器：
//! - `DirectExecutor`：在通知线程上同步执行
//! - `ThreadPoolExecutor`：提交到独立的 Rayon 线程池
//! - `TokioExecutor`：提交到 tokio 运行时的阻塞线程池

use garde::Validate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::sync::Arc;

use crate::error::{ConfigError, Result};
use crate::impl_from;

/// 提交给执行器的任务
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// 执行上下文抽象
pub trait Executor: Send + Sync {
    /// 执行（或排队）一个任务，不等待任务完成
    fn execute(&self, task: Task);
}

/// 在调用线程上直接执行任务
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectExecutor;

static DIRECT_EXECUTOR: Lazy<Arc<dyn Executor>> = Lazy::new(|| Arc::new(DirectExecutor));

impl DirectExecutor {
    /// 共享的直接执行器实例
    pub fn shared() -> Arc<dyn Executor> {
        Arc::clone(&DIRECT_EXECUTOR)
    }
}

impl Executor for DirectExecutor {
    fn execute(&self, task: Task) {
        task()
    }
}

/// 线程池执行器配置
#[derive(Debug, Clone, Serialize, Deserialize, SmartDefault, Validate)]
#[serde(default)]
pub struct ThreadPoolExecutorConfig {
    /// 工作线程数
    #[default(num_cpus::get())]
    #[garde(range(min = 1, max = 1024))]
    pub worker_threads: usize,

    /// 线程名前缀
    #[default = "config-callback"]
    #[garde(length(min = 1))]
    pub thread_name_prefix: String,
}

/// 基于 Rayon 线程池的执行器
///
/// 线程池在创建时初始化一次，之后所有回调复用同一组线程
///
/// # 示例
/// ```no_run
/// use config_facade::{Executor, ThreadPoolExecutor, ThreadPoolExecutorConfig};
///
/// let executor = ThreadPoolExecutor::new(ThreadPoolExecutorConfig {
///     worker_threads: 2,
///     ..Default::default()
/// }).unwrap();
/// executor.execute(Box::new(|| println!("running on pool")));
/// ```
pub struct ThreadPoolExecutor {
    pool: rayon::ThreadPool,
}

impl ThreadPoolExecutor {
    pub fn new(config: ThreadPoolExecutorConfig) -> Result<Self> {
        if let Err(errors) = config.validate() {
            return Err(ConfigError::Source(format!(
                "thread pool configuration validation failed: {}",
                errors
            )));
        }

        let prefix = config.thread_name_prefix.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(move |i| format!("{}-{}", prefix, i))
            .build()
            .map_err(|e| ConfigError::Source(format!("failed to build thread pool: {}", e)))?;

        Ok(Self { pool })
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl_from!(ThreadPoolExecutorConfig => ThreadPoolExecutor, expect: "invalid thread pool configuration");

impl Executor for ThreadPoolExecutor {
    fn execute(&self, task: Task) {
        self.pool.spawn(task);
    }
}

/// 基于 tokio 运行时的执行器，回调在阻塞线程池中运行
#[derive(Clone)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

impl TokioExecutor {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// 绑定到当前上下文中的 tokio 运行时
    pub fn current() -> Result<Self> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| ConfigError::Source(format!("no tokio runtime available: {}", e)))
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, task: Task) {
        drop(self.handle.spawn_blocking(task));
    }
}
