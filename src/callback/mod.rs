//! callback 模块 - 变更通知广播

pub mod execution_list;
pub mod executor;

pub use execution_list::{CallbackExecutionList, FutureCallback, ListenerHandle};
pub use executor::{
    DirectExecutor, Executor, Task, ThreadPoolExecutor, ThreadPoolExecutorConfig, TokioExecutor,
};
