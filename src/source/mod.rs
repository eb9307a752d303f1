//! source 模块 - 外部配置来源
//!
//! 从文件加载扁平配置，并在文件变化时替换可替换存储中的快照

pub mod file_source;

pub use file_source::{FileFormat, FileSource, FileSourceConfig, WatchHandle};
