//! 文件配置源
//!
//! 支持 JSON/YAML/TOML/properties 格式，嵌套结构展开为点分 key。
//! 监听文件变化，解析成功后替换目标存储的快照，解析失败时保留旧快照。

use anyhow::Context;
use crossbeam::channel;
use garde::Validate;
use notify::{recommended_watcher, Event, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use smart_default::SmartDefault;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::impl_from;
use crate::map::{flatten_json, parse_properties, MapConfigMap, ReplaceableConfigMap};

/// 文件配置源的配置
#[derive(Debug, Clone, Serialize, Deserialize, SmartDefault, Validate)]
#[serde(default)]
pub struct FileSourceConfig {
    /// 配置文件路径
    #[garde(length(min = 1))]
    pub path: String,

    /// 文件格式，为空时按扩展名判断
    #[garde(skip)]
    pub format: Option<String>,

    /// 防抖时间（毫秒），期间的重复修改事件合并为一次重新加载
    #[default(100)]
    #[garde(range(max = 60000))]
    pub debounce_ms: u64,
}

/// 支持的文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
    Properties,
}

impl FileFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "yaml" | "yml" => Some(FileFormat::Yaml),
            "toml" => Some(FileFormat::Toml),
            "properties" | "props" => Some(FileFormat::Properties),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_name)
    }

    /// 解析文件内容为扁平存储
    pub fn parse(&self, content: &str) -> anyhow::Result<MapConfigMap> {
        let tree: JsonValue = match self {
            FileFormat::Properties => return Ok(parse_properties(content)),
            FileFormat::Json => serde_json::from_str(content)?,
            FileFormat::Yaml => serde_yaml::from_str(content)?,
            FileFormat::Toml => toml::from_str(content)?,
        };
        Ok(flatten_json(&tree)?)
    }
}

/// 文件配置源
///
/// # 示例
/// ```no_run
/// use config_facade::{ConfigFactory, FileSource, FileSourceConfig};
/// use std::sync::Arc;
///
/// let source = FileSource::new(FileSourceConfig {
///     path: "config/app.yaml".to_string(),
///     ..Default::default()
/// }).unwrap();
///
/// let config = ConfigFactory::from_config_map(Arc::new(source.load().unwrap()));
/// // 文件变化时自动替换 config 的底层快照，handle 被 drop 时停止监听
/// let handle = source.watch(config.config_map()).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: FileFormat,
    debounce: Duration,
}

impl FileSource {
    pub fn new(config: FileSourceConfig) -> Result<Self> {
        if let Err(errors) = config.validate() {
            return Err(ConfigError::Source(format!(
                "file source configuration validation failed: {}",
                errors
            )));
        }

        let path = PathBuf::from(&config.path);
        let format = match &config.format {
            Some(name) => FileFormat::from_name(name),
            None => FileFormat::from_path(&path),
        }
        .ok_or_else(|| {
            ConfigError::Source(format!("unsupported file format: {}", path.display()))
        })?;

        Ok(Self {
            path,
            format,
            debounce: Duration::from_millis(config.debounce_ms),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// 读取并解析文件
    pub fn load(&self) -> Result<MapConfigMap> {
        self.read()
            .map_err(|e| ConfigError::Source(format!("{:#}", e)))
    }

    fn read(&self) -> anyhow::Result<MapConfigMap> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        self.format
            .parse(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    /// 监听文件变化，每次成功解析后调用 `target.replace`
    ///
    /// 文件被删除或解析失败时记录日志并保留当前快照
    pub fn watch(&self, target: Arc<dyn ReplaceableConfigMap>) -> Result<WatchHandle> {
        let (event_tx, event_rx) = channel::unbounded();
        let mut watcher = recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                let _ = event_tx.send(event);
            }
        })
        .map_err(|e| ConfigError::Source(format!("failed to create file watcher: {}", e)))?;

        watcher
            .watch(&self.path, RecursiveMode::NonRecursive)
            .map_err(|e| {
                ConfigError::Source(format!("failed to watch {}: {}", self.path.display(), e))
            })?;

        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let source = self.clone();

        let thread_handle = thread::spawn(move || {
            // watcher 必须活到线程结束
            let _watcher = watcher;
            tracing::info!(path = %source.path.display(), "watching config file");

            loop {
                crossbeam::select! {
                    recv(stop_rx) -> _ => break,
                    recv(event_rx) -> event => {
                        let Ok(event) = event else { break };
                        if event.kind.is_remove() {
                            tracing::warn!(path = %source.path.display(), "config file removed, keeping current snapshot");
                            continue;
                        }
                        if !event.kind.is_modify() && !event.kind.is_create() {
                            continue;
                        }

                        // 防抖：合并这段时间内的重复事件
                        thread::sleep(source.debounce);
                        while event_rx.try_recv().is_ok() {}

                        source.reload_into(target.as_ref());
                    }
                }
            }

            tracing::info!(path = %source.path.display(), "stopped watching config file");
        });

        Ok(WatchHandle {
            stop_sender: Some(stop_tx),
            thread_handle: Some(thread_handle),
        })
    }

    fn reload_into(&self, target: &dyn ReplaceableConfigMap) {
        match self.read() {
            Ok(map) => {
                tracing::info!(path = %self.path.display(), keys = map.len(), "config file reloaded");
                target.replace(Arc::new(map));
            }
            Err(e) => {
                let error = format!("{:#}", e);
                tracing::error!(path = %self.path.display(), error = %error, "failed to reload config file");
            }
        }
    }
}

impl_from!(FileSourceConfig => FileSource, expect: "invalid file source configuration");

/// 监听句柄，drop 时停止监听线程
pub struct WatchHandle {
    stop_sender: Option<channel::Sender<()>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// 停止监听并等待线程退出
    pub fn stop(self) {
        drop(self)
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(sender) = self.stop_sender.take() {
            let _ = sender.send(());
        }
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}
