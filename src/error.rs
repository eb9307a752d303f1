use thiserror::Error;

/// 配置门面的错误类型
///
/// 所有变体都可以 Clone，因为同一个错误会被广播给多个监听器
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 路径格式非法（为空、以 '.' 开头或结尾）
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// 属性不存在时调用了 get()
    #[error("Property '{0}' is absent")]
    PropertyAbsent(String),

    /// 原始值存在但无法转换为目标类型
    #[error("Failed to convert '{key}' value '{value}' to {target}: {reason}")]
    Conversion {
        key: String,
        value: String,
        target: String,
        reason: String,
    },

    /// 没有为请求的类型注册转换器
    #[error("Unsupported property type: {0}")]
    UnsupportedType(String),

    /// 适配器（文件、环境变量等）加载失败
    #[error("Source error: {0}")]
    Source(String),
}

impl ConfigError {
    pub(crate) fn invalid_path(path: &str, reason: &str) -> Self {
        ConfigError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn conversion(value: &str, target: &str, reason: impl ToString) -> Self {
        ConfigError::Conversion {
            key: String::new(),
            value: value.to_string(),
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    /// 为转换错误补充原始 key，其他错误原样返回
    pub(crate) fn with_key(self, raw_key: &str) -> Self {
        match self {
            ConfigError::Conversion {
                value,
                target,
                reason,
                ..
            } => ConfigError::Conversion {
                key: raw_key.to_string(),
                value,
                target,
                reason,
            },
            other => other,
        }
    }
}

/// 本 crate 统一的 Result 别名
pub type Result<T> = std::result::Result<T, ConfigError>;
