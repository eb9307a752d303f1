//! 把配置视图绑定到结构体
//!
//! 通常通过 `#[derive(BindConfig)]` 生成实现，每个字段在绑定时解析一次：
//!
//! - `Property<T>` 字段保持动态，之后的读取总能看到最新值
//! - `Option<T>` 字段读取一次 `optional()`，不存在时为 `None`
//! - 其他字段读取一次 `get()`，不存在时绑定失败
//! - `#[config(key = "...")]` 指定路径，默认使用字段名
//! - `#[config(nested)]` 字段在子路径视图上递归绑定
//!
//! # 示例
//! ```
//! use config_facade::{Bind, BindConfig, ConfigFactory, Property};
//!
//! #[derive(BindConfig)]
//! struct Server {
//!     host: Property<String>,
//!     port: i32,
//!     #[config(key = "tls.enabled")]
//!     tls: Option<bool>,
//! }
//!
//! let config = ConfigFactory::from_pairs([("host", "localhost"), ("port", "8080")]);
//! let server = Server::bind(&config).unwrap();
//! assert_eq!(server.host.get().unwrap(), "localhost");
//! assert_eq!(server.port, 8080);
//! assert_eq!(server.tls, None);
//! ```

use super::view::Config;
use crate::error::Result;

/// 可以从配置视图构造的类型
pub trait Bind: Sized {
    fn bind(config: &Config) -> Result<Self>;
}

impl Config {
    /// 在子路径上绑定
    pub fn bind_at<T: Bind>(&self, path: &str) -> Result<T> {
        T::bind(&self.at_path(path)?)
    }
}
