//! config-facade - 类型化、按路径寻址、可热替换的配置门面
//!
//! 应用代码通过 `Property<T>` 读取配置，不关心配置来自内存 map、properties 文本、
//! 序列化对象、环境变量还是文件，底层存储也可以在运行时整体替换。
//!
//! ## 模块
//!
//! - **map**: 扁平配置存储（`ConfigMap`）、可热替换存储与各类适配器
//! - **callback**: 多订阅者回调列表与执行器
//! - **property**: 惰性求值的 `Property<T>` 及其组合子（cache / backup / or / 监听）
//! - **convert**: 原始值到类型化值的转换
//! - **config**: 层级配置视图 `Config`、构造入口 `ConfigFactory` 与结构体绑定
//! - **source**: 文件配置源与文件监听
//!
//! ## 示例
//!
//! ```
//! use config_facade::{ConfigFactory, MapConfigMap};
//!
//! let map = MapConfigMap::from_iter([("a.b.c", "123"), ("a.b", "12"), ("a", "Hello")]);
//! let config = ConfigFactory::from_map(&map);
//!
//! let value = config.at_path("a").unwrap().get_string("b.c");
//! let cached = value.cache();
//! assert_eq!(value.get().unwrap(), "123");
//! assert_eq!(cached.get().unwrap(), "123");
//!
//! map.insert("a.b.c", "321");
//! assert_eq!(value.get().unwrap(), "321");
//! assert_eq!(cached.get().unwrap(), "123");
//!
//! config.reload();
//! assert_eq!(cached.get().unwrap(), "321");
//! ```

extern crate self as config_facade;

pub mod callback;
pub mod config;
pub mod convert;
pub mod error;
pub mod macros;
pub mod map;
pub mod property;
pub mod source;

// 重新导出主要的公共 API
pub use callback::{
    CallbackExecutionList, DirectExecutor, Executor, FutureCallback, ListenerHandle,
    ThreadPoolExecutor, ThreadPoolExecutorConfig, TokioExecutor,
};

pub use config::{Bind, Config, ConfigFactory};

pub use convert::{
    register_converter, register_type, FromConfigValue, PropertyType, TypedValue,
};

pub use error::{ConfigError, Result};

pub use map::{
    env_config_map, flatten_json, flatten_serialize, parse_properties, ChainedConfigMap,
    ConfigMap, ConfigValue, MapConfigMap, MapListener, ReplaceableConfigMap, VolatileConfigMap,
};

pub use property::{Property, PropertyNode, PropertyValue};

pub use source::{FileSource, FileSourceConfig, WatchHandle};

// 派生宏
pub use config_facade_macros::{BindConfig, FromConfigValue};
