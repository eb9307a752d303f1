//! map 模块 - 扁平配置存储
//!
//! 提供 `ConfigMap` 抽象、内存适配器、可热替换存储以及带回退的组合存储

pub mod chained;
pub mod core;
pub mod env;
pub mod flatten;
pub mod map_config_map;
pub mod replaceable;

pub use chained::ChainedConfigMap;
pub use self::core::{ConfigMap, ConfigValue};
pub use env::env_config_map;
pub use flatten::{flatten_json, flatten_serialize, parse_properties};
pub use map_config_map::MapConfigMap;
pub use replaceable::{MapListener, ReplaceableConfigMap, VolatileConfigMap};
