use serde::Serialize;
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::Arc;

use super::view::Config;
use crate::error::Result;
use crate::map::{
    env_config_map, flatten_json, flatten_serialize, parse_properties, ConfigMap, ConfigValue,
    MapConfigMap, ReplaceableConfigMap, VolatileConfigMap,
};
use crate::source::{FileSource, FileSourceConfig};

/// 配置视图的构造入口
pub struct ConfigFactory;

impl ConfigFactory {
    /// 以共享的 `MapConfigMap` 构造，对它的原地修改立即可见（但不触发事件）
    pub fn from_map(map: &MapConfigMap) -> Config {
        Self::from_config_map(Arc::new(map.clone()))
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Config
    where
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        Self::from_config_map(Arc::new(pairs.into_iter().collect::<MapConfigMap>()))
    }

    /// `key=value` 格式的文本
    pub fn from_properties_str(text: &str) -> Config {
        Self::from_config_map(Arc::new(parse_properties(text)))
    }

    /// 已经是字符串键值对的集合
    pub fn from_properties<K, V>(properties: impl IntoIterator<Item = (K, V)>) -> Config
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_pairs(
            properties
                .into_iter()
                .map(|(k, v)| (k.into(), ConfigValue::from(v.into()))),
        )
    }

    /// 可序列化对象，嵌套字段展开为点分 key
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Config> {
        Ok(Self::from_config_map(Arc::new(flatten_serialize(value)?)))
    }

    pub fn from_json(value: &JsonValue) -> Result<Config> {
        Ok(Self::from_config_map(Arc::new(flatten_json(value)?)))
    }

    /// 以 `PREFIX_` 开头的环境变量
    pub fn from_env(prefix: &str) -> Config {
        Self::from_config_map(Arc::new(env_config_map(prefix)))
    }

    /// 按扩展名解析的配置文件
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config> {
        let source = FileSource::new(FileSourceConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            ..Default::default()
        })?;
        Ok(Self::from_config_map(Arc::new(source.load()?)))
    }

    pub fn from_config_map(map: Arc<dyn ConfigMap>) -> Config {
        Config::new(Self::replaceable(map))
    }

    /// 已经可替换的存储原样返回，否则包装为 `VolatileConfigMap`
    pub fn replaceable(map: Arc<dyn ConfigMap>) -> Arc<dyn ReplaceableConfigMap> {
        match Arc::clone(&map).as_replaceable() {
            Some(replaceable) => replaceable,
            None => Arc::new(VolatileConfigMap::new(map)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_map_round_trip() {
        let map = MapConfigMap::from_iter([("name", "demo"), ("owner", "ops")]);
        let config = ConfigFactory::from_map(&map);
        for key in ["name", "owner"] {
            assert_eq!(
                config.get_string(key).get().unwrap(),
                map.get(key).unwrap().to_string()
            );
        }
    }

    #[test]
    fn test_replaceable_keeps_existing() {
        let volatile: Arc<dyn ConfigMap> = Arc::new(VolatileConfigMap::new(Arc::new(MapConfigMap::new())));
        let promoted = ConfigFactory::replaceable(Arc::clone(&volatile));
        assert_eq!(
            Arc::as_ptr(&promoted) as *const () as usize,
            Arc::as_ptr(&volatile) as *const () as usize
        );
    }

    #[test]
    fn test_from_properties() {
        let config = ConfigFactory::from_properties_str("# comment\nserver.port=8080\nserver.host: example.com\n");
        assert_eq!(config.get_integer("server.port").get().unwrap(), 8080);
        assert_eq!(config.at_path("server").unwrap().get_keys(), vec!["port", "host"]);

        let config = ConfigFactory::from_properties([("a", "1")]);
        assert_eq!(config.get_long("a").get().unwrap(), 1);
    }

    #[test]
    fn test_from_serialize_and_json() {
        #[derive(Serialize)]
        struct Server {
            host: String,
            port: u16,
        }
        #[derive(Serialize)]
        struct App {
            server: Server,
            debug: bool,
        }

        let config = ConfigFactory::from_serialize(&App {
            server: Server {
                host: "localhost".to_string(),
                port: 9000,
            },
            debug: true,
        })
        .unwrap();
        assert_eq!(config.get_integer("server.port").get().unwrap(), 9000);
        assert!(config.get_boolean("debug").get().unwrap());

        let config = ConfigFactory::from_json(&json!({"a": {"b": "x"}})).unwrap();
        assert_eq!(config.get_string("a.b").get().unwrap(), "x");
        assert!(ConfigFactory::from_json(&json!([1, 2])).is_err());
    }
}
