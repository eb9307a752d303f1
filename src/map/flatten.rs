//! 层级数据到扁平点分 key 的转换
//!
//! 支持序列化对象（serde）、JSON/YAML/TOML 树以及 `key=value` 形式的 properties 文本

use serde::Serialize;
use serde_json::Value as JsonValue;

use super::core::ConfigValue;
use super::map_config_map::MapConfigMap;
use crate::error::{ConfigError, Result};

/// 把 JSON 对象展开成点分 key 的扁平存储
///
/// 嵌套对象递归展开；数组作为整体保存在对应 key 上；null 被忽略
///
/// # 示例
/// ```
/// use config_facade::{flatten_json, ConfigMap};
/// use serde_json::json;
///
/// let map = flatten_json(&json!({"db": {"host": "localhost", "port": 3306}})).unwrap();
/// assert_eq!(map.raw_keys(), vec!["db.host", "db.port"]);
/// ```
pub fn flatten_json(value: &JsonValue) -> Result<MapConfigMap> {
    let JsonValue::Object(fields) = value else {
        return Err(ConfigError::Source(format!(
            "expected an object at the root, got: {}",
            value
        )));
    };

    let map = MapConfigMap::new();
    for (key, child) in fields {
        flatten_into(&map, key, child);
    }
    Ok(map)
}

/// 把可序列化对象展开成扁平存储
pub fn flatten_serialize<T: Serialize + ?Sized>(value: &T) -> Result<MapConfigMap> {
    let json = serde_json::to_value(value)
        .map_err(|e| ConfigError::Source(format!("failed to serialize value: {}", e)))?;
    flatten_json(&json)
}

fn flatten_into(map: &MapConfigMap, prefix: &str, value: &JsonValue) {
    match value {
        JsonValue::Null => {}
        JsonValue::Object(fields) => {
            for (key, child) in fields {
                flatten_into(map, &format!("{}.{}", prefix, key), child);
            }
        }
        other => {
            map.insert(prefix, ConfigValue::new(other.clone()));
        }
    }
}

/// 解析 properties 文本
///
/// 格式：
/// - 每行 `key=value` 或 `key: value`，以第一个 '=' 或 ':' 分隔
/// - '#' 或 '!' 开头的行是注释
/// - 行尾的 '\' 表示下一行是续行
/// - 没有分隔符的行视为值为空字符串
pub fn parse_properties(text: &str) -> MapConfigMap {
    let map = MapConfigMap::new();
    let mut pending = String::new();

    for line in text.lines() {
        let line = if pending.is_empty() {
            line.trim()
        } else {
            line.trim_start()
        };

        if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        if let Some(continued) = line.strip_suffix('\\') {
            pending.push_str(continued);
            continue;
        }

        pending.push_str(line);
        insert_property_line(&map, &pending);
        pending.clear();
    }

    if !pending.is_empty() {
        insert_property_line(&map, &pending);
    }
    map
}

fn insert_property_line(map: &MapConfigMap, line: &str) {
    match line.find(['=', ':']) {
        Some(idx) => {
            let key = line[..idx].trim();
            let value = line[idx + 1..].trim_start();
            map.insert(key, value);
        }
        None => {
            map.insert(line.trim(), "");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::ConfigMap;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_object() {
        let map = flatten_json(&json!({
            "server": {
                "host": "0.0.0.0",
                "port": 8080,
                "tls": {"enabled": true}
            },
            "tags": ["a", "b"],
            "empty": null
        }))
        .unwrap();

        assert_eq!(
            map.raw_keys(),
            vec!["server.host", "server.port", "server.tls.enabled", "tags"]
        );
        assert_eq!(map.get("server.port"), Some(ConfigValue::from(8080)));
        assert_eq!(map.get("tags"), Some(ConfigValue::new(json!(["a", "b"]))));
        assert!(!map.contains_key("empty"));
    }

    #[test]
    fn test_flatten_rejects_scalar_root() {
        assert!(matches!(flatten_json(&json!(42)), Err(ConfigError::Source(_))));
    }

    #[test]
    fn test_flatten_serialize() {
        #[derive(Serialize)]
        struct Database {
            host: String,
            port: u16,
        }

        #[derive(Serialize)]
        struct App {
            name: String,
            database: Database,
        }

        let map = flatten_serialize(&App {
            name: "demo".to_string(),
            database: Database {
                host: "localhost".to_string(),
                port: 5432,
            },
        })
        .unwrap();

        assert_eq!(map.get("name"), Some(ConfigValue::from("demo")));
        assert_eq!(map.get("database.port"), Some(ConfigValue::from(5432)));
    }

    #[test]
    fn test_parse_properties() {
        let map = parse_properties(
            r#"
# comment
! another comment
server.host = localhost
server.port:8080
greeting = hello \
    world
flag
"#,
        );

        assert_eq!(
            map.raw_keys(),
            vec!["server.host", "server.port", "greeting", "flag"]
        );
        assert_eq!(map.get("server.host"), Some(ConfigValue::from("localhost")));
        assert_eq!(map.get("server.port"), Some(ConfigValue::from("8080")));
        assert_eq!(map.get("greeting"), Some(ConfigValue::from("hello world")));
        assert_eq!(map.get("flag"), Some(ConfigValue::from("")));
    }
}
