use super::map_config_map::MapConfigMap;

/// 从环境变量构造扁平存储
///
/// 只保留以 `{prefix}_` 开头的变量；去掉前缀后转为小写，`__` 映射为层级分隔符 '.'，
/// 例如 `APP_DATABASE__HOST` 在前缀 `APP` 下对应 key `database.host`
pub fn env_config_map(prefix: &str) -> MapConfigMap {
    env_config_map_from(prefix, std::env::vars())
}

pub(crate) fn env_config_map_from(
    prefix: &str,
    vars: impl IntoIterator<Item = (String, String)>,
) -> MapConfigMap {
    let marker = format!("{}_", prefix);
    let mut entries: Vec<(String, String)> = vars
        .into_iter()
        .filter_map(|(name, value)| {
            let rest = name.strip_prefix(&marker)?;
            if rest.is_empty() {
                return None;
            }
            Some((rest.to_lowercase().replace("__", "."), value))
        })
        .collect();
    // 环境变量本身没有顺序，排序保证遍历结果稳定
    entries.sort();
    entries.into_iter().collect()
}
