//! 标签编解码
//!
//! Consul 的服务标签是扁平的字符串列表，这里用 `key:value` 的形式承载键值对标签

use std::collections::HashMap;

use crate::error::{ConsulError, Result};

/// 键值分隔符，标签键中不允许出现
pub const KV_JOIN_CHAR: char = ':';

/// 把键值对标签编码为 Consul 标签列表
///
/// 输出按键排序，保证相同输入得到相同的注册内容
pub fn encode_tags(tags: &HashMap<String, String>) -> Result<Vec<String>> {
    let mut keys: Vec<&String> = tags.keys().collect();
    keys.sort();

    let mut encoded = Vec::with_capacity(tags.len());
    for key in keys {
        if key.contains(KV_JOIN_CHAR) {
            return Err(ConsulError::InvalidTag { key: key.clone() });
        }
        encoded.push(format!("{}{}{}", key, KV_JOIN_CHAR, tags[key]));
    }
    Ok(encoded)
}

/// 把 Consul 标签列表解码为键值对
///
/// 只按第一个分隔符切分，值中可以包含 `:`；空标签和不含分隔符的标签被忽略
pub fn decode_tags<S: AsRef<str>>(tags: &[S]) -> HashMap<String, String> {
    let mut decoded = HashMap::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.as_ref();
        if tag.is_empty() {
            continue;
        }
        if let Some((key, value)) = tag.split_once(KV_JOIN_CHAR) {
            decoded.insert(key.to_string(), value.to_string());
        }
    }
    decoded
}
