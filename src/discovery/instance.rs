//! 服务实例定义

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 默认传输协议
pub const DEFAULT_NETWORK: &str = "tcp";

/// 默认权重，Consul 返回的权重非正数时使用
pub const DEFAULT_WEIGHT: u32 = 10;

/// 服务实例
///
/// 由解析器在每次 resolve 时新建，创建后不可修改
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instance {
    network: String,
    address: String,
    weight: u32,
    tags: HashMap<String, String>,
}

impl Instance {
    /// 创建新的服务实例
    ///
    /// # 参数
    /// * `network` - 传输协议（如 "tcp"）
    /// * `address` - `host:port`
    /// * `weight` - 权重，非正数时使用 [`DEFAULT_WEIGHT`]
    /// * `tags` - 标签
    pub fn new(
        network: impl Into<String>,
        address: impl Into<String>,
        weight: i32,
        tags: HashMap<String, String>,
    ) -> Self {
        Self {
            network: network.into(),
            address: address.into(),
            weight: normalize_weight(weight),
            tags,
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// 获取标签值
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }
}

/// 非正数权重替换为 [`DEFAULT_WEIGHT`]
pub fn normalize_weight(weight: i32) -> u32 {
    if weight <= 0 {
        DEFAULT_WEIGHT
    } else {
        weight as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_accessors() {
        let mut tags = HashMap::new();
        tags.insert("group".to_string(), "blue".to_string());
        let instance = Instance::new(DEFAULT_NETWORK, "10.0.0.8:9999", 100, tags);

        assert_eq!(instance.network(), "tcp");
        assert_eq!(instance.address(), "10.0.0.8:9999");
        assert_eq!(instance.weight(), 100);
        assert_eq!(instance.tag("group"), Some("blue"));
        assert_eq!(instance.tag("idc"), None);
    }

    #[test]
    fn test_non_positive_weight_uses_default() {
        assert_eq!(normalize_weight(0), DEFAULT_WEIGHT);
        assert_eq!(normalize_weight(-5), DEFAULT_WEIGHT);
        assert_eq!(normalize_weight(777), 777);
    }
}
