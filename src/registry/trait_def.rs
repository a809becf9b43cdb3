//! 服务注册 Trait 定义

use std::collections::HashMap;
use std::net::SocketAddr;

use async_trait::async_trait;

use crate::error::Result;

/// 待注册的服务信息
///
/// 由调用方持有，注册器只读取不修改
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryInfo {
    /// 服务名，不能为空
    pub service_name: String,
    /// 监听地址，主机可以是 `0.0.0.0`
    pub addr: Option<SocketAddr>,
    /// 权重，非正数时使用默认权重
    pub weight: i32,
    /// 标签，键中不能包含 `:`
    pub tags: HashMap<String, String>,
    /// 编解码协议，仅透传
    pub payload_codec: Option<String>,
}

impl RegistryInfo {
    pub fn new(service_name: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            service_name: service_name.into(),
            addr: Some(addr),
            ..Default::default()
        }
    }

    /// 设置权重
    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    /// 添加标签
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// 替换全部标签
    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_payload_codec(mut self, codec: impl Into<String>) -> Self {
        self.payload_codec = Some(codec.into());
        self
    }
}

/// 服务注册 Trait
///
/// 注意：由于需要动态分发（dyn），使用 async-trait
#[async_trait]
pub trait Registry: Send + Sync {
    /// 注册服务，相同 (服务名, host, port) 重复注册会覆盖
    async fn register(&self, info: &RegistryInfo) -> Result<()>;

    /// 注销服务，需要传入注册时使用的同一份信息
    async fn deregister(&self, info: &RegistryInfo) -> Result<()>;
}
