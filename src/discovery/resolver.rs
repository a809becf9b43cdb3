//! 服务发现接口
//!
//! RPC 客户端的负载均衡层通过 [`Resolver`] 获取服务实例：
//! 先用 `target` 得到缓存键，再用 `resolve` 查询实例，刷新时用 `diff` 计算变化

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::discovery::instance::Instance;
use crate::error::Result;

/// 调用方描述
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub service_name: String,
    pub method: Option<String>,
    pub tags: HashMap<String, String>,
}

impl EndpointInfo {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// 设置方法名
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// 添加标签
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// 一次解析的结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResult {
    pub cacheable: bool,
    pub cache_key: String,
    pub instances: Vec<Instance>,
}

/// 两次解析结果之间的变化
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Change {
    pub result: ResolveResult,
    pub added: Vec<Instance>,
    /// 地址不变但权重或标签变化的实例（取新值）
    pub updated: Vec<Instance>,
    pub removed: Vec<Instance>,
}

/// 服务发现 trait
///
/// 注意：由于需要动态分发（dyn），使用 async-trait
#[async_trait]
pub trait Resolver: Send + Sync {
    /// 返回可作为缓存键的目标描述
    fn target(&self, target: &EndpointInfo) -> String;

    /// 解析服务实例
    async fn resolve(&self, desc: &str) -> Result<ResolveResult>;

    /// 计算两次解析结果的差异，返回 (变化, 是否有变化)
    fn diff(&self, cache_key: &str, prev: &ResolveResult, next: &ResolveResult) -> (Change, bool) {
        default_diff(cache_key, prev, next)
    }

    /// 解析器名称
    fn name(&self) -> &str;
}

/// 按实例地址比较两次解析结果
pub fn default_diff(cache_key: &str, prev: &ResolveResult, next: &ResolveResult) -> (Change, bool) {
    let prev_by_addr: HashMap<&str, &Instance> = prev
        .instances
        .iter()
        .map(|ins| (ins.address(), ins))
        .collect();
    let next_by_addr: HashMap<&str, &Instance> = next
        .instances
        .iter()
        .map(|ins| (ins.address(), ins))
        .collect();

    let mut change = Change {
        result: ResolveResult {
            cacheable: next.cacheable,
            cache_key: cache_key.to_string(),
            instances: next.instances.clone(),
        },
        ..Default::default()
    };

    for ins in &next.instances {
        match prev_by_addr.get(ins.address()) {
            None => change.added.push(ins.clone()),
            Some(old) if *old != ins => change.updated.push(ins.clone()),
            Some(_) => {}
        }
    }

    for ins in &prev.instances {
        if !next_by_addr.contains_key(ins.address()) {
            change.removed.push(ins.clone());
        }
    }

    let changed = !change.added.is_empty() || !change.updated.is_empty() || !change.removed.is_empty();
    (change, changed)
}
