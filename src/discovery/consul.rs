//! Consul 服务发现实现

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::client::{ConsulApi, ConsulClient, ServiceEntry};
use crate::config::ConsulConfig;
use crate::discovery::instance::{DEFAULT_NETWORK, Instance};
use crate::discovery::resolver::{EndpointInfo, ResolveResult, Resolver};
use crate::error::{ConsulError, Result};
use crate::utils::{decode_tags, join_host_port};

/// 服务元数据中覆盖传输协议的键
pub const NETWORK_META_KEY: &str = "network";

/// Consul 服务解析器
///
/// 只返回健康检查全部通过的实例；没有可用实例时返回 [`ConsulError::NotFound`]
pub struct ConsulResolver {
    client: Arc<dyn ConsulApi>,
}

impl ConsulResolver {
    /// 使用 agent 地址创建解析器
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Self::with_config(ConsulConfig::new(address))
    }

    /// 使用完整配置创建解析器
    pub fn with_config(config: ConsulConfig) -> Result<Self> {
        let client = ConsulClient::with_config(config)?;
        Ok(Self::with_client(Arc::new(client)))
    }

    /// 使用外部构建好的客户端创建解析器
    pub fn with_client(client: Arc<dyn ConsulApi>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resolver for ConsulResolver {
    fn target(&self, target: &EndpointInfo) -> String {
        target.service_name.clone()
    }

    async fn resolve(&self, desc: &str) -> Result<ResolveResult> {
        let entries = self.client.health_service(desc, true).await?;
        if entries.is_empty() {
            return Err(ConsulError::not_found(desc));
        }

        let total = entries.len();
        let instances: Vec<Instance> = entries.iter().filter_map(to_instance).collect();
        if instances.is_empty() {
            return Err(ConsulError::not_found(desc));
        }

        debug!(
            service = %desc,
            entries = total,
            instances = instances.len(),
            "Resolved service from Consul"
        );

        Ok(ResolveResult {
            cacheable: true,
            cache_key: desc.to_string(),
            instances,
        })
    }

    fn name(&self) -> &str {
        "consul"
    }
}

/// 把健康查询记录转换为实例，没有地址的记录被跳过
fn to_instance(entry: &ServiceEntry) -> Option<Instance> {
    let service = entry.service.as_ref()?;
    if service.address.is_empty() {
        return None;
    }

    let mut tags = decode_tags(&service.tags);
    for (key, value) in &service.meta {
        if key != NETWORK_META_KEY {
            tags.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    let network = service
        .meta
        .get(NETWORK_META_KEY)
        .filter(|n| !n.is_empty())
        .map(String::as_str)
        .unwrap_or(DEFAULT_NETWORK);

    Some(Instance::new(
        network,
        join_host_port(&service.address, service.port),
        service.weights.passing,
        tags,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AgentService, AgentWeights};
    use crate::discovery::instance::DEFAULT_WEIGHT;
    use std::collections::HashMap;

    fn entry(address: &str, port: u16, passing: i32, tags: &[&str]) -> ServiceEntry {
        ServiceEntry {
            service: Some(AgentService {
                id: format!("product:{}:{}", address, port),
                service: "product".to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                address: address.to_string(),
                port,
                weights: AgentWeights {
                    passing,
                    warning: passing,
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_to_instance() {
        let instance = to_instance(&entry("10.0.0.8", 9999, 100, &["group:blue", "idc:hd1"])).unwrap();
        assert_eq!(instance.network(), "tcp");
        assert_eq!(instance.address(), "10.0.0.8:9999");
        assert_eq!(instance.weight(), 100);
        assert_eq!(instance.tag("group"), Some("blue"));
        assert_eq!(instance.tag("idc"), Some("hd1"));
    }

    #[test]
    fn test_to_instance_skips_missing_address() {
        assert!(to_instance(&entry("", 9999, 100, &[])).is_none());
        assert!(to_instance(&ServiceEntry::default()).is_none());
    }

    #[test]
    fn test_to_instance_default_weight() {
        let instance = to_instance(&entry("10.0.0.8", 9999, 0, &[])).unwrap();
        assert_eq!(instance.weight(), DEFAULT_WEIGHT);
    }

    #[test]
    fn test_to_instance_meta() {
        let mut e = entry("10.0.0.8", 9999, 10, &["group:blue"]);
        let service = e.service.as_mut().unwrap();
        service.meta = HashMap::from([
            ("network".to_string(), "udp".to_string()),
            ("group".to_string(), "green".to_string()),
            ("version".to_string(), "v1".to_string()),
        ]);

        let instance = to_instance(&e).unwrap();
        assert_eq!(instance.network(), "udp");
        // 标签列表优先于元数据
        assert_eq!(instance.tag("group"), Some("blue"));
        assert_eq!(instance.tag("version"), Some("v1"));
        assert_eq!(instance.tag("network"), None);
    }
}
