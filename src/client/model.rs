//! Consul HTTP API 数据模型
//!
//! 字段命名与 Consul 保持一致（PascalCase），可选字段为空时不序列化

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// 服务注册请求（`PUT /v1/agent/service/register`）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentServiceRegistration {
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<AgentWeights>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enable_tag_override: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<AgentServiceCheck>,
}

/// 服务健康检查定义
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentServiceCheck {
    #[serde(rename = "CheckID", skip_serializing_if = "Option::is_none")]
    pub check_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,

    #[serde(rename = "TCP", skip_serializing_if = "Option::is_none")]
    pub tcp: Option<String>,

    #[serde(rename = "HTTP", skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,

    #[serde(rename = "GRPC", skip_serializing_if = "Option::is_none")]
    pub grpc: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deregister_critical_service_after: Option<String>,
}

impl AgentServiceCheck {
    /// 是否为 TTL 检查
    pub fn is_ttl(&self) -> bool {
        self.ttl.as_deref().is_some_and(|ttl| !ttl.is_empty())
    }

    /// 是否已经指定了由 Consul 主动探测的目标
    pub fn has_target(&self) -> bool {
        [&self.tcp, &self.http, &self.grpc]
            .iter()
            .any(|target| target.as_deref().is_some_and(|t| !t.is_empty()))
    }
}

/// 服务权重，passing / warning 两种状态分别生效
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentWeights {
    #[serde(default)]
    pub passing: i32,
    #[serde(default)]
    pub warning: i32,
}

/// TTL 检查更新请求（`PUT /v1/agent/check/update/:check_id`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckUpdate {
    pub status: String,
    pub output: String,
}

/// 健康查询结果中的一条记录（`GET /v1/health/service/:service`）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceEntry {
    #[serde(default)]
    pub node: Option<Node>,

    #[serde(default)]
    pub service: Option<AgentService>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub checks: Vec<HealthCheck>,
}

/// 节点信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Node {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(default)]
    pub node: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub datacenter: String,
}

/// 注册在 agent 上的服务
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentService {
    #[serde(rename = "ID", default)]
    pub id: String,

    #[serde(default)]
    pub service: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: HashMap<String, String>,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub weights: AgentWeights,
}

/// 健康检查结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthCheck {
    #[serde(rename = "CheckID", default)]
    pub check_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "ServiceID", default)]
    pub service_id: String,
}

/// Consul 会把空集合返回为 `null`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registration_wire_format() {
        let registration = AgentServiceRegistration {
            id: Some("product:10.0.0.8:9999".to_string()),
            name: Some("product".to_string()),
            tags: vec!["group:blue".to_string()],
            address: Some("10.0.0.8".to_string()),
            port: Some(9999),
            weights: Some(AgentWeights {
                passing: 100,
                warning: 100,
            }),
            check: Some(AgentServiceCheck {
                ttl: Some("10s".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let value = serde_json::to_value(&registration).unwrap();
        assert_eq!(
            value,
            json!({
                "ID": "product:10.0.0.8:9999",
                "Name": "product",
                "Tags": ["group:blue"],
                "Address": "10.0.0.8",
                "Port": 9999,
                "Weights": {"Passing": 100, "Warning": 100},
                "Check": {"TTL": "10s"}
            })
        );
    }

    #[test]
    fn test_check_kind() {
        let ttl = AgentServiceCheck {
            ttl: Some("10s".to_string()),
            ..Default::default()
        };
        assert!(ttl.is_ttl());
        assert!(!ttl.has_target());

        let tcp = AgentServiceCheck {
            tcp: Some("10.0.0.8:9999".to_string()),
            ..Default::default()
        };
        assert!(!tcp.is_ttl());
        assert!(tcp.has_target());

        let empty = AgentServiceCheck {
            ttl: Some(String::new()),
            ..Default::default()
        };
        assert!(!empty.is_ttl());
    }

    #[test]
    fn test_service_entry_with_nulls() {
        let body = json!([{
            "Node": {"ID": "n1", "Node": "agent-1", "Address": "10.0.0.2", "Datacenter": "dc1"},
            "Service": {
                "ID": "product:10.0.0.8:9999",
                "Service": "product",
                "Tags": null,
                "Meta": null,
                "Address": "10.0.0.8",
                "Port": 9999,
                "Weights": {"Passing": 100, "Warning": 1}
            },
            "Checks": [{"CheckID": "serfHealth", "Name": "Serf Health Status", "Status": "passing", "ServiceID": ""}]
        }]);

        let entries: Vec<ServiceEntry> = serde_json::from_value(body).unwrap();
        assert_eq!(entries.len(), 1);
        let service = entries[0].service.as_ref().unwrap();
        assert!(service.tags.is_empty());
        assert!(service.meta.is_empty());
        assert_eq!(service.weights.passing, 100);
        assert_eq!(entries[0].checks[0].status, "passing");
    }
}
