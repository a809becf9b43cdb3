//! Consul 客户端
//!
//! [`ConsulApi`] 是注册器与解析器访问 Consul 的唯一入口，
//! 默认实现 [`ConsulClient`] 基于 reqwest 调用 agent / health HTTP 接口。
//! 同一个客户端可以通过 `Arc` 同时注入注册器和解析器。

pub mod http;
pub mod model;

use async_trait::async_trait;

use crate::error::Result;
use crate::health::HealthStatus;

pub use http::ConsulClient;
pub use model::{
    AgentService, AgentServiceCheck, AgentServiceRegistration, AgentWeights, CheckUpdate,
    HealthCheck, Node, ServiceEntry,
};

/// Consul API 抽象
///
/// 注意：由于需要动态分发（dyn），使用 async-trait
#[async_trait]
pub trait ConsulApi: Send + Sync {
    /// 在本地 agent 上注册服务（相同 ID 会覆盖）
    async fn service_register(&self, registration: &AgentServiceRegistration) -> Result<()>;

    /// 从本地 agent 注销服务
    async fn service_deregister(&self, service_id: &str) -> Result<()>;

    /// 更新 TTL 检查状态
    ///
    /// # 参数
    /// * `check_id` - 检查 ID，默认格式为 "service:<service_id>"
    /// * `output` - 附带的检查输出
    /// * `status` - 新的健康状态
    async fn update_ttl(&self, check_id: &str, output: &str, status: HealthStatus) -> Result<()>;

    /// 查询服务实例
    ///
    /// # 参数
    /// * `service` - 服务名
    /// * `passing_only` - 是否只返回健康检查全部通过的实例
    async fn health_service(&self, service: &str, passing_only: bool) -> Result<Vec<ServiceEntry>>;
}
