//! 服务发现模块
//!
//! 定义 RPC 客户端使用的解析器接口 [`Resolver`]，并提供基于 Consul 健康查询的实现。

pub mod consul;
pub mod instance;
pub mod resolver;

pub use consul::{ConsulResolver, NETWORK_META_KEY};
pub use instance::{DEFAULT_NETWORK, DEFAULT_WEIGHT, Instance, normalize_weight};
pub use resolver::{Change, EndpointInfo, ResolveResult, Resolver, default_diff};
