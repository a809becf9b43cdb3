//! Flare Consul Registry Library
//!
//! Consul-backed service registry and service resolver for RPC servers and clients,
//! with TTL heartbeat maintenance and health-filtered instance resolution.

pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod health;
pub mod registry;
pub mod utils;

// Re-exports
pub use client::{
    AgentServiceCheck, AgentServiceRegistration, AgentWeights, ConsulApi, ConsulClient,
    ServiceEntry,
};
pub use config::{ConsulConfig, HttpBasicAuth, TlsConfig};
pub use error::{ConsulError, ErrorCode, Result};
pub use health::{CheckSpec, HealthStatus};

// 服务注册
pub use registry::{ConsulRegistry, Registry, RegistryInfo, RegistryOptions};

// 服务发现
pub use discovery::{
    Change, ConsulResolver, DEFAULT_NETWORK, DEFAULT_WEIGHT, EndpointInfo, Instance,
    ResolveResult, Resolver,
};
