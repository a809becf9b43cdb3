//! 服务注册模块
//!
//! 把 RPC 服务端的监听地址注册到 Consul，并在使用 TTL 检查时维护心跳

pub mod consul;
pub mod heartbeat;
pub mod trait_def;

pub use consul::{ConsulRegistry, RegistryOptions};
pub use heartbeat::{HEARTBEAT_OUTPUT, TtlHeartbeat, heartbeat_period};
pub use trait_def::{Registry, RegistryInfo};
