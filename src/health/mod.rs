//! 健康检查模块
//!
//! Consul 健康检查的状态定义，以及 TCP / TTL 两种检查的类型化描述

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::AgentServiceCheck;
use crate::error::{ConsulError, Result};

/// TTL 必须大于该值，心跳间隔为 `TTL - 1s`
pub const MIN_TTL: Duration = Duration::from_secs(1);

/// 健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Passing,
    Warning,
    Critical,
    Maintenance,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Passing => "passing",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
            HealthStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 健康检查描述
///
/// TCP 与 TTL 互斥：
/// - **Tcp**: Consul 定期连接服务地址，目标地址在注册时自动填充为 `host:port`
/// - **Ttl**: 服务自己定期上报，注册器会启动心跳任务
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckSpec {
    Tcp {
        interval: Duration,
        timeout: Duration,
        deregister_after: Duration,
    },
    Ttl {
        ttl: Duration,
        deregister_after: Duration,
        /// 为空时使用 Consul 默认的 `service:<service_id>`
        check_id: Option<String>,
    },
}

impl Default for CheckSpec {
    fn default() -> Self {
        CheckSpec::Tcp {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(5),
            deregister_after: Duration::from_secs(60),
        }
    }
}

impl CheckSpec {
    /// 创建 TTL 检查，注销延迟为 TTL 的两倍
    pub fn ttl(ttl: Duration) -> Self {
        CheckSpec::Ttl {
            ttl,
            deregister_after: ttl * 2,
            check_id: None,
        }
    }
}

impl From<CheckSpec> for AgentServiceCheck {
    fn from(spec: CheckSpec) -> Self {
        match spec {
            CheckSpec::Tcp {
                interval,
                timeout,
                deregister_after,
            } => AgentServiceCheck {
                interval: Some(format_duration(interval)),
                timeout: Some(format_duration(timeout)),
                deregister_critical_service_after: Some(format_duration(deregister_after)),
                ..Default::default()
            },
            CheckSpec::Ttl {
                ttl,
                deregister_after,
                check_id,
            } => AgentServiceCheck {
                check_id,
                ttl: Some(format_duration(ttl)),
                deregister_critical_service_after: Some(format_duration(deregister_after)),
                ..Default::default()
            },
        }
    }
}

/// 以 Consul 能解析的格式输出时长（`5s`、`1500ms`）
pub fn format_duration(d: Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

/// 解析并校验 TTL，TTL 必须大于 [`MIN_TTL`]
pub fn parse_ttl(ttl: &str) -> Result<Duration> {
    let parsed = humantime::parse_duration(ttl.trim())
        .map_err(|e| ConsulError::validation(format!("invalid consul check ttl {:?}: {}", ttl, e)))?;
    if parsed <= MIN_TTL {
        return Err(ConsulError::validation(
            "consul check ttl must be greater than one second",
        ));
    }
    Ok(parsed)
}
