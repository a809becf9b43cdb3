//! 地址解析
//!
//! 把服务监听地址规范化为 Consul 可路由的 `host` + `port`。
//! 监听在 `0.0.0.0` / `::` 上的服务会被替换为本机第一个非回环 IPv4 地址。

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tracing::debug;

use crate::error::{ConsulError, Result};

/// 获取本机第一个非回环 IPv4 地址
pub fn local_ipv4() -> Result<Ipv4Addr> {
    let interfaces = if_addrs::get_if_addrs()
        .map_err(|e| ConsulError::Address(format!("get local ipv4 error, cause: {}", e)))?;

    interfaces
        .into_iter()
        .filter(|iface| !iface.is_loopback())
        .find_map(|iface| match iface.ip() {
            IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
            _ => None,
        })
        .ok_or_else(|| {
            ConsulError::Address("get local ipv4 error, cause: not found ipv4 address".to_string())
        })
}

/// 解析注册地址，返回 (host, port)
///
/// - 未指定主机（`0.0.0.0`、`::`）时回退到 [`local_ipv4`]
/// - 端口为 0 时返回校验错误
pub fn parse_addr(addr: &SocketAddr) -> Result<(String, u16)> {
    let port = addr.port();
    if port == 0 {
        return Err(ConsulError::validation(format!("invalid port {}", port)));
    }

    let ip = addr.ip();
    let host = if ip.is_unspecified() {
        let local = local_ipv4()?;
        debug!(bind = %addr, resolved = %local, "Unspecified bind host replaced by local ipv4");
        local.to_string()
    } else {
        ip.to_string()
    };

    Ok((host, port))
}

/// 解析监听地址字符串
///
/// 支持 `":9999"` 这种省略主机的写法，等价于 `"0.0.0.0:9999"`
pub fn parse_listen_addr(addr: &str) -> Result<SocketAddr> {
    let normalized = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };

    normalized
        .parse()
        .map_err(|e| ConsulError::validation(format!("invalid address {}: {}", addr, e)))
}

/// 拼接 `host:port`，IPv6 地址加方括号
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// 由服务名和解析后的地址生成确定性的服务 ID
///
/// 同一 (服务名, host, port) 总是得到同一个 ID，重复注册会覆盖而不是新增
pub fn service_id(service_name: &str, host: &str, port: u16) -> String {
    format!("{}:{}:{}", service_name, host, port)
}
