//! 基于 reqwest 的 Consul HTTP 客户端

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url};
use tracing::debug;

use super::ConsulApi;
use super::model::{AgentServiceRegistration, CheckUpdate, ServiceEntry};
use crate::config::{ConsulConfig, HttpBasicAuth};
use crate::error::{ConsulError, Result};
use crate::health::HealthStatus;

/// Consul HTTP 客户端
///
/// 每个请求都会带上配置中的 ACL token、Basic 认证、数据中心和命名空间
#[derive(Debug, Clone)]
pub struct ConsulClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    datacenter: Option<String>,
    namespace: Option<String>,
    http_auth: Option<HttpBasicAuth>,
}

impl ConsulClient {
    /// 使用默认配置和指定地址创建客户端
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Self::with_config(ConsulConfig::new(address))
    }

    /// 使用完整配置创建客户端
    pub fn with_config(config: ConsulConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url()).map_err(|e| {
            ConsulError::config(format!("invalid consul address {}: {}", config.address, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConsulError::config(format!(
                "invalid consul address {}",
                config.address
            )));
        }

        let http = build_http_client(&config, &base_url)?;

        Ok(Self {
            http,
            base_url,
            token: config.token,
            datacenter: config.datacenter,
            namespace: config.namespace,
            http_auth: config.http_auth,
        })
    }

    /// agent 基础 URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ConsulError::config("consul address cannot be a base url"))?;
            path.pop_if_empty().extend(segments);
        }

        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.header("X-Consul-Token", token);
        }
        if let Some(auth) = &self.http_auth {
            builder = builder.basic_auth(&auth.username, auth.password.as_ref());
        }
        if let Some(dc) = &self.datacenter {
            builder = builder.query(&[("dc", dc)]);
        }
        if let Some(ns) = &self.namespace {
            builder = builder.query(&[("ns", ns)]);
        }
        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let resp = builder.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(ConsulError::backend(
            Some(status.as_u16()),
            format!("Unexpected response code: {} ({})", status.as_u16(), body.trim()),
        ))
    }
}

#[async_trait]
impl ConsulApi for ConsulClient {
    async fn service_register(&self, registration: &AgentServiceRegistration) -> Result<()> {
        let builder = self
            .request(Method::PUT, &["v1", "agent", "service", "register"])?
            .json(registration);
        self.send(builder).await?;
        Ok(())
    }

    async fn service_deregister(&self, service_id: &str) -> Result<()> {
        let builder = self.request(
            Method::PUT,
            &["v1", "agent", "service", "deregister", service_id],
        )?;
        self.send(builder).await?;
        Ok(())
    }

    async fn update_ttl(&self, check_id: &str, output: &str, status: HealthStatus) -> Result<()> {
        let builder = self
            .request(Method::PUT, &["v1", "agent", "check", "update", check_id])?
            .json(&CheckUpdate {
                status: status.as_str().to_string(),
                output: output.to_string(),
            });
        self.send(builder).await?;
        Ok(())
    }

    async fn health_service(&self, service: &str, passing_only: bool) -> Result<Vec<ServiceEntry>> {
        let mut builder = self.request(Method::GET, &["v1", "health", "service", service])?;
        if passing_only {
            builder = builder.query(&[("passing", "1")]);
        }

        let entries: Vec<ServiceEntry> = self.send(builder).await?.json().await?;
        debug!(service = %service, count = entries.len(), "Consul health query finished");
        Ok(entries)
    }
}

fn build_http_client(config: &ConsulConfig, base_url: &Url) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();

    // 本机 agent 不走环境变量中的代理
    if is_loopback(base_url) {
        builder = builder.no_proxy();
    }

    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    if let Some(tls) = &config.tls {
        if let Some(ca_file) = &tls.ca_file {
            let pem = read_pem(ca_file)?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| ConsulError::config(format!("invalid ca certificate {}: {}", ca_file, e)))?;
            builder = builder.add_root_certificate(cert);
        }

        match (&tls.cert_file, &tls.key_file) {
            (Some(cert_file), Some(key_file)) => {
                let mut pem = read_pem(cert_file)?;
                pem.push(b'\n');
                pem.extend(read_pem(key_file)?);
                let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                    ConsulError::config(format!("invalid client certificate {}: {}", cert_file, e))
                })?;
                builder = builder.identity(identity);
            }
            (None, None) => {}
            _ => {
                return Err(ConsulError::config(
                    "both cert_file and key_file are required for a client certificate",
                ));
            }
        }

        if tls.insecure_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
    }

    builder
        .build()
        .map_err(|e| ConsulError::config(format!("failed to build http client: {}", e)))
}

fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some(host) if host.eq_ignore_ascii_case("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback()),
        None => false,
    }
}

fn read_pem(path: &str) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| ConsulError::config(format!("failed to read {}: {}", path, e)))
}
