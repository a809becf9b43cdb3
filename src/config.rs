//! Consul 客户端配置
//!
//! 支持三种来源：代码构建、TOML 文件、`CONSUL_*` 环境变量

use serde::{Deserialize, Serialize};

use crate::error::{ConsulError, Result};

/// 默认 agent 地址
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8500";

/// Consul 客户端配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConsulConfig {
    /// agent 地址，`host:port` 或完整 URL
    #[serde(default = "default_address")]
    pub address: String,

    /// 协议：http / https，address 中已带协议时忽略
    ///
    /// 未设置时由是否配置了 TLS 决定，见 [`ConsulConfig::effective_scheme`]
    #[serde(default)]
    pub scheme: Option<String>,

    #[serde(default)]
    pub datacenter: Option<String>,

    /// ACL token
    #[serde(default)]
    pub token: Option<String>,

    /// 企业版命名空间
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub http_auth: Option<HttpBasicAuth>,

    #[serde(default)]
    pub tls: Option<TlsConfig>,

    /// 请求超时（秒），为空时不限制
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// HTTP Basic 认证
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HttpBasicAuth {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// TLS 配置（证书内容由调用方保证有效，这里只负责加载）
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub ca_file: Option<String>,
    #[serde(default)]
    pub cert_file: Option<String>,
    #[serde(default)]
    pub key_file: Option<String>,
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            scheme: None,
            datacenter: None,
            token: None,
            namespace: None,
            http_auth: None,
            tls: None,
            timeout_secs: None,
        }
    }
}

impl ConsulConfig {
    /// 使用指定地址创建配置
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// 设置数据中心
    #[must_use]
    pub fn datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.datacenter = Some(datacenter.into());
        self
    }

    /// 设置 ACL token
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// 设置命名空间
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// 设置 Basic 认证
    #[must_use]
    pub fn http_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.http_auth = Some(HttpBasicAuth {
            username: username.into(),
            password,
        });
        self
    }

    /// 设置 TLS
    ///
    /// 没有显式设置 `scheme` 时，配置了 TLS 即使用 https；
    /// TOML 中的 `[tls]` 表与环境变量 `CONSUL_CACERT` 等遵循同样的规则
    #[must_use]
    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// 显式设置协议
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// 实际使用的协议：显式设置优先，否则有 TLS 配置时为 https，默认 http
    pub fn effective_scheme(&self) -> &str {
        match (&self.scheme, &self.tls) {
            (Some(scheme), _) => scheme.as_str(),
            (None, Some(_)) => "https",
            (None, None) => "http",
        }
    }

    /// 设置请求超时（秒）
    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// 从 TOML 文件加载
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConsulError::config(format!("failed to read {}: {}", path, e)))?;
        Self::from_toml(&content)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 默认配置叠加环境变量
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_with(|key| std::env::var(key).ok());
        config
    }

    /// 用环境变量覆盖当前配置
    ///
    /// 识别：`CONSUL_HTTP_ADDR`、`CONSUL_HTTP_TOKEN`、`CONSUL_HTTP_AUTH`、
    /// `CONSUL_HTTP_SSL`、`CONSUL_HTTP_SSL_VERIFY`、`CONSUL_CACERT`、
    /// `CONSUL_CLIENT_CERT`、`CONSUL_CLIENT_KEY`、`CONSUL_NAMESPACE`、`CONSUL_DATACENTER`
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(addr) = get("CONSUL_HTTP_ADDR") {
            if let Some(rest) = addr.strip_prefix("https://") {
                self.scheme = Some("https".to_string());
                self.address = rest.to_string();
            } else if let Some(rest) = addr.strip_prefix("http://") {
                self.scheme = Some("http".to_string());
                self.address = rest.to_string();
            } else {
                self.address = addr;
            }
        }

        if let Some(token) = get("CONSUL_HTTP_TOKEN") {
            self.token = Some(token);
        }

        if let Some(auth) = get("CONSUL_HTTP_AUTH") {
            self.http_auth = Some(match auth.split_once(':') {
                Some((user, pass)) => HttpBasicAuth {
                    username: user.to_string(),
                    password: Some(pass.to_string()),
                },
                None => HttpBasicAuth {
                    username: auth,
                    password: None,
                },
            });
        }

        if get("CONSUL_HTTP_SSL").is_some_and(|v| parse_bool(&v)) {
            self.scheme = Some("https".to_string());
        }

        if let Some(verify) = get("CONSUL_HTTP_SSL_VERIFY") {
            self.tls.get_or_insert_with(TlsConfig::default).insecure_skip_verify = !parse_bool(&verify);
        }

        if let Some(path) = get("CONSUL_CACERT") {
            self.tls.get_or_insert_with(TlsConfig::default).ca_file = Some(path);
        }
        if let Some(path) = get("CONSUL_CLIENT_CERT") {
            self.tls.get_or_insert_with(TlsConfig::default).cert_file = Some(path);
        }
        if let Some(path) = get("CONSUL_CLIENT_KEY") {
            self.tls.get_or_insert_with(TlsConfig::default).key_file = Some(path);
        }

        if let Some(namespace) = get("CONSUL_NAMESPACE") {
            self.namespace = Some(namespace);
        }

        if let Some(datacenter) = get("CONSUL_DATACENTER") {
            self.datacenter = Some(datacenter);
        }
    }

    /// agent 的基础 URL，不带结尾的 `/`
    pub fn base_url(&self) -> String {
        let address = self.address.trim_end_matches('/');
        if address.contains("://") {
            address.to_string()
        } else {
            format!("{}://{}", self.effective_scheme(), address)
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "t" | "true" | "yes" | "on"
    )
}
