//! Consul 注册发现错误处理模块
//!
//! 所有对外接口统一返回 [`ConsulError`]，通过 [`ConsulError::code`] 获取稳定的错误代码

pub mod code;

pub use code::ErrorCode;

use thiserror::Error;

/// Consul 注册发现统一错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsulError {
    /// 参数校验失败（缺少服务名、缺少地址、TTL 非法等）
    #[error("validation failed: {0}")]
    Validation(String),

    /// 标签键包含保留分隔符 `:`
    #[error("illegal tag character in key `{key}`")]
    InvalidTag { key: String },

    /// 无法确定本机可路由地址
    #[error("{0}")]
    Address(String),

    /// Consul 请求失败（连接失败、鉴权失败、非 2xx 响应、响应解析失败）
    #[error("consul request failed: {message}")]
    Backend {
        status: Option<u16>,
        message: String,
    },

    /// 没有找到健康的服务实例
    #[error("no service found: {service}")]
    NotFound { service: String },

    /// 配置错误（文件读取、TOML 解析、TLS 证书加载）
    #[error("invalid consul config: {0}")]
    Config(String),
}

impl ConsulError {
    /// 创建参数校验错误
    pub fn validation(msg: impl Into<String>) -> Self {
        ConsulError::Validation(msg.into())
    }

    /// 创建后端错误
    pub fn backend(status: Option<u16>, msg: impl Into<String>) -> Self {
        ConsulError::Backend {
            status,
            message: msg.into(),
        }
    }

    /// 创建服务不存在错误
    pub fn not_found(service: impl Into<String>) -> Self {
        ConsulError::NotFound {
            service: service.into(),
        }
    }

    /// 创建配置错误
    pub fn config(msg: impl Into<String>) -> Self {
        ConsulError::Config(msg.into())
    }

    /// 获取错误代码
    pub fn code(&self) -> ErrorCode {
        match self {
            ConsulError::Validation(_) => ErrorCode::InvalidParameter,
            ConsulError::InvalidTag { .. } => ErrorCode::IllegalTagCharacter,
            ConsulError::Address(_) => ErrorCode::LocalAddressUnavailable,
            ConsulError::Backend { .. } => ErrorCode::BackendRequestFailed,
            ConsulError::NotFound { .. } => ErrorCode::ServiceNotFound,
            ConsulError::Config(_) => ErrorCode::ConfigurationError,
        }
    }

    /// 是否为“服务不存在”错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConsulError::NotFound { .. })
    }
}

impl From<reqwest::Error> for ConsulError {
    fn from(err: reqwest::Error) -> Self {
        ConsulError::Backend {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ConsulError {
    fn from(err: toml::de::Error) -> Self {
        ConsulError::Config(format!("TOML 解析错误: {}", err))
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ConsulError>;
