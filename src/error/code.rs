//! 错误代码定义
//!
//! 错误代码按类别分组：
//! - 1000-1999: 参数校验相关错误
//! - 2000-2999: 本地网络地址相关错误
//! - 3000-3999: Consul 后端相关错误
//! - 4000-4999: 配置相关错误

use serde::{Deserialize, Serialize};
use std::fmt;

/// 错误代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ErrorCode {
    // ============================================================
    // 参数校验相关错误 (1000-1999)
    // ============================================================
    InvalidParameter = 1000,
    IllegalTagCharacter = 1001,

    // ============================================================
    // 本地网络地址相关错误 (2000-2999)
    // ============================================================
    LocalAddressUnavailable = 2000,

    // ============================================================
    // Consul 后端相关错误 (3000-3999)
    // ============================================================
    BackendRequestFailed = 3000,
    ServiceNotFound = 3001,

    // ============================================================
    // 配置相关错误 (4000-4999)
    // ============================================================
    ConfigurationError = 4000,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    /// 获取错误代码的数字值
    #[inline]
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// 获取错误代码的英文标识符
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
            ErrorCode::IllegalTagCharacter => "ILLEGAL_TAG_CHARACTER",
            ErrorCode::LocalAddressUnavailable => "LOCAL_ADDRESS_UNAVAILABLE",
            ErrorCode::BackendRequestFailed => "BACKEND_REQUEST_FAILED",
            ErrorCode::ServiceNotFound => "SERVICE_NOT_FOUND",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }

    /// 是否为调用方本地产生的错误（不涉及任何网络请求）
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ErrorCode::InvalidParameter
                | ErrorCode::IllegalTagCharacter
                | ErrorCode::LocalAddressUnavailable
                | ErrorCode::ConfigurationError
        )
    }
}
