//! authgate-errors - 统一错误处理
//!
//! 认证协议的错误分类，基于 RFC 7807 Problem Details 规范对外输出

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Nonce 校验失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NonceFailure {
    #[error("malformed nonce")]
    Malformed,

    #[error("invalid or expired nonce")]
    InvalidOrExpired,
}

/// Token 校验失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenFailure {
    #[error("token expired")]
    Expired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("malformed token")]
    Malformed,
}

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Nonce error: {0}")]
    Nonce(NonceFailure),

    #[error("Login error: {0}")]
    Login(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Key error: {0}")]
    Key(String),

    #[error("Token error: {0}")]
    Token(TokenFailure),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn nonce(failure: NonceFailure) -> Self {
        Self::Nonce(failure)
    }

    pub fn login(msg: impl Into<String>) -> Self {
        Self::Login(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn key(msg: impl Into<String>) -> Self {
        Self::Key(msg.into())
    }

    pub fn token(failure: TokenFailure) -> Self {
        Self::Token(failure)
    }

    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 错误种类的稳定标识（用于日志与 metrics 标签）
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nonce(_) => "nonce",
            Self::Login(_) => "login",
            Self::Unauthorized(_) => "unauthorized",
            Self::Key(_) => "key",
            Self::Token(_) => "token",
            Self::Repository(_) => "repository",
            Self::Duplicate(_) => "duplicate",
            Self::NotFound(_) => "not-found",
            Self::Validation(_) => "validation",
            Self::Internal(_) => "internal",
        }
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Nonce(_) => 400,
            Self::Login(_) => 401,
            Self::Unauthorized(_) => 403,
            Self::Key(_) => 500,
            Self::Token(TokenFailure::Malformed) => 400,
            Self::Token(_) => 401,
            Self::Repository(_) => 500,
            Self::Duplicate(_) => 409,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// 转换为 Problem Details
    ///
    /// 5xx 错误不向调用方暴露内部细节
    pub fn to_problem_details(&self) -> ProblemDetails {
        let status = self.status_code();
        let detail = if status >= 500 {
            self.problem_title().to_string()
        } else {
            self.to_string()
        };

        ProblemDetails {
            r#type: format!("urn:authgate:problem:{}", self.kind()),
            title: self.problem_title().to_string(),
            status,
            detail,
            instance: None,
        }
    }

    fn problem_title(&self) -> &'static str {
        match self {
            Self::Nonce(_) => "Invalid Nonce",
            Self::Login(_) => "Invalid Username or Password",
            Self::Unauthorized(_) => "Not Authorized",
            Self::Key(_) => "Signing Key Unavailable",
            Self::Token(TokenFailure::Expired) => "Expired Authorization Token",
            Self::Token(_) => "Invalid Authorization Token",
            Self::Repository(_) => "Server Error",
            Self::Duplicate(_) => "Conflict",
            Self::NotFound(_) => "Resource Not Found",
            Self::Validation(_) => "Validation Error",
            Self::Internal(_) => "Internal Server Error",
        }
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
