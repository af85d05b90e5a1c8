//! Bearer 令牌提取

use authgate_auth_core::Claims;
use authgate_errors::{AppError, TokenFailure};
use axum::{extract::FromRequestParts, http::header, http::request::Parts};

use super::error::ApiError;
use super::routes::AppState;

/// 已校验的调用方 Claims
#[derive(Debug, Clone)]
pub struct Bearer(pub Claims);

impl FromRequestParts<AppState> for Bearer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AppError::token(TokenFailure::Malformed))?;

        let claims = state.controller.validate_bearer(token)?;
        Ok(Self(claims))
    }
}

/// 解析 `Authorization` 头，scheme 不区分大小写
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
