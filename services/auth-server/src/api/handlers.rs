//! HTTP 处理函数
//!
//! 只负责请求解析与响应编码，业务逻辑在 AuthController

use std::net::SocketAddr;

use authgate_auth_core::require_admin;
use authgate_common::UserId;
use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use secrecy::Secret;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::extract::Bearer;
use super::routes::AppState;
use crate::application::{LoginCommand, NewUser, NonceProof, PasswordEdit, UserEdit};

type ApiResult<T> = Result<T, ApiError>;

fn proof(nonce: String, addr: SocketAddr) -> NonceProof {
    NonceProof::new(nonce, addr.ip().to_string())
}

#[derive(Debug, Serialize)]
pub struct NonceResponse {
    pub nonce: String,
}

pub async fn issue_nonce(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> ApiResult<Json<NonceResponse>> {
    let nonce = state.controller.issue_nonce(&addr.ip().to_string()).await?;
    Ok(Json(NonceResponse { nonce }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: Secret<String>,
    pub nonce: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
}

pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let cmd = LoginCommand {
        username: req.username,
        password: req.password,
    };
    let token = state.controller.login(cmd, &proof(req.nonce, addr)).await?;
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
    }))
}

#[derive(Deserialize)]
pub struct AddUserRequest {
    pub username: String,
    pub email: String,
    pub password: Secret<String>,
    #[serde(default)]
    pub admin: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub nonce: String,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct AddUserResponse {
    pub id: UserId,
}

pub async fn add_user(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Bearer(claims): Bearer,
    Json(req): Json<AddUserRequest>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&claims)?;

    let user = NewUser {
        username: req.username,
        email: req.email,
        password: req.password,
        admin: req.admin,
        enabled: req.enabled,
    };
    let id = state.controller.add_user(user, &proof(req.nonce, addr)).await?;
    Ok((StatusCode::CREATED, Json(AddUserResponse { id })))
}

#[derive(Debug, Deserialize)]
pub struct EditUserRequest {
    pub id: UserId,
    pub username: Option<String>,
    pub email: Option<String>,
    pub admin: Option<bool>,
    pub enabled: Option<bool>,
    pub nonce: String,
}

pub async fn edit_user(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Bearer(claims): Bearer,
    Json(req): Json<EditUserRequest>,
) -> ApiResult<StatusCode> {
    let edit = UserEdit {
        target_id: req.id,
        username: req.username,
        email: req.email,
        admin: req.admin,
        enabled: req.enabled,
    };
    state
        .controller
        .edit_user(edit, &claims, &proof(req.nonce, addr))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct EditPasswordRequest {
    pub id: UserId,
    pub old_password: Option<Secret<String>>,
    pub new_password: Secret<String>,
    pub nonce: String,
}

pub async fn edit_user_password(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Bearer(claims): Bearer,
    Json(req): Json<EditPasswordRequest>,
) -> ApiResult<StatusCode> {
    let edit = PasswordEdit {
        target_id: req.id,
        old_password: req.old_password,
        new_password: req.new_password,
    };
    state
        .controller
        .edit_user_password(edit, &claims, &proof(req.nonce, addr))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn public_key(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/x-pem-file")],
        state.controller.public_key_pem().to_string(),
    )
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.infra.health().await;
    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}
