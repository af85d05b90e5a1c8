//! 路由定义

use std::sync::Arc;

use authgate_bootstrap::Infrastructure;
use axum::{
    Router,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::application::AuthController;

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<AuthController>,
    pub infra: Arc<Infrastructure>,
    pub metrics: Option<PrometheusHandle>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/nonce", get(handlers::issue_nonce))
        .route("/login", post(handlers::login))
        .route("/add-user", post(handlers::add_user))
        .route("/edit-user", post(handlers::edit_user))
        .route("/edit-user-password", post(handlers::edit_user_password))
        .route("/public-key", get(handlers::public_key))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
