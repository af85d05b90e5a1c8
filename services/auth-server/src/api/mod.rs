//! HTTP 接口层

mod error;
mod extract;
mod handlers;
mod routes;

pub use error::ApiError;
pub use extract::Bearer;
pub use routes::{AppState, router};
