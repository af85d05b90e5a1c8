//! 账号修改授权

use authgate_common::UserId;
use authgate_errors::{AppError, AppResult};
use authgate_ports::UserPatch;

use crate::token::Claims;

/// 管理员可修改任意账号，其他人只能修改自己（按不可变的 subject id 比较）
pub fn authorize(claims: &Claims, target: &UserId) -> AppResult<()> {
    if claims.admin || claims.sub == *target {
        return Ok(());
    }
    Err(AppError::unauthorized(format!(
        "subject {} may not modify account {}",
        claims.sub, target
    )))
}

/// 仅管理员可通过
pub fn require_admin(claims: &Claims) -> AppResult<()> {
    if claims.admin {
        Ok(())
    } else {
        Err(AppError::unauthorized("admin privileges required"))
    }
}

/// 稀疏更新授权：非管理员不能修改 admin / enabled，包括自己的账号
pub fn authorize_patch(claims: &Claims, target: &UserId, patch: &UserPatch) -> AppResult<()> {
    authorize(claims, target)?;
    if !claims.admin && patch.touches_privileges() {
        return Err(AppError::unauthorized(
            "only administrators may change admin or enabled",
        ));
    }
    Ok(())
}
