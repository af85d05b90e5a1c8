//! sqlx 错误映射

use authgate_errors::AppError;

const UNIQUE_VIOLATION: &str = "23505";

/// 唯一约束冲突映射为 Duplicate，其他映射为 Repository
pub(crate) fn map_sqlx_error(context: &str, err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err.code().is_some_and(|code| &*code == UNIQUE_VIOLATION) =>
        {
            let field = match db_err.constraint() {
                Some(c) if c.contains("email") => "email",
                Some(c) if c.contains("username") => "username",
                _ => "record",
            };
            AppError::duplicate(format!("{} already exists", field))
        }
        _ => AppError::repository(format!("{}: {}", context, err)),
    }
}
