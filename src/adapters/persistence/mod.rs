use sqlx::PgPool;

use crate::app_error::{AppError, ConflictField};

pub mod account;

/// Unique constraints on `users`, as named by the initial migration.
const USERNAME_UNIQUE: &str = "users_username_key";
const EMAIL_UNIQUE: &str = "users_email_key";

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn conflict_for_constraint(constraint: Option<&str>) -> Option<ConflictField> {
    match constraint {
        Some(USERNAME_UNIQUE) => Some(ConflictField::Username),
        Some(EMAIL_UNIQUE) => Some(ConflictField::Email),
        _ => None,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => {
                if let Some(field) = conflict_for_constraint(db_err.constraint()) {
                    return AppError::Conflict(field);
                }
                // Log the actual error for debugging, but don't expose details
                tracing::error!(error = ?err, code = ?db_err.code(), "Database error");
                AppError::Database("Database operation failed".into())
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}
