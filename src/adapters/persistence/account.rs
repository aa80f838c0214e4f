use async_trait::async_trait;
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::account::AccountRepo,
    domain::entities::account::{Account, AccountChanges, NewAccount},
};

const ACCOUNT_COLUMNS: &str = "id, name, username, email, verified, created_at, updated_at";

fn row_to_account(row: sqlx::postgres::PgRow) -> Account {
    Account {
        id: row.get("id"),
        name: row.get("name"),
        username: row.get("username"),
        email: row.get("email"),
        verified: row.get("verified"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl PostgresPersistence {
    /// Mutations run serializable so concurrent writers to the same unique
    /// key fail cleanly instead of interleaving.
    async fn begin_serializable(&self) -> AppResult<Transaction<'_, Postgres>> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;
        Ok(tx)
    }
}

#[async_trait]
impl AccountRepo for PostgresPersistence {
    async fn insert(&self, account: &NewAccount) -> AppResult<Account> {
        let mut tx = self.begin_serializable().await?;

        let row = sqlx::query(&format!(
            "INSERT INTO users (id, name, username, email) VALUES ($1, $2, $3, $4) RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&account.name)
        .bind(&account.username)
        .bind(&account.email)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(row_to_account(row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.map(row_to_account))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.map(row_to_account))
    }

    async fn mark_verified(&self, id: Uuid) -> AppResult<Account> {
        let mut tx = self.begin_serializable().await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET verified = TRUE, updated_at = (now() AT TIME ZONE 'utc')
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(row_to_account(row))
    }

    async fn update(&self, id: Uuid, changes: &AccountChanges) -> AppResult<Account> {
        let mut tx = self.begin_serializable().await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                username = COALESCE($3, username),
                email = COALESCE($4, email),
                updated_at = (now() AT TIME ZONE 'utc')
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.username.as_deref())
        .bind(changes.email.as_deref())
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(row_to_account(row))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
