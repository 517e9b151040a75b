//! PostgreSQL identity repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::UserRow;
use crate::repo::{CreateUser, DeletedFilter, UserRepository};

/// PostgreSQL identity repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new identity repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn include_deleted(filter: DeletedFilter) -> bool {
    matches!(filter, DeletedFilter::IncludeDeleted)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid, filter: DeletedFilter) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, phone, password_hash, first_name, last_name,
                   display_name, date_of_birth, role, status, version,
                   password_history, deleted, created_at, updated_at
            FROM users
            WHERE id = $1 AND ($2 OR NOT deleted)
            "#,
        )
        .bind(id)
        .bind(include_deleted(filter))
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(
        &self,
        email: &str,
        filter: DeletedFilter,
    ) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, phone, password_hash, first_name, last_name,
                   display_name, date_of_birth, role, status, version,
                   password_history, deleted, created_at, updated_at
            FROM users
            WHERE email = $1 AND ($2 OR NOT deleted)
            "#,
        )
        .bind(email)
        .bind(include_deleted(filter))
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn exists_by_phone(&self, phone: &str, exclude: Option<Uuid>) -> DbResult<bool> {
        // Phone uniqueness spans soft-deleted records as well
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE phone = $1 AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(phone)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, phone, password_hash, first_name,
                               last_name, display_name, date_of_birth, role, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, email, phone, password_hash, first_name, last_name,
                      display_name, date_of_birth, role, status, version,
                      password_history, deleted, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.display_name)
        .bind(user.date_of_birth)
        .bind(&user.role)
        .bind(&user.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn replace_if_version(
        &self,
        id: Uuid,
        expected_version: i64,
        row: &UserRow,
    ) -> DbResult<bool> {
        // The version guard makes this a compare-and-swap: zero matched rows
        // means another writer committed first.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $3, last_name = $4, display_name = $5,
                date_of_birth = $6, phone = $7,
                version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(&row.display_name)
        .bind(row.date_of_birth)
        .bind(&row.phone)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        password_hash: &str,
        history: &[String],
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, password_history = $3,
                version = version + 1, updated_at = NOW()
            WHERE id = $1 AND NOT deleted
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(history)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET status = $2, version = version + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_deleted(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET deleted = TRUE, version = version + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
