//! Postgres-backed identity store.
//!
//! Expected schema: a `users` table with unique `email` and `phone_number`
//! columns and a nullable `otp_code`/`otp_expires_at` pair, and a `managers`
//! table with a unique `username` and a textual `role` column.

use crate::auth::identity::{
    FieldUpdate, Manager, ManagerUpdate, NewManagerRecord, NewUserRecord, OtpIssue, User,
    UserDetailsUpdate, UserUpdate,
};
use crate::auth::store::IdentityStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, QueryBuilder, Row};
use tracing::Instrument;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, phone_number, verified, otp_code, otp_expires_at, created_at, updated_at";

const MANAGER_COLUMNS: &str = "id, username, phone_number, role, created_at, updated_at";

pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// The credential hash travels through row mapping only when the query
/// projected it.
fn user_from_row(row: &PgRow, with_secret: bool) -> Result<User> {
    let otp_code: Option<String> = row.get("otp_code");
    let otp_expires_at: Option<DateTime<Utc>> = row.get("otp_expires_at");
    let otp = match (otp_code, otp_expires_at) {
        (Some(code), Some(expires_at)) => Some(OtpIssue { code, expires_at }),
        _ => None,
    };

    Ok(User {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone_number: row.get("phone_number"),
        password_hash: if with_secret { row.get("password") } else { None },
        verified: row.get("verified"),
        otp,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn manager_from_row(row: &PgRow, with_secret: bool) -> Result<Manager> {
    let role: String = row.get("role");

    Ok(Manager {
        id: row.get("id"),
        username: row.get("username"),
        phone_number: row.get("phone_number"),
        password_hash: if with_secret { row.get("password") } else { None },
        role: role.parse().context("manager row carries unknown role")?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn user_email_exists(&self, email: &str, exclude: Option<Uuid>) -> Result<bool> {
        let query =
            "SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2) LIMIT 1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .bind(exclude)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to check email uniqueness")?;

        Ok(row.is_some())
    }

    async fn user_phone_exists(&self, phone_number: &str, exclude: Option<Uuid>) -> Result<bool> {
        let query =
            "SELECT 1 FROM users WHERE phone_number = $1 AND ($2::uuid IS NULL OR id <> $2) LIMIT 1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(phone_number)
            .bind(exclude)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to check phone uniqueness")?;

        Ok(row.is_some())
    }

    async fn create_user(&self, record: NewUserRecord) -> Result<User> {
        let query = format!(
            r"
            INSERT INTO users
                (first_name, last_name, email, phone_number, password, verified, otp_code, otp_expires_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6, $7)
            RETURNING {USER_COLUMNS}
            "
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(&record.first_name)
            .bind(&record.last_name)
            .bind(&record.email)
            .bind(&record.phone_number)
            .bind(&record.password_hash)
            .bind(&record.otp.code)
            .bind(record.otp.expires_at)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert user")?;

        user_from_row(&row, false)
    }

    async fn find_user_by_phone(
        &self,
        phone_number: &str,
        with_secret: bool,
    ) -> Result<Option<User>> {
        let query = if with_secret {
            format!("SELECT {USER_COLUMNS}, password FROM users WHERE phone_number = $1")
        } else {
            format!("SELECT {USER_COLUMNS} FROM users WHERE phone_number = $1")
        };
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user by phone")?;

        row.map(|row| user_from_row(&row, with_secret)).transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user by id")?;

        row.map(|row| user_from_row(&row, false)).transpose()
    }

    async fn count_users(&self) -> Result<u64> {
        let query = "SELECT COUNT(*) AS total FROM users";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .context("failed to count users")?;

        let total: i64 = row.get("total");
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn list_users(&self, offset: u64, limit: u64) -> Result<Vec<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id LIMIT $1 OFFSET $2"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let rows = sqlx::query(&query)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to list users")?;

        rows.iter().map(|row| user_from_row(row, false)).collect()
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>> {
        let mut builder: QueryBuilder<'_, sqlx::Postgres> =
            QueryBuilder::new("UPDATE users SET updated_at = NOW()");

        match update.password_hash {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => {
                builder.push(", password = NULL");
            }
            FieldUpdate::Set(hash) => {
                builder.push(", password = ");
                builder.push_bind(hash);
            }
        }

        if let Some(verified) = update.verified {
            builder.push(", verified = ");
            builder.push_bind(verified);
        }

        // Code and expiry move together, in both directions.
        match update.otp {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => {
                builder.push(", otp_code = NULL, otp_expires_at = NULL");
            }
            FieldUpdate::Set(otp) => {
                builder.push(", otp_code = ");
                builder.push_bind(otp.code);
                builder.push(", otp_expires_at = ");
                builder.push_bind(otp.expires_at);
            }
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {USER_COLUMNS}"));

        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = builder.sql()
        );
        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to update user")?;

        row.map(|row| user_from_row(&row, false)).transpose()
    }

    async fn update_user_details(
        &self,
        id: Uuid,
        update: UserDetailsUpdate,
    ) -> Result<Option<User>> {
        let mut builder: QueryBuilder<'_, sqlx::Postgres> =
            QueryBuilder::new("UPDATE users SET updated_at = NOW()");

        if let Some(first_name) = update.first_name {
            builder.push(", first_name = ");
            builder.push_bind(first_name);
        }
        if let Some(last_name) = update.last_name {
            builder.push(", last_name = ");
            builder.push_bind(last_name);
        }
        if let Some(email) = update.email {
            builder.push(", email = ");
            builder.push_bind(email);
        }
        if let Some(phone_number) = update.phone_number {
            builder.push(", phone_number = ");
            builder.push_bind(phone_number);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {USER_COLUMNS}"));

        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = builder.sql()
        );
        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to update user details")?;

        row.map(|row| user_from_row(&row, false)).transpose()
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let query = "DELETE FROM users WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }

    async fn manager_username_exists(
        &self,
        username: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool> {
        let query =
            "SELECT 1 FROM managers WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2) LIMIT 1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .bind(exclude)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to check username uniqueness")?;

        Ok(row.is_some())
    }

    async fn create_manager(&self, record: NewManagerRecord) -> Result<Manager> {
        let query = format!(
            r"
            INSERT INTO managers (username, phone_number, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {MANAGER_COLUMNS}
            "
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(&record.username)
            .bind(&record.phone_number)
            .bind(&record.password_hash)
            .bind(record.role.as_str())
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert manager")?;

        manager_from_row(&row, false)
    }

    async fn find_manager_by_username(
        &self,
        username: &str,
        with_secret: bool,
    ) -> Result<Option<Manager>> {
        let query = if with_secret {
            format!("SELECT {MANAGER_COLUMNS}, password FROM managers WHERE username = $1")
        } else {
            format!("SELECT {MANAGER_COLUMNS} FROM managers WHERE username = $1")
        };
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup manager by username")?;

        row.map(|row| manager_from_row(&row, with_secret))
            .transpose()
    }

    async fn find_manager_by_id(&self, id: Uuid) -> Result<Option<Manager>> {
        let query = format!("SELECT {MANAGER_COLUMNS} FROM managers WHERE id = $1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup manager by id")?;

        row.map(|row| manager_from_row(&row, false)).transpose()
    }

    async fn list_managers(&self) -> Result<Vec<Manager>> {
        let query = format!("SELECT {MANAGER_COLUMNS} FROM managers ORDER BY created_at, id");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to list managers")?;

        rows.iter()
            .map(|row| manager_from_row(row, false))
            .collect()
    }

    async fn update_manager(&self, id: Uuid, update: ManagerUpdate) -> Result<Option<Manager>> {
        let mut builder: QueryBuilder<'_, sqlx::Postgres> =
            QueryBuilder::new("UPDATE managers SET updated_at = NOW()");

        if let Some(username) = update.username {
            builder.push(", username = ");
            builder.push_bind(username);
        }
        if let Some(phone_number) = update.phone_number {
            builder.push(", phone_number = ");
            builder.push_bind(phone_number);
        }
        if let Some(hash) = update.password_hash {
            builder.push(", password = ");
            builder.push_bind(hash);
        }
        if let Some(role) = update.role {
            builder.push(", role = ");
            builder.push_bind(role.as_str());
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {MANAGER_COLUMNS}"));

        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = builder.sql()
        );
        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to update manager")?;

        row.map(|row| manager_from_row(&row, false)).transpose()
    }

    async fn delete_manager(&self, id: Uuid) -> Result<bool> {
        let query = "DELETE FROM managers WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete manager")?;

        Ok(result.rows_affected() > 0)
    }
}
