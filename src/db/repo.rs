use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::db::models::{ShapeError, StoredUser, UserRequest, UserResponse};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
    #[error("user {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    InvalidRow(#[from] ShapeError),
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
}

pub type RepoResult<T> = Result<T, RepoError>;

pub async fn create_users_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            surname TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(Clone)]
pub struct UsersRepository {
    pool: SqlitePool,
    timeout: Duration,
}

impl UsersRepository {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn run<T, F>(&self, fut: F) -> RepoResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res.map_err(|err| {
                tracing::error!(error = %err, "query failed");
                RepoError::Storage(err)
            }),
            Err(_) => {
                tracing::error!(timeout = ?self.timeout, "query timed out");
                Err(RepoError::Timeout(self.timeout))
            }
        }
    }

    /// All rows that pass both shapes, in storage order. Rows that fail
    /// either shape are logged and skipped.
    pub async fn list(&self) -> RepoResult<Vec<UserResponse>> {
        let rows = self
            .run(sqlx::query("SELECT id, name, surname FROM users").fetch_all(&self.pool))
            .await?;

        let users = rows
            .iter()
            .filter_map(|row| {
                StoredUser::from_row(row)
                    .and_then(UserResponse::from_stored)
                    .inspect_err(|err| tracing::warn!(error = %err, "skipping invalid user row"))
                    .ok()
            })
            .collect();

        Ok(users)
    }

    /// Inserts a new row and returns the id storage assigned to it.
    pub async fn create(&self, user: &UserRequest) -> RepoResult<i64> {
        let query = sqlx::query("INSERT INTO users (name, surname) VALUES (?, ?)")
            .bind(non_empty(&user.name))
            .bind(non_empty(&user.surname));
        let result = self.run(query.execute(&self.pool)).await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_id(&self, id: i64) -> RepoResult<UserResponse> {
        let row = self
            .run(
                sqlx::query("SELECT id, name, surname FROM users WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?
            .ok_or(RepoError::NotFound(id))?;

        let user = StoredUser::from_row(&row)
            .and_then(UserResponse::from_stored)
            .inspect_err(|err| tracing::warn!(id, error = %err, "stored user failed validation"))?;

        Ok(user)
    }

    /// Sets only the fields present in `user`. Missing ids are not an error.
    pub async fn update(&self, user: &UserRequest, id: i64) -> RepoResult<()> {
        let mut query = update_statement(user, id);
        self.run(query.build().execute(&self.pool)).await?;

        Ok(())
    }

    /// Missing ids are not an error.
    pub async fn delete(&self, id: i64) -> RepoResult<()> {
        self.run(
            sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Every value goes through `push_bind`; only column names are literal text.
fn update_statement(user: &UserRequest, id: i64) -> QueryBuilder<'_, Sqlite> {
    let mut query = QueryBuilder::new("UPDATE users SET ");
    let name = non_empty(&user.name);
    let surname = non_empty(&user.surname);

    if name.is_none() && surname.is_none() {
        query.push("id = id");
    } else {
        let mut set = query.separated(", ");
        if let Some(name) = name {
            set.push("name = ").push_bind_unseparated(name);
        }
        if let Some(surname) = surname {
            set.push("surname = ").push_bind_unseparated(surname);
        }
    }

    query.push(" WHERE id = ").push_bind(id);
    query
}
