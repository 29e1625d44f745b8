//! Record shapes for the `users` table: what clients send, what storage
//! holds, and what clients get back.

use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

/// Body accepted by `POST /users` and `PUT /users/:id`. The id is always
/// assigned by storage, so unknown keys (including `id`) are rejected.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UserRequest {
    #[validate(
        required(message = "is required"),
        length(min = 1, message = "is not allowed to be empty")
    )]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "is not allowed to be empty"))]
    pub surname: Option<String>,
}

/// A row that passed the stored shape. Only `from_row` builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub id: i64,
    pub name: String,
    pub surname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct UserResponse {
    pub id: i64,
    #[validate(length(min = 1))]
    pub name: String,
    pub surname: Option<String>,
    #[validate(length(min = 1))]
    pub username: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("\"{0}\" is required")]
    Missing(&'static str),
    #[error("\"{field}\" is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("response shape violated: {0}")]
    Response(String),
}

impl StoredUser {
    pub fn from_row(row: &SqliteRow) -> Result<Self, ShapeError> {
        let id: Option<i64> = column(row, "id")?;
        let name: Option<String> = column(row, "name")?;
        let surname: Option<String> = column(row, "surname")?;

        let id = id.ok_or(ShapeError::Missing("id"))?;
        let name = name.ok_or(ShapeError::Missing("name"))?;
        if name.is_empty() {
            return Err(ShapeError::Invalid {
                field: "name",
                reason: "is not allowed to be empty".to_string(),
            });
        }

        Ok(Self { id, name, surname })
    }
}

fn column<'r, T>(row: &'r SqliteRow, field: &'static str) -> Result<T, ShapeError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(field).map_err(|err| ShapeError::Invalid {
        field,
        reason: err.to_string(),
    })
}

impl UserResponse {
    /// Projects a stored row to the client-facing shape and checks the result.
    pub fn from_stored(user: StoredUser) -> Result<Self, ShapeError> {
        let username = derive_username(&user.name, user.surname.as_deref(), user.id);
        let response = Self {
            id: user.id,
            name: user.name,
            surname: user.surname,
            username,
        };
        response
            .validate()
            .map_err(|errors| ShapeError::Response(validation_message(&errors)))?;
        Ok(response)
    }
}

/// `name + surname` when a non-empty surname exists, otherwise `name + id`.
pub fn derive_username(name: &str, surname: Option<&str>, id: i64) -> String {
    match surname {
        Some(surname) if !surname.is_empty() => format!("{name}{surname}"),
        _ => format!("{name}{id}"),
    }
}

/// Renders validator output as `"field" message` pairs, sorted by field name.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("failed {}", err.code));
                (field.clone(), message)
            })
        })
        .collect();
    fields.sort();

    fields
        .into_iter()
        .map(|(field, message)| format!("\"{field}\" {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}
