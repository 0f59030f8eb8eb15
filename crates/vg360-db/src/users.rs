//! Database operations for `users` (leaders and administrators).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vg360_core::{CoreError, LeaderIdentity, Role, Viewer};

use crate::DbError;

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub cedula: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Resolve the stored role into a request-scoped [`Viewer`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRole`] if the stored role is unknown.
    pub fn viewer(&self) -> Result<Viewer, CoreError> {
        let role: Role = self.role.parse()?;
        Ok(Viewer::new(
            self.id,
            self.cedula.clone(),
            role,
            self.is_superuser,
        ))
    }

    #[must_use]
    pub fn leader_identity(&self) -> LeaderIdentity {
        LeaderIdentity {
            id: self.id,
            cedula: self.cedula.clone(),
            name: self.full_name(),
            email: self.email.clone(),
        }
    }
}

/// Input for [`upsert_user`].
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub cedula: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: Role,
    pub is_superuser: bool,
}

const USER_COLUMNS: &str =
    "id, cedula, email, first_name, last_name, role, is_superuser, created_at";

/// Insert a user or update the one with the same cédula.
///
/// # Errors
///
/// Returns [`DbError::InvalidInput`] if the cédula is not 5-12 digits, or
/// [`DbError::Sqlx`] if the upsert fails (e.g. duplicate email).
pub async fn upsert_user(pool: &PgPool, user: &NewUser<'_>) -> Result<UserRow, DbError> {
    if !is_valid_cedula(user.cedula) {
        return Err(DbError::InvalidInput(format!(
            "cédula '{}' must be 5 to 12 digits",
            user.cedula
        )));
    }

    let sql = format!(
        "INSERT INTO users (cedula, email, first_name, last_name, role, is_superuser) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (cedula) DO UPDATE SET \
             email = EXCLUDED.email, \
             first_name = EXCLUDED.first_name, \
             last_name = EXCLUDED.last_name, \
             role = EXCLUDED.role, \
             is_superuser = EXCLUDED.is_superuser, \
             updated_at = NOW() \
         RETURNING {USER_COLUMNS}"
    );

    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(user.cedula)
        .bind(user.email)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.role.as_str())
        .bind(user.is_superuser)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Look up a user by cédula.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_cedula(pool: &PgPool, cedula: &str) -> Result<Option<UserRow>, DbError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE cedula = $1");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(cedula)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// All users with the leader role, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_leaders(pool: &PgPool) -> Result<Vec<UserRow>, DbError> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users \
         WHERE role = 'lider' AND is_superuser = false \
         ORDER BY first_name, last_name, cedula"
    );
    let rows = sqlx::query_as::<_, UserRow>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

fn is_valid_cedula(cedula: &str) -> bool {
    (5..=12).contains(&cedula.len()) && cedula.bytes().all(|b| b.is_ascii_digit())
}
