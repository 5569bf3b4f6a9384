//! User account queries

use fairprice_common::time::{from_millis, to_millis};
use fairprice_common::{Error, Result, Role, User};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    let role = Role::parse(&role)
        .ok_or_else(|| Error::Internal(format!("Unknown role in users table: {}", role)))?;

    Ok(User {
        identity_id: row.try_get("identity_id")?,
        role,
        onboarding_complete: row.try_get::<i64, _>("onboarding_complete")? != 0,
        created_at: from_millis(row.try_get("created_at")?),
    })
}

/// Look up the account linked to an external identity
pub async fn find_user(pool: &SqlitePool, identity_id: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT identity_id, role, onboarding_complete, created_at FROM users WHERE identity_id = ?",
    )
    .bind(identity_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Insert a new account
///
/// Returns `false` when the identity already has an account; the primary
/// key makes this safe under concurrent onboarding of the same identity.
pub async fn insert_user(pool: &SqlitePool, user: &User) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (identity_id, role, onboarding_complete, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(identity_id) DO NOTHING
        "#,
    )
    .bind(&user.identity_id)
    .bind(user.role.as_str())
    .bind(user.onboarding_complete as i64)
    .bind(to_millis(user.created_at))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
