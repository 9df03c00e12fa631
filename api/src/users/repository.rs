//! Queries over the `users` table.
//!
//! Every function is a single statement. Name uniqueness is enforced by the
//! table's `UNIQUE (first_name, last_name)` constraint, which surfaces here as
//! [`AppError::Conflict`].

use chrono::Utc;
use shared::{NewUser, User, UserChanges, UserFilter};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::{AppError, AppResult};

pub async fn find_one(db: &SqlitePool, filter: &UserFilter) -> AppResult<Option<User>> {
    if filter.is_empty() {
        return Err(AppError::invalid("No search parameters provided"));
    }

    let mut query = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT id, first_name, last_name, phone, sex,
               created_at, updated_at
        FROM users WHERE
        "#,
    );
    let mut separated = query.separated(" AND ");
    if let Some(first_name) = &filter.first_name {
        separated.push("first_name = ");
        separated.push_bind_unseparated(first_name.clone());
    }
    if let Some(last_name) = &filter.last_name {
        separated.push("last_name = ");
        separated.push_bind_unseparated(last_name.clone());
    }
    if let Some(phone) = &filter.phone {
        separated.push("phone = ");
        separated.push_bind_unseparated(phone.clone());
    }
    query.push(" ORDER BY id LIMIT 1");
    tracing::debug!("Query: {}", query.sql());

    let user = query.build_query_as::<User>().fetch_optional(db).await?;

    Ok(user)
}

/// All users, most recently created first.
pub async fn find_all(db: &SqlitePool) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, first_name, last_name, phone, sex,
               created_at, updated_at
        FROM users
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(users)
}

pub async fn find_by_id(db: &SqlitePool, id: i64) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, first_name, last_name, phone, sex,
               created_at, updated_at
        FROM users WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(user)
}

pub async fn insert(db: &SqlitePool, new_user: &NewUser) -> AppResult<User> {
    let now = Utc::now();
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (first_name, last_name, phone, sex, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, first_name, last_name, phone, sex,
                  created_at, updated_at
        "#,
    )
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(&new_user.phone)
    .bind(new_user.sex)
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await?;

    Ok(user)
}

/// Applies the provided fields to the row with `id`. The row only counts as
/// affected when at least one provided field differs from what is stored, so
/// both a missing id and a no-op update return 0.
pub async fn update(db: &SqlitePool, id: i64, changes: &UserChanges) -> AppResult<u64> {
    if changes.is_empty() {
        return Ok(0);
    }

    let mut query = QueryBuilder::<Sqlite>::new(
        r#"
        UPDATE users SET
        "#,
    );
    let mut assignments = query.separated(", ");
    if let Some(first_name) = &changes.first_name {
        assignments.push("first_name = ");
        assignments.push_bind_unseparated(first_name.clone());
    }
    if let Some(last_name) = &changes.last_name {
        assignments.push("last_name = ");
        assignments.push_bind_unseparated(last_name.clone());
    }
    if let Some(phone) = &changes.phone {
        assignments.push("phone = ");
        assignments.push_bind_unseparated(phone.clone());
    }
    if let Some(sex) = changes.sex {
        assignments.push("sex = ");
        assignments.push_bind_unseparated(sex);
    }
    assignments.push("updated_at = ");
    assignments.push_bind_unseparated(Utc::now());

    query.push(" WHERE id = ");
    query.push_bind(id);
    query.push(" AND (");
    let mut differences = query.separated(" OR ");
    if let Some(first_name) = &changes.first_name {
        differences.push("first_name IS NOT ");
        differences.push_bind_unseparated(first_name.clone());
    }
    if let Some(last_name) = &changes.last_name {
        differences.push("last_name IS NOT ");
        differences.push_bind_unseparated(last_name.clone());
    }
    if let Some(phone) = &changes.phone {
        differences.push("phone IS NOT ");
        differences.push_bind_unseparated(phone.clone());
    }
    if let Some(sex) = changes.sex {
        differences.push("sex IS NOT ");
        differences.push_bind_unseparated(sex);
    }
    query.push(")");
    tracing::debug!("Query: {}", query.sql());

    let result = query.build().execute(db).await?;

    Ok(result.rows_affected())
}

pub async fn delete(db: &SqlitePool, id: i64) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;

    Ok(result.rows_affected())
}
