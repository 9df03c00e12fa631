pub mod repository;

use axum::{
    debug_handler,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::{MessageBody, NewUser, User, UserChanges, UserFilter};

use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::sqlite::Database;
use crate::AppState;

const NOT_FOUND: &str = "User not found";
const NOT_FOUND_OR_UNCHANGED: &str = "User not found or no changes made";
const DELETED: &str = "User deleted successfully";

pub fn router() -> Router<AppState> {
    Router::<AppState>::new()
        .route("/", post(create_user).get(get_users))
        .route("/search", get(find_user))
        .route(
            "/{id}",
            get(get_user_by_id).put(update_user).delete(delete_user),
        )
}

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

fn validate_new_user(user: &NewUser) -> AppResult<()> {
    require("firstName", &user.first_name)?;
    require("lastName", &user.last_name)?;
    require("phone", &user.phone)
}

fn validate_changes(changes: &UserChanges) -> AppResult<()> {
    let fields = [
        ("firstName", &changes.first_name),
        ("lastName", &changes.last_name),
        ("phone", &changes.phone),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            require(field, value)?;
        }
    }
    Ok(())
}

#[debug_handler(state = AppState)]
#[tracing::instrument(skip(db))]
pub async fn create_user(
    State(db): State<Database>,
    AppJson(params): AppJson<NewUser>,
) -> AppResult<impl IntoResponse> {
    validate_new_user(&params)?;

    let user = repository::insert(db.as_ref(), &params).await?;
    tracing::info!("Created user {}", user.id);

    Ok((StatusCode::CREATED, Json(user)))
}

#[debug_handler(state = AppState)]
#[tracing::instrument(skip(db))]
pub async fn get_users(State(db): State<Database>) -> AppResult<Json<Vec<User>>> {
    let users = repository::find_all(db.as_ref()).await?;

    Ok(Json(users))
}

#[debug_handler(state = AppState)]
#[tracing::instrument(skip(db))]
pub async fn get_user_by_id(
    State(db): State<Database>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<User>> {
    repository::find_by_id(db.as_ref(), id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

#[debug_handler(state = AppState)]
#[tracing::instrument(skip(db))]
pub async fn update_user(
    State(db): State<Database>,
    AppPath(id): AppPath<i64>,
    AppJson(params): AppJson<UserChanges>,
) -> AppResult<Json<User>> {
    validate_changes(&params)?;

    if repository::update(db.as_ref(), id, &params).await? == 0 {
        return Err(AppError::not_found(NOT_FOUND_OR_UNCHANGED));
    }

    // The row can vanish between the update and this read.
    repository::find_by_id(db.as_ref(), id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

#[debug_handler(state = AppState)]
#[tracing::instrument(skip(db))]
pub async fn delete_user(
    State(db): State<Database>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<MessageBody>> {
    match repository::delete(db.as_ref(), id).await? {
        0 => Err(AppError::not_found(NOT_FOUND)),
        _ => Ok(Json(MessageBody::new(DELETED))),
    }
}

#[debug_handler(state = AppState)]
#[tracing::instrument(skip(db))]
pub async fn find_user(
    State(db): State<Database>,
    AppQuery(filter): AppQuery<UserFilter>,
) -> AppResult<Json<User>> {
    repository::find_one(db.as_ref(), &filter)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}
