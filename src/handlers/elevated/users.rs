// handlers/elevated/users.rs - /admin/users handlers

use axum::extract::{rejection::JsonRejection, Extension, Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::api::format::UserView;
use crate::app::AppState;
use crate::auth::hash_password;
use crate::database::models::{user, NewUser, User, UserChanges};
use crate::database::{DatabaseError, Repository};
use crate::error::ApiError;
use crate::filter::{PageMeta, PageQuery, Paginated};
use crate::handlers::{parse_id, public::auth::validate};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::types::Role;
use crate::validation::{coerce_enum, FieldErrors};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    pub role: Option<String>,
}

fn users(state: &AppState) -> Repository<User> {
    Repository::new(user::TABLE, state.pool.clone())
}

fn parse_role(raw: Option<&str>) -> Result<Option<Role>, ApiError> {
    let mut errors = FieldErrors::new();
    let role = coerce_enum(&mut errors, "role", raw);
    errors.finish(role).map_err(ApiError::validation)
}

fn email_taken(err: DatabaseError) -> ApiError {
    match err {
        DatabaseError::Conflict(_) => ApiError::conflict("Email is already registered"),
        other => other.into(),
    }
}

/// GET /admin/users
pub async fn list(State(state): State<AppState>, Query(query): Query<PageQuery>) -> ApiResult<Paginated<UserView>> {
    let pagination = query.pagination();
    let (rows, total) = users(&state).list_page(None, "created_at desc", pagination).await?;
    Ok(ApiResponse::success(Paginated {
        items: rows.iter().map(UserView::from).collect(),
        pagination: PageMeta::new(total, pagination),
    }))
}

/// GET /admin/users/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<UserView> {
    let id: Uuid = parse_id(&id, "User")?;
    let user = users(&state).find_404(id, "User").await?;
    Ok(ApiResponse::success(UserView::from(&user)))
}

/// POST /admin/users - create an account with an explicit role
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<UserView> {
    let Json(request) = payload?;
    validate(&request)?;
    let role = parse_role(request.role.as_deref())?.unwrap_or_default();

    let new_user = NewUser {
        name: request.name.trim().to_string(),
        email: request.email.trim().to_lowercase(),
        password_hash: hash_password(&request.password)?,
        role,
    };
    let user = User::create(&state.pool, &new_user).await.map_err(email_taken)?;

    tracing::info!("Admin created user {} ({})", user.email, user.role);
    Ok(ApiResponse::created(UserView::from(&user)))
}

/// PATCH /admin/users/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<UserView> {
    let id: Uuid = parse_id(&id, "User")?;
    let Json(request) = payload?;
    validate(&request)?;

    let changes = UserChanges {
        name: request.name.map(|n| n.trim().to_string()),
        email: request.email.map(|e| e.trim().to_lowercase()),
        password_hash: request.password.as_deref().map(hash_password).transpose()?,
        role: parse_role(request.role.as_deref())?,
    };

    let user = User::update(&state.pool, id, &changes)
        .await
        .map_err(email_taken)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::success(UserView::from(&user)))
}

/// DELETE /admin/users/:id - an admin cannot delete their own account
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id: Uuid = parse_id(&id, "User")?;
    if id == auth.id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }
    if !users(&state).delete_by_id(id).await? {
        return Err(ApiError::not_found("User not found"));
    }
    tracing::info!("Admin {} deleted user {}", auth.email, id);
    Ok(ApiResponse::success(json!({ "id": id })))
}
