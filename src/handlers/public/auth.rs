// handlers/public/auth.rs - POST /auth/register and /auth/login handlers

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::api::format::{AuthView, UserView};
use crate::app::AppState;
use crate::auth::{generate_jwt, hash_password, verify_password, AuthError};
use crate::database::models::{NewUser, User};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Role;
use crate::validation::FieldErrors;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Required"))]
    pub password: String,
}

/// POST /auth/register - create a USER account and sign it in
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<AuthView> {
    let Json(request) = payload?;
    validate(&request)?;

    let new_user = NewUser {
        name: request.name.trim().to_string(),
        email: request.email.trim().to_lowercase(),
        password_hash: hash_password(&request.password)?,
        role: Role::User,
    };

    let user = User::create(&state.pool, &new_user).await.map_err(|e| match e {
        DatabaseError::Conflict(_) => ApiError::conflict("Email is already registered"),
        other => other.into(),
    })?;

    tracing::info!("Registered user {}", user.email);
    let token = generate_jwt(&state.config.security, &user)?;
    Ok(ApiResponse::created(AuthView {
        token,
        user: UserView::from(&user),
    }))
}

/// POST /auth/login - exchange credentials for a bearer token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<AuthView> {
    let Json(request) = payload?;
    validate(&request)?;

    let user = User::find_by_email(&state.pool, request.email.trim()).await?;

    // Same answer for unknown email and wrong password
    let user = match user {
        Some(user) if verify_password(&request.password, &user.password_hash)? => user,
        _ => {
            tracing::warn!("Failed login for {}", request.email);
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let token = generate_jwt(&state.config.security, &user)?;
    Ok(ApiResponse::success(AuthView {
        token,
        user: UserView::from(&user),
    }))
}

pub(crate) fn validate<T: Validate>(request: &T) -> Result<(), ApiError> {
    if let Err(e) = request.validate() {
        let mut errors = FieldErrors::new();
        errors.merge_validator(&e, None);
        return Err(ApiError::validation(errors));
    }
    Ok(())
}
