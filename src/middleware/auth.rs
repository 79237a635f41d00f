use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{bearer_token, decode_jwt};
use crate::database::{models::User, Repository};
use crate::error::ApiError;
use crate::types::Role;

/// Caller identity, loaded fresh from the users table on every request
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Bearer authentication: decode the token, load the account and inject
/// [`AuthUser`] into request extensions
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|v| v.to_str().map_err(|_| ApiError::unauthorized("Invalid Authorization header format")))
        .transpose()?;

    let token = bearer_token(header)?;
    let claims = decode_jwt(&state.config.security, token).map_err(|e| {
        tracing::warn!("Rejected bearer token: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    // The account may have been deleted or demoted since the token was issued
    let user = Repository::<User>::new(crate::database::models::user::TABLE, state.pool.clone())
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Token subject {} no longer exists", claims.sub);
            ApiError::unauthorized("Invalid or expired token")
        })?;

    tracing::debug!("Authenticated {} ({})", user.email, user.role);
    request.extensions_mut().insert(AuthUser::from(user));

    Ok(next.run(request).await)
}

/// Role gate; must run after [`require_auth`]
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.is_admin() {
        tracing::warn!("User {} denied admin access to {}", user.email, request.uri().path());
        return Err(ApiError::forbidden("Admin access required"));
    }

    Ok(next.run(request).await)
}
