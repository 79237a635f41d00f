// handlers/protected/auth.rs - GET /auth/me handler

use axum::extract::{Extension, State};

use crate::api::format::UserView;
use crate::app::AppState;
use crate::database::{models::{user, User}, Repository};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /auth/me - the caller's own profile
pub async fn me(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<UserView> {
    let user = Repository::<User>::new(user::TABLE, state.pool.clone())
        .find_404(auth.id, "User")
        .await?;
    Ok(ApiResponse::success(UserView::from(&user)))
}
