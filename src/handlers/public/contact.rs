// handlers/public/contact.rs - POST /contact handler

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::api::format::ContactMessageView;
use crate::app::AppState;
use crate::database::models::ContactMessage;
use crate::handlers::public::auth::validate;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 10, message = "Message must be at least 10 characters"))]
    pub message: String,
}

/// POST /contact - public contact form
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> ApiResult<ContactMessageView> {
    let Json(request) = payload?;
    validate(&request)?;

    let message = ContactMessage::create(
        &state.pool,
        request.name.trim(),
        request.email.trim(),
        request.message.trim(),
    )
    .await?;

    tracing::info!("Contact message {} received", message.id);
    Ok(ApiResponse::created(ContactMessageView::from(&message)))
}
