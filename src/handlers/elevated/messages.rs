// handlers/elevated/messages.rs - /admin/messages handlers

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::format::ContactMessageView;
use crate::app::AppState;
use crate::database::models::{contact_message, ContactMessage};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{PageMeta, PageQuery};
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::{coerce_bool, FieldErrors};

#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub is_read: Option<String>,
}

/// Message page plus the inbox-wide unread count
#[derive(Debug, Serialize)]
pub struct MessageList {
    pub items: Vec<ContactMessageView>,
    pub pagination: PageMeta,
    pub unread: i64,
}

fn messages(state: &AppState) -> Repository<ContactMessage> {
    Repository::new(contact_message::TABLE, state.pool.clone())
}

/// GET /admin/messages?is_read=false
pub async fn list(State(state): State<AppState>, Query(query): Query<MessageQuery>) -> ApiResult<MessageList> {
    let pagination = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .pagination();

    let mut errors = FieldErrors::new();
    let is_read = coerce_bool(&mut errors, "is_read", query.is_read.as_deref().filter(|s| !s.is_empty()));
    errors.finish(()).map_err(ApiError::validation)?;

    let where_clause = is_read.map(|flag| json!({ "is_read": flag }));
    let (rows, total) = messages(&state)
        .list_page(where_clause, "created_at desc", pagination)
        .await?;
    let unread = ContactMessage::unread_count(&state.pool).await?;

    Ok(ApiResponse::success(MessageList {
        items: rows.iter().map(ContactMessageView::from).collect(),
        pagination: PageMeta::new(total, pagination),
        unread,
    }))
}

/// GET /admin/messages/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ContactMessageView> {
    let id: Uuid = parse_id(&id, "Message")?;
    let message = messages(&state).find_404(id, "Message").await?;
    Ok(ApiResponse::success(ContactMessageView::from(&message)))
}

/// PATCH /admin/messages/:id/read
pub async fn mark_read(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ContactMessageView> {
    let id: Uuid = parse_id(&id, "Message")?;
    let message = ContactMessage::mark_read(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Message not found"))?;
    Ok(ApiResponse::success(ContactMessageView::from(&message)))
}

/// DELETE /admin/messages/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id: Uuid = parse_id(&id, "Message")?;
    if !messages(&state).delete_by_id(id).await? {
        return Err(ApiError::not_found("Message not found"));
    }
    Ok(ApiResponse::success(json!({ "id": id })))
}
