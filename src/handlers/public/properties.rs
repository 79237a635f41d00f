// handlers/public/properties.rs - GET /properties handlers

use axum::extract::{Path, Query, State};

use crate::api::format::PropertyView;
use crate::app::AppState;
use crate::filter::{PageMeta, Paginated, PropertyListQuery};
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /properties - filtered, paginated, newest first
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PropertyListQuery>,
) -> ApiResult<Paginated<PropertyView>> {
    let filter = query.into_filter()?;
    tracing::debug!("Property search: {:?}", filter);

    let (items, total) = state.properties().list(&filter).await?;

    Ok(ApiResponse::success(Paginated {
        items: items.iter().map(PropertyView::from).collect(),
        pagination: PageMeta::new(total, filter.pagination),
    }))
}

/// GET /properties/featured
pub async fn featured(State(state): State<AppState>) -> ApiResult<Vec<PropertyView>> {
    let items = state.properties().featured(state.config.api.featured_limit).await?;
    Ok(ApiResponse::success(items.iter().map(PropertyView::from).collect()))
}

/// GET /properties/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<PropertyView> {
    let id = parse_id(&id, "Property")?;
    let property = state.properties().get(id).await?;
    Ok(ApiResponse::success(PropertyView::from(&property)))
}
