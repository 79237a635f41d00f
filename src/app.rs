//! Router composition and shared request state.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{require_admin, require_auth};
use crate::services::{ImageStorage, LocalImageStorage, PropertyService};

/// Handles every request shares; cloned per request
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn ImageStorage>,
}

impl AppState {
    /// State with images stored on local disk under the configured directory
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        let storage = Arc::new(LocalImageStorage::new(config.uploads.dir.clone()));
        Self {
            pool,
            config: Arc::new(config),
            storage,
        }
    }

    pub fn properties(&self) -> PropertyService {
        PropertyService::new(
            self.pool.clone(),
            self.storage.clone(),
            self.config.uploads.public_prefix.clone(),
        )
    }
}

pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(state.storage.root());

    let mut router = Router::new()
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .merge(auth_routes(&state))
        .merge(property_routes(&state))
        .merge(location_routes())
        .route("/contact", post(public::contact::submit))
        .nest("/admin", admin_routes(&state))
        .nest_service(&state.config.uploads.public_prefix, uploads)
        .layer(cors(&state.config));

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/me", get(protected::auth::me))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/auth/register", post(public::auth::register))
        .route("/auth/login", post(public::auth::login))
        .merge(protected)
}

fn property_routes(state: &AppState) -> Router<AppState> {
    let uploads = &state.config.uploads;
    // Whole multipart body: every file at its cap plus room for text fields
    let body_limit = uploads.max_files * uploads.max_file_bytes + 1024 * 1024;

    let writes = Router::new()
        .route("/properties", post(elevated::properties::create))
        .route(
            "/properties/:id",
            patch(elevated::properties::update).delete(elevated::properties::delete),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/properties", get(public::properties::list))
        .route("/properties/featured", get(public::properties::featured))
        .route("/properties/:id", get(public::properties::get))
        .merge(writes)
}

fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/locations/regions", get(public::locations::regions))
        .route("/locations/neighborhoods", get(public::locations::neighborhoods))
        .route("/locations/features", get(public::locations::features))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    use elevated::{messages, taxonomy, users};

    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", get(users::get).patch(users::update).delete(users::delete))
        .route("/regions", get(taxonomy::list_regions).post(taxonomy::create_region))
        .route(
            "/regions/:id",
            get(taxonomy::get_region)
                .patch(taxonomy::update_region)
                .delete(taxonomy::delete_region),
        )
        .route(
            "/neighborhoods",
            get(taxonomy::list_neighborhoods).post(taxonomy::create_neighborhood),
        )
        .route(
            "/neighborhoods/:id",
            get(taxonomy::get_neighborhood)
                .patch(taxonomy::update_neighborhood)
                .delete(taxonomy::delete_neighborhood),
        )
        .route("/features", get(taxonomy::list_features).post(taxonomy::create_feature))
        .route(
            "/features/:id",
            get(taxonomy::get_feature)
                .patch(taxonomy::update_feature)
                .delete(taxonomy::delete_feature),
        )
        .route("/messages", get(messages::list))
        .route("/messages/:id", get(messages::get).delete(messages::delete))
        .route("/messages/:id/read", patch(messages::mark_read))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}

fn cors(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    if config.security.cors_origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
