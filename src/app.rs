use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{delete, get, patch, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::AppConfig;
use crate::database::Store;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, validate_admin_middleware};
use crate::services::Mailer;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            mailer,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.storage.upload_dir);
    let public_path = state.config.storage.public_path.clone();

    let mut app = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected (session token)
        .merge(protected_routes(state.clone()))
        // Elevated (session token + Admin role)
        .merge(elevated_routes(state.clone()))
        .nest_service(&public_path, uploads)
        .layer(cors_layer(&state.config));

    if state.config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::{auth, zoning};

    Router::new()
        .route("/register", post(auth::register_post))
        .route("/login", post(auth::login_post))
        .route("/forgot-password", post(auth::forgot_password_post))
        .route("/reset-password", post(auth::reset_password_post))
        .route("/zones", get(zoning::zones_get))
        .route("/zones/:zone_code", get(zoning::zones_by_code_get))
        .route("/zone/:id", get(zoning::zone_get))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{dependents, files, property};

    let upload_limit = state.config.api.max_upload_bytes;

    Router::new()
        .route("/api/properties", post(property::property_post))
        .route("/api/property/:id", get(property::property_get))
        .route("/api/properties/:id/wizard", get(property::wizard_get))
        .route("/property_update/:id", patch(property::property_patch))
        .route("/search", get(property::search_get))
        .route("/api/setbacks", post(dependents::setbacks_post))
        .route("/api/permitted-uses", post(dependents::permitted_uses_post))
        .route("/api/adu-details", post(dependents::adu_details_post))
        .route("/api/jadu-details", post(dependents::jadu_details_post))
        .route("/api/parking-requirements", post(dependents::parking_post))
        .route(
            "/upload",
            post(files::upload_post).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/files", get(files::files_get))
        .route("/files/search", get(files::files_search_get))
        .route("/files/:id", delete(files::file_delete))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn elevated_routes(state: AppState) -> Router<AppState> {
    use elevated::users;

    Router::new()
        .route("/users", get(users::users_get))
        .route("/users/:id", put(users::user_put).delete(users::user_delete))
        // Layers run bottom-up: authenticate first, then check the role
        .route_layer(middleware::from_fn_with_state(state.clone(), validate_admin_middleware))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = &config.security.cors_origins;
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Zoning API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Property and zoning data management backend",
        "endpoints": {
            "auth": "/register, /login, /forgot-password, /reset-password (public)",
            "zones": "/zones, /zones/:zone_code, /zone/:id (public)",
            "properties": "/api/properties, /api/property/:id, /property_update/:id, /search (protected)",
            "dependents": "/api/setbacks, /api/permitted-uses, /api/adu-details, /api/jadu-details, /api/parking-requirements (protected)",
            "files": "/upload, /files, /files/search, /files/:id (protected)",
            "users": "/users, /users/:id (admin)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
