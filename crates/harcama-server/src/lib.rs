//! Harcama Web Server
//!
//! Axum-based REST API for the Harcama expense tracker.
//!
//! - Expense CRUD, statistics and monthly limits under `/api`
//! - Multipart statement uploads (CSV, spreadsheet, PDF)
//! - Configurable CORS policy and security headers
//! - Input validation (pagination limits, file size limits)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use harcama_core::{CategoryCatalog, Database, ImportConfig, ImportPipeline};

mod handlers;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Environment variable holding comma-separated CORS origins
pub const ALLOWED_ORIGINS_ENV: &str = "HARCAMA_ALLOWED_ORIGINS";

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only, "*" = any origin)
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Read the configuration from the environment
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var(ALLOWED_ORIGINS_ENV)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self { allowed_origins }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    /// Import pipeline, built once from the import configuration
    pub pipeline: ImportPipeline,
    /// Category display names, colors and icons
    pub catalog: CategoryCatalog,
}

/// Create the application router
pub fn create_router(
    db: Database,
    import_config: &ImportConfig,
    config: ServerConfig,
) -> harcama_core::Result<Router> {
    let pipeline = ImportPipeline::new(import_config)?;
    let state = Arc::new(AppState {
        db,
        pipeline,
        catalog: import_config.catalog.clone(),
    });

    let api_routes = Router::new()
        .route("/", get(handlers::api_root))
        .route("/categories", get(handlers::list_categories))
        // Expenses
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route("/expenses/stats/summary", get(handlers::get_summary))
        .route("/expenses/stats/monthly", get(handlers::get_monthly))
        .route("/expenses/stats/trends", get(handlers::get_trends))
        .route("/expenses/stats/predictions", get(handlers::get_predictions))
        .route("/expenses/limits", post(handlers::set_limit))
        .route("/expenses/limits/check", get(handlers::check_limits))
        .route(
            "/expenses/:id",
            get(handlers::get_expense)
                .put(handlers::update_expense)
                .delete(handlers::delete_expense),
        )
        .route(
            "/expenses/:id/category",
            put(handlers::update_expense_category),
        )
        // Statement uploads
        .route("/upload/csv", post(handlers::upload_csv))
        .route("/upload/excel", post(handlers::upload_excel))
        .route("/upload/pdf", post(handlers::upload_pdf));

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        cors
    } else if config.allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        cors.allow_origin(origins)
    };

    let app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        // Multipart bodies carry some framing on top of the file itself
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + 64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ));

    Ok(app)
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    import_config: &ImportConfig,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if config.allowed_origins.iter().any(|o| o == "*") {
        warn!("⚠️  CORS allows any origin - do not expose to network!");
    }

    let app = create_router(db, import_config, config)?;
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// API error response
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map a core error: caller mistakes become 400/404, the rest stay internal
    pub fn from_core(err: harcama_core::Error) -> Self {
        match err {
            harcama_core::Error::NotFound(msg) => Self::not_found(&msg),
            err if err.is_client_error() => Self::bad_request(&err.to_string()),
            err => err.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
