//! Vendor onboarding service.
//!
//! A public multipart intake endpoint where vendors submit brand details and
//! documents, and a cookie-authenticated admin API to review, search and
//! delete submissions.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx, or an in-memory store without `DATABASE_URL`
//! - **Authentication**: bcrypt passwords, HS256 session token in an HTTP-only cookie
//! - **Uploads**: files on local disk beneath one upload root
//! - **Format**: JSON requests/responses, multipart for intake

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    config::Config,
    repository::{AdminStore, SubmissionStore, memory::MemoryStore, postgres::PgStore},
    services::{credentials::SessionKeys, notification_service::Notifier},
    storage::UploadStore,
};

/// Intake body cap: logo plus three PDFs plus room for the text fields.
const INTAKE_BODY_LIMIT: usize = 80 * 1024 * 1024;

/// Shared, cheaply cloneable handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub submissions: Arc<dyn SubmissionStore>,
    pub admins: Arc<dyn AdminStore>,
    pub uploads: UploadStore,
    pub sessions: SessionKeys,
    pub notifier: Arc<Notifier>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire up stores, upload root, session keys and notifier from `config`.
    ///
    /// With `DATABASE_URL` set this connects to PostgreSQL and runs pending
    /// migrations; otherwise records live in memory.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (submissions, admins): (Arc<dyn SubmissionStore>, Arc<dyn AdminStore>) =
            match config.database_url.as_deref().filter(|url| !url.is_empty()) {
                Some(url) => {
                    let pool = db::create_pool(url).await?;
                    tracing::info!("Database pool created");

                    db::run_migrations(&pool).await?;
                    tracing::info!("Database migrations complete");

                    let store = Arc::new(PgStore::new(pool));
                    (store.clone() as Arc<dyn SubmissionStore>, store as Arc<dyn AdminStore>)
                }
                None => {
                    tracing::warn!("DATABASE_URL is not set; using the in-memory store, data is lost on restart");
                    let store = Arc::new(MemoryStore::new());
                    (store.clone() as Arc<dyn SubmissionStore>, store as Arc<dyn AdminStore>)
                }
            };

        let notifier = Notifier::from_config(&config);
        Self::with_stores(config, submissions, admins, notifier)
    }

    /// Assemble state around already-built stores.
    pub fn with_stores(
        config: Config,
        submissions: Arc<dyn SubmissionStore>,
        admins: Arc<dyn AdminStore>,
        notifier: Notifier,
    ) -> anyhow::Result<Self> {
        let uploads = UploadStore::open(&config.upload_dir, config.form_variant)?;
        tracing::info!(
            root = %uploads.root().display(),
            variant = config.form_variant.as_str(),
            "Upload root ready"
        );

        Ok(Self {
            submissions,
            admins,
            uploads,
            sessions: SessionKeys::from_secret(config.session_secret.as_deref()),
            notifier: Arc::new(notifier),
            config: Arc::new(config),
        })
    }
}

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    // Admin-only routes
    let protected = Router::new()
        .route("/api/submissions", get(handlers::submissions::list_submissions))
        .route(
            "/api/submissions/{id}",
            get(handlers::submissions::get_submission)
                .delete(handlers::submissions::delete_submission),
        )
        .route("/api/dashboard", get(handlers::dashboard::dashboard))
        .route("/api/files/{*path}", get(handlers::files::serve_file))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    let intake = Router::new()
        .route("/api/submissions", post(handlers::submissions::create_submission))
        .layer(DefaultBodyLimit::max(INTAKE_BODY_LIMIT));

    Router::new()
        // Public routes
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/auth/setup",
            get(handlers::auth::setup_status).post(handlers::auth::setup),
        )
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .merge(intake)
        .merge(protected)
        // Verified session claims for every request
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::session_context,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
