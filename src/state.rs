//! Shared application state for all routes.

use crate::config::{load_resources, AppConfig, AppInfo};
use crate::error::AppError;
use crate::registry::ModelRegistry;
use crate::store;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Present only when `DATABASE_URL` is configured.
    pub pool: Option<PgPool>,
    pub models: Arc<ModelRegistry>,
    pub app: Arc<AppInfo>,
    pub body_limit: usize,
}

impl AppState {
    pub fn new(pool: Option<PgPool>, models: ModelRegistry, app: AppInfo) -> Self {
        AppState {
            pool,
            models: Arc::new(models),
            app: Arc::new(app),
            body_limit: crate::config::HttpConfig::default().body_limit,
        }
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// State with every resource in memory. Used without a database and in tests.
    pub fn in_memory(models: ModelRegistry) -> Self {
        Self::new(None, models, AppInfo::default())
    }

    /// Load resources and connect: PostgreSQL when a URL is configured, memory otherwise.
    pub async fn bootstrap(config: &AppConfig) -> Result<Self, AppError> {
        let resources = load_resources(&config.resources_path)?;
        let state = match config.database.url.as_deref() {
            Some(url) => {
                let pool = store::connect(url, config.database.max_connections).await?;
                if config.boot_logs {
                    tracing::info!("Database successfully connected");
                }
                let models = ModelRegistry::postgres(&pool, &resources);
                Self::new(Some(pool), models, config.app.clone())
            }
            None => {
                tracing::warn!("DATABASE_URL not set, serving resources from memory");
                Self::new(None, ModelRegistry::in_memory(&resources), config.app.clone())
            }
        };
        if config.boot_logs {
            tracing::info!(resources = ?state.models.names(), "resources loaded");
        }
        Ok(state.with_body_limit(config.http.body_limit))
    }
}
