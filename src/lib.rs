//! CRUD scaffold: config-driven REST resources over a generic repository layer.

pub mod backend;
pub mod case;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod registry;
pub mod response;
pub mod routes;
pub mod seed;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use backend::{MemoryBackend, PgBackend, QueryBackend};
pub use config::{default_resources, load_resources, AppConfig, AppInfo, ResourceConfig};
pub use error::{AppError, ConfigError};
pub use migration::apply_migrations;
pub use model::{Criteria, KeyType, Model, ModelConfig, Paginated, QueryDescriptor, Record, SortDirection};
pub use registry::ModelRegistry;
pub use response::{success_one, success_one_ok};
pub use routes::{api_routes, app, common_routes};
pub use seed::Factory;
pub use service::{ResourceService, WelcomeService};
pub use state::AppState;
pub use store::{connect, ensure_database_exists};
