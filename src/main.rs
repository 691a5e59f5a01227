use clap::{Parser, Subcommand};
use crud_scaffold::config::{load_resources, AppConfig};
use crud_scaffold::{apply_migrations, app, seed, store, AppState, ModelRegistry};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "crud-scaffold")]
#[command(about = "Config-driven CRUD REST API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Say hello
    Hello,

    /// Create schemas and tables for every configured resource
    #[command(name = "db:migrate")]
    DbMigrate,

    /// Seed resources with fake records
    #[command(name = "db:seed")]
    DbSeed {
        /// Only seed this resource (path segment)
        #[arg(long, short)]
        resource: Option<String>,

        /// Records per resource
        #[arg(long, short, default_value = "10")]
        count: usize,
    },

    /// Delete every row of every resource
    #[command(name = "db:wipe")]
    DbWipe,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("crud_scaffold=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let state = AppState::bootstrap(&config).await?;
            let listener = TcpListener::bind(config.http.bind_addr()).await?;
            tracing::info!("{} listening on http://{}", config.app.name, listener.local_addr()?);
            axum::serve(listener, app(state)).await?;
        }
        Commands::Hello => {
            println!("Hello from {}!", config.app.name);
        }
        Commands::DbMigrate => {
            let url = config.database.require_url("db:migrate")?;
            let resources = load_resources(&config.resources_path)?;
            let pool = store::connect(url, config.database.max_connections).await?;
            apply_migrations(&pool, &resources).await?;
            tracing::info!("Database successfully migrated.");
        }
        Commands::DbSeed { resource, count } => {
            let models = database_models(&config, "db:seed").await?;
            let n = seed::seed(&models, resource.as_deref(), count).await?;
            tracing::info!(records = n, "Database successfully seeded.");
        }
        Commands::DbWipe => {
            let models = database_models(&config, "db:wipe").await?;
            let n = seed::wipe(&models).await?;
            tracing::info!(rows = n, "Database successfully wiped.");
        }
    }
    Ok(())
}

/// Postgres-backed models for commands that must not fall back to memory.
async fn database_models(config: &AppConfig, command: &str) -> Result<ModelRegistry, Box<dyn std::error::Error>> {
    let url = config.database.require_url(command)?;
    let resources = load_resources(&config.resources_path)?;
    let pool = store::connect(url, config.database.max_connections).await?;
    Ok(ModelRegistry::postgres(&pool, &resources))
}
