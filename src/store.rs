//! Database connection: create the target database when missing, then open the pool.

use crate::error::{AppError, ConfigError};
use crate::sql::quoted;
use sqlx::postgres::PgPoolOptions;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Ensure the database exists, then open a pool of at most `max_connections`.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, AppError> {
    ensure_database_exists(database_url).await?;
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| ConfigError::Load(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await.map_err(AppError::Db)?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await
        .map_err(AppError::Db)?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await
            .map_err(AppError::Db)?;
    }
    Ok(())
}

/// Split `database_url` into the admin URL (same server, `postgres` database) and the
/// target database name. The name is empty when the URL has no path after the authority.
fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let authority_start = match url.find("://") {
        Some(i) => i + 3,
        None if url.contains('/') => 0,
        None => return Err(ConfigError::Load("DATABASE_URL: no path".into()).into()),
    };
    let rest = url.get(authority_start..).unwrap_or("");
    let Some(slash) = rest.find('/') else {
        let base = rest.split('?').next().unwrap_or(rest);
        let prefix = url.get(..authority_start).unwrap_or("");
        return Ok((format!("{}{}/postgres", prefix, base), String::new()));
    };
    let path_start = authority_start + slash + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{}postgres", base);
    Ok((admin_url, db_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_db_name_from_url() {
        let (admin, name) = parse_db_name_from_url("postgres://u:p@localhost:5432/shop?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(name, "shop");
    }

    #[test]
    fn test_host_only_url_has_no_database_name() {
        let (admin, name) = parse_db_name_from_url("postgres://localhost:5432").unwrap();
        assert_eq!(admin, "postgres://localhost:5432/postgres");
        assert_eq!(name, "");

        let (_, name) = parse_db_name_from_url("postgres://u:p@db:5432/").unwrap();
        assert_eq!(name, "");

        let (admin, name) = parse_db_name_from_url("postgres://db?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://db/postgres");
        assert_eq!(name, "");
    }

    #[test]
    fn test_url_without_path_is_rejected() {
        assert!(parse_db_name_from_url("localhost").is_err());
    }
}
