//! Backend selection
//!
//! Decides once at startup which database serves the process and opens it.
//! Startup always succeeds for the local and memory cases: a production
//! deployment without remote credentials, or a local file that cannot be
//! opened, ends up on the seeded in-memory database.

use super::remote::RemoteExecutor;
use super::sqlite::SqliteExecutor;
use super::QueryExecutor;
use crate::errors::StoreError;
use config::DatabaseConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendChoice {
    Remote { url: String, auth_token: String },
    Memory,
    Local(PathBuf),
}

/// Remote when credentials are configured and either running in production
/// or forced; otherwise memory in production and the local file elsewhere.
pub fn select_backend(config: &DatabaseConfig) -> BackendChoice {
    let production = config.environment.is_production();

    match config.remote_credentials() {
        Some((url, token)) if production || config.force_remote => BackendChoice::Remote {
            url: url.to_string(),
            auth_token: token.to_string(),
        },
        _ if production => BackendChoice::Memory,
        _ => BackendChoice::Local(PathBuf::from(&config.local_path)),
    }
}

async fn seeded_memory(seed: &str) -> Result<Arc<dyn QueryExecutor>, StoreError> {
    let executor = SqliteExecutor::open_memory().await?;
    if !seed.trim().is_empty() {
        executor.run_script(seed).await?;
    }
    Ok(Arc::new(executor))
}

/// Open the configured backend. `seed` is the schema and sample data loaded
/// into an in-memory database.
pub async fn open(config: &DatabaseConfig, seed: &str) -> Result<Arc<dyn QueryExecutor>, StoreError> {
    match select_backend(config) {
        BackendChoice::Remote { url, auth_token } => {
            let executor = RemoteExecutor::new(&url, &auth_token, config.query_timeout())?;
            Ok(Arc::new(executor))
        }
        BackendChoice::Memory => {
            info!("Production mode without remote credentials, using in-memory database");
            seeded_memory(seed).await
        }
        BackendChoice::Local(path) => {
            match SqliteExecutor::open_local(&path, config.busy_timeout(), config.max_connections).await {
                Ok(executor) => Ok(Arc::new(executor)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Local database unavailable, falling back to in-memory database");
                    seeded_memory(seed).await
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::BackendKind;
    use config::Environment;

    fn database_config() -> DatabaseConfig {
        DatabaseConfig {
            remote_url: Some("libsql://db.turso.io".to_string()),
            auth_token: Some("token".to_string()),
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn test_remote_requires_production_or_override() {
        let mut config = database_config();
        assert_eq!(
            select_backend(&config),
            BackendChoice::Local(PathBuf::from("data/tribit.db"))
        );

        config.force_remote = true;
        assert!(matches!(select_backend(&config), BackendChoice::Remote { .. }));

        config.force_remote = false;
        config.environment = Environment::Production;
        assert_eq!(
            select_backend(&config),
            BackendChoice::Remote {
                url: "libsql://db.turso.io".to_string(),
                auth_token: "token".to_string(),
            }
        );
    }

    #[test]
    fn test_production_without_credentials_uses_memory() {
        let config = DatabaseConfig {
            environment: Environment::Production,
            force_remote: true,
            ..DatabaseConfig::default()
        };
        assert_eq!(select_backend(&config), BackendChoice::Memory);

        let half_configured = DatabaseConfig {
            auth_token: None,
            ..database_config()
        };
        assert!(matches!(select_backend(&half_configured), BackendChoice::Local(_)));
    }

    #[tokio::test]
    async fn test_missing_local_file_falls_back_to_seeded_memory() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            local_path: dir.path().join("missing.db").to_string_lossy().into_owned(),
            ..DatabaseConfig::default()
        };

        let executor = open(&config, "CREATE TABLE seeded (v INTEGER); INSERT INTO seeded VALUES (1);")
            .await
            .unwrap();
        assert_eq!(executor.backend(), BackendKind::Memory);
        let rows = executor.query("SELECT v FROM seeded", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
