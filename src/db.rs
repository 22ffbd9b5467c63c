//! Database connection management
//!
//! Builds the deadpool-postgres pool the runner borrows its client from.
//! The pool (and every client checked out of it) is owned by the caller;
//! the runner itself never opens or closes connections.

use crate::config::DatabaseConfig;
use crate::error::RepairError;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::info;

/// Create a connection pool with given configuration
pub fn create_pool(config: &DatabaseConfig) -> Result<Pool, RepairError> {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.dbname = Some(config.database.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    if config.require_tls {
        let certs = rustls_native_certs::load_native_certs();
        let mut root_store = rustls::RootCertStore::empty();
        for cert in certs.certs {
            root_store.add(cert).ok();
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

        cfg.create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| RepairError::Config(format!("Failed to create TLS pool: {}", e)))
    } else {
        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| RepairError::Config(format!("Failed to create pool: {}", e)))
    }
}

/// Create a pool and verify the target database is reachable
pub async fn connect(config: &DatabaseConfig) -> Result<Pool, RepairError> {
    let pool = create_pool(config)?;

    // Test connection before handing the pool out
    let client = pool.get().await?;
    client.query_one("SELECT 1", &[]).await?;
    drop(client);

    info!(
        "Connected to {}@{}:{}/{} (TLS: {})",
        config.user, config.host, config.port, config.database, config.require_tls
    );

    Ok(pool)
}
