use std::{env, net::SocketAddr, path::Path, sync::Arc};

use anyhow::bail;
use axum::Router;
use common::utils::logging::init_logging;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::backup::BackupService;
use service::store::repo::seaorm::SeaOrmStorageRepository;
use service::store::repository::StorageRepository;

use crate::routes::{self, ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load and validate the config file. A missing file is fine (env fallbacks
/// apply); a file that is present but malformed or invalid aborts startup so
/// bad values never reach the schedulers or the listener.
fn load_config_from(path: &str) -> anyhow::Result<Option<configs::AppConfig>> {
    if !Path::new(path).exists() {
        return Ok(None);
    }
    let mut cfg = configs::load_from_file(path)?;
    cfg.normalize_and_validate()?;
    Ok(Some(cfg))
}

fn load_config() -> anyhow::Result<Option<configs::AppConfig>> {
    let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_config_from(&path)
}

/// Bind address from the validated config, or `SERVER_HOST`/`SERVER_PORT`
/// env vars when no config file exists.
fn bind_addr(server: Option<&configs::ServerConfig>) -> anyhow::Result<SocketAddr> {
    let (host, port) = match server {
        Some(s) => (s.host.clone(), s.port),
        None => {
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8080);
            (host, port)
        }
    };
    if port == 0 {
        bail!("server port must be in 1..=65535");
    }
    Ok(format!("{}:{}", host, port).parse()?)
}

fn pool_options(db: &configs::DatabaseConfig) -> models::db::PoolOptions {
    models::db::PoolOptions {
        max_connections: db.max_connections,
        min_connections: db.min_connections,
        connect_timeout_secs: db.connect_timeout_secs,
        acquire_timeout_secs: db.acquire_timeout_secs,
    }
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = load_config()?;

    // DB connection and schema
    let db = match &cfg {
        Some(c) => models::db::connect_with(&c.database.url, &pool_options(&c.database)).await?,
        None => models::db::connect().await?,
    };
    migration::Migrator::up(&db, None).await?;

    let repo: Arc<dyn StorageRepository> = Arc::new(SeaOrmStorageRepository { db });

    // Backup scheduler + retention reaper on independent timers; they run
    // apart from request handling and only log their own failures. The
    // intervals passed here are already validated non-zero.
    let backup_cfg = cfg.as_ref().map(|c| c.backup.clone()).unwrap_or_default();
    info!(
        snapshot_interval_secs = backup_cfg.snapshot_interval_secs,
        retention_interval_secs = backup_cfg.retention_interval_secs,
        lifetime_ms = backup_cfg.lifetime_ms,
        max_backups = backup_cfg.max_backups,
        "backup schedulers starting"
    );
    let _scheduler_tasks =
        Arc::new(BackupService::new(Arc::clone(&repo), backup_cfg)).spawn();

    // Build router
    let state = ServerState { repo };
    let app: Router = routes::build_router(state, build_cors());

    // Bind and serve
    let addr = bind_addr(cfg.as_ref().map(|c| &c.server))?;
    info!(%addr, "starting storage server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str, content: &str) -> std::path::PathBuf {
        let path = env::temp_dir().join(format!("{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_config_file_falls_back_to_env() {
        let cfg = load_config_from("/nonexistent/kv-storage-config.toml").unwrap();
        assert!(cfg.is_none());
    }

    #[test]
    fn zero_backup_interval_aborts_startup() {
        let path = temp_config(
            "kv-zero-interval",
            "[database]\nurl = \"postgres://localhost/kv\"\n[backup]\nsnapshot_interval_secs = 0\n",
        );
        let err = load_config_from(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("backup intervals"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn malformed_config_file_aborts_startup() {
        let path = temp_config("kv-malformed", "this is not toml [");
        assert!(load_config_from(path.to_str().unwrap()).is_err());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn valid_config_passes_through_validated() {
        let path = temp_config(
            "kv-valid",
            "[server]\nhost = \"0.0.0.0\"\nport = 9000\n[database]\nurl = \"postgres://localhost/kv\"\n",
        );
        let cfg = load_config_from(path.to_str().unwrap()).unwrap().unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.backup.snapshot_interval_secs, 7200);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn bind_addr_rejects_port_zero() {
        let server = configs::ServerConfig { host: "127.0.0.1".into(), port: 0, worker_threads: None };
        assert!(bind_addr(Some(&server)).is_err());
    }

    #[test]
    fn bind_addr_uses_configured_host_and_port() {
        let server = configs::ServerConfig { host: "0.0.0.0".into(), port: 9000, worker_threads: None };
        let addr = bind_addr(Some(&server)).unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:9000");
    }
}
