use crate::config::DatabaseConfig;
use crate::error::DbError;
use anyhow::Result;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::time::Duration;

pub async fn make_pool(cfg: &DatabaseConfig) -> Result<MySqlPool> {
    make_pool_with_size(cfg, None).await
}

pub async fn make_pool_with_size(cfg: &DatabaseConfig, max: Option<u32>) -> Result<MySqlPool> {
    let url = cfg.to_url();
    let max_conn: u32 = match max {
        Some(m) if m > 0 => m,
        _ => match std::env::var("NAME_RESOLVER_POOL_SIZE") {
            Ok(s) => match s.parse::<u32>() {
                Ok(v) if v > 0 => v,
                _ => {
                    log::warn!(
                        "Invalid NAME_RESOLVER_POOL_SIZE='{}'; using computed default",
                        s
                    );
                    compute_default_max_conns()
                }
            },
            Err(_) => compute_default_max_conns(),
        },
    };
    let acquire_ms: u64 = std::env::var("NAME_RESOLVER_ACQUIRE_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30_000);

    let pool = MySqlPoolOptions::new()
        .max_connections(max_conn)
        .min_connections(1)
        .acquire_timeout(Duration::from_millis(acquire_ms))
        .idle_timeout(Some(Duration::from_secs(60)))
        .connect(&url)
        .await
        .map_err(|e| {
            DbError::Connection(format!("{}:{}/{}: {}", cfg.host, cfg.port, cfg.database, e))
        })?;
    log::info!("Connected to {}:{}/{} (max_conn={})", cfg.host, cfg.port, cfg.database, max_conn);
    Ok(pool)
}

/// Lookups are short single-row queries; a small pool per core is plenty.
fn compute_default_max_conns() -> u32 {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4) as u32;
    cores.saturating_mul(2).clamp(2, 32)
}
