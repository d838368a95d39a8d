//! Polling a local file and reacting to changes.
//!
//! This demo shows how to:
//! - Build a reloader that re-reads a file on a fixed interval
//! - Decode the data into a typed config with a cached `load_config`
//! - Reject a bad edit from a listener so the previous config stays live
//!
//! Run with: cargo run --example polling_reload
//!
//! While running, edit the printed file path to see reloads.

use hotswap_reload::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct AppConfig {
    server: ServerConfig,
    database: DatabaseConfig,
}

#[derive(Debug, Deserialize)]
struct ServerConfig {
    port: u16,
    host: String,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    url: String,
    max_connections: u32,
}

#[tokio::main]
async fn main() -> std::result::Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Polling Reload Demo ===\n");

    let config_path = std::env::temp_dir().join("hotswap_reload_demo.yaml");
    if !config_path.exists() {
        std::fs::write(
            &config_path,
            r#"server:
  port: 8080
  host: localhost

database:
  url: postgres://localhost/mydb
  max_connections: 10
"#,
        )?;
        println!("Created {}", config_path.display());
    }

    let reloader = Reloader::builder()
        .with_local_file(&config_path)
        .with_interval(Duration::from_secs(2))
        .with_dispatch(tracing::dispatcher::get_default(|d| d.clone()))
        .build()
        .await?;

    let config = TypedReloader::<AppConfig>::new(reloader.clone()).with_strict(true);

    let reload_count = Arc::new(AtomicUsize::new(0));
    let reload_count_clone = Arc::clone(&reload_count);
    config.add_listener(move |cfg: Arc<AppConfig>| {
        if cfg.database.max_connections == 0 {
            return Err("max_connections must be positive".into());
        }
        let count = reload_count_clone.fetch_add(1, Ordering::SeqCst) + 1;
        println!("\n[Event] Configuration reloaded (reload #{count})");
        Ok(())
    });

    let cfg = config.load_config()?;
    println!("Current configuration:");
    println!("  Server: {}:{}", cfg.server.host, cfg.server.port);
    println!(
        "  Database: {} (max connections: {})",
        cfg.database.url, cfg.database.max_connections
    );

    println!("\n===> Edit {} to see reloads <===", config_path.display());
    println!("     Setting max_connections to 0 is rejected and the old config is kept.");
    println!("\nPress Ctrl+C to exit\n");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_secs(5)) => {}
        }

        let cfg = config.load_config()?;
        let count = reload_count.load(Ordering::SeqCst);
        println!("[Status] Config check (reloads: {count}, fingerprint: {:?}):", reloader.fingerprint());
        println!("  Server: {}:{}", cfg.server.host, cfg.server.port);
        println!(
            "  Database: {} (max: {})\n",
            cfg.database.url, cfg.database.max_connections
        );
    }

    config.close()?;
    Ok(())
}
