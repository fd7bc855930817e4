mod cli;

use imghost::{config, AppContext};
use imghost_common::clock::now_millis;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    tracing::info!("Starting imghost");
    tracing::info!(
        "Data in {:?}, uploads in {:?}",
        config.storage.data_dir,
        config.storage.upload_dir
    );

    let ctx = AppContext::start(config).await?;

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down...");
    ctx.shutdown().await
}

async fn sweep(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let ctx = AppContext::open(config).await?;

    let report = ctx.sweeper.tick().await;
    ctx.shutdown().await?;

    if let Some(report) = report {
        println!("Expired records: {}", report.expired);
        println!("  Files removed: {}", report.files_removed);
        println!("  Thumbnails removed: {}", report.thumbs_removed);
        println!("  Records removed: {}", report.records_removed);
        if !report.orphaned_blobs.is_empty() {
            println!("  Orphaned blobs: {}", report.orphaned_blobs.join(", "));
        }
    }
    Ok(())
}

async fn stats(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let ctx = AppContext::open(config).await?;

    let stats = ctx.repo.get_stats(now_millis());
    let users = ctx.repo.list_users().len();
    let last_saved = ctx
        .store
        .status()
        .last_saved_at
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|t| t.with_timezone(&chrono::Local).to_rfc3339());
    ctx.shutdown().await?;

    if json {
        let out = serde_json::json!({
            "users": users,
            "images": stats,
            "lastSavedAt": last_saved,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Users: {}", users);
        println!("Images: {}", stats.total);
        println!("  Uploaded today: {}", stats.today);
        println!("  Total size: {} bytes", stats.total_size);
        if let Some(t) = last_saved {
            println!("Last saved: {}", t);
        }
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Data dir: {:?}", config.storage.data_dir);
    println!("  Upload dir: {:?}", config.storage.upload_dir);
    println!(
        "  Flush: every {} ms or {} changes",
        config.database.flush_interval_ms, config.database.flush_threshold
    );
    println!(
        "  Cleanup: {} (every {} s)",
        if config.cleanup.enabled { "enabled" } else { "disabled" },
        config.cleanup.interval_secs
    );
    println!("  Max upload: {} bytes", config.images.max_file_size);
    Ok(())
}

fn hash_password(password: &str) -> Result<()> {
    let hash = imghost_store::credentials::hash_password(password)?;
    println!("{}", hash);
    Ok(())
}

fn generate_api_key() -> Result<()> {
    println!("{}", imghost_common::tokens::generate_api_key());
    Ok(())
}

/// Default filter: the configured level for imghost crates, `warn` elsewhere.
fn default_filter(level: &str) -> String {
    format!("warn,imghost={level},imghost_store={level},imghost_common={level}")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // logging must work even when the config is broken; commands report that
    let logging = config::load_config_or_default(cli.config.as_deref())
        .map(|c| c.logging)
        .unwrap_or_default();

    // RUST_LOG wins; otherwise --verbose, then the configured level
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            default_filter("debug")
        } else {
            default_filter(&logging.level)
        }
    });

    let _log_guard = imghost::logging::init(&env_filter, logging.file.as_deref())?;

    match cli.command {
        Commands::Start => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start(cli.config.as_deref()))
        }
        Commands::Sweep => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(sweep(cli.config.as_deref()))
        }
        Commands::Stats { json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(stats(cli.config.as_deref(), json))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("imghost {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::HashPassword { password } => hash_password(&password),
        Commands::GenerateApiKey => generate_api_key(),
    }
}
