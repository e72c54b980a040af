//! Storage Proxy CLI
//!
//! Starts the HTTP proxy in front of a bucket, or manages its
//! configuration file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storage_proxy::config::{Config, LoggingConfig};
use storage_proxy::store::ObjectStoreBlobStore;
use storage_proxy::StorageProxy;

/// Storage Proxy - serve bucket objects over HTTP
#[derive(Parser)]
#[command(name = "storage-proxy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "storage-proxy.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the proxy
    Serve(ServeArgs),

    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "storage-proxy.toml")]
        output: PathBuf,

        /// Bucket to proxy
        #[arg(long, default_value = "my-bucket")]
        bucket: String,
    },

    /// Validate configuration file
    Validate,
}

/// Overrides for values in the configuration file
#[derive(Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    address: Option<String>,

    /// Port to serve
    #[arg(long)]
    port: Option<u16>,

    /// Storage bucket name
    #[arg(long)]
    bucket: Option<String>,

    /// Optional general object prefix (e.g. version directory)
    #[arg(long)]
    prefix: Option<String>,

    /// Runtime path prefix to strip from incoming requests (e.g. '/microservices/')
    #[arg(long)]
    strip_path_prefix: Option<String>,

    /// Object store URL (defaults to gs://<bucket>)
    #[arg(long)]
    store_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => run_serve(&cli.config, cli.log_level, args).await,
        Commands::Init { output, bucket } => {
            init_logging(&LoggingConfig::default(), cli.log_level.as_deref());
            run_init(&output, &bucket)
        }
        Commands::Validate => {
            init_logging(&LoggingConfig::default(), cli.log_level.as_deref());
            run_validate(&cli.config)
        }
    }
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&logging.level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Load the config file if present, then apply command line overrides
fn load_config(path: &Path, args: ServeArgs) -> anyhow::Result<Config> {
    let mut config = if path.exists() {
        Config::read(path).with_context(|| format!("Failed to load configuration from {:?}", path))?
    } else {
        Config::default()
    };

    if let Some(address) = args.address {
        config.server.address = address;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bucket) = args.bucket {
        config.storage.bucket = bucket;
    }
    if let Some(prefix) = args.prefix {
        config.storage.default_prefix = prefix;
    }
    if let Some(strip) = args.strip_path_prefix {
        config.storage.strip_path_prefix = strip;
    }
    if let Some(url) = args.store_url {
        config.storage.url = Some(url);
    }

    Ok(config)
}

/// Start the proxy
async fn run_serve(config_path: &Path, log_level: Option<String>, args: ServeArgs) -> anyhow::Result<()> {
    let config = load_config(config_path, args)?;
    init_logging(&config.logging, log_level.as_deref());

    if !config_path.exists() {
        tracing::info!("No config file found at {:?}, using defaults and flags", config_path);
    }
    config.validate()?;

    let store = ObjectStoreBlobStore::from_url(&config.store_url())
        .with_context(|| format!("Failed to create a storage client for {}", config.store_url()))?;
    let proxy = StorageProxy::new(Arc::new(store), config.proxy_config());

    tracing::info!(
        "Proxying bucket {:?} (prefix {:?}, strip path prefix {:?})",
        config.storage.bucket,
        config.storage.default_prefix,
        config.storage.strip_path_prefix
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received shutdown signal");
    };

    proxy
        .serve_with_shutdown(&config.listen_address(), shutdown)
        .await
        .context("Failed to start proxy")?;

    Ok(())
}

/// Write a sample configuration file
fn run_init(output: &Path, bucket: &str) -> anyhow::Result<()> {
    if output.exists() {
        bail!("{:?} already exists, refusing to overwrite", output);
    }

    let config_content = format!(r#"# Storage Proxy Configuration
# Generated configuration file

[server]
address = "127.0.0.1"
port = 8080

[storage]
bucket = "{bucket}"
# url = "gs://{bucket}"          # also s3://, file:///path, memory:///
default_prefix = ""
# default_prefix = "v1/"
strip_path_prefix = ""
# strip_path_prefix = "/microservices/"

[logging]
level = "info"
format = "pretty"
"#);

    std::fs::write(output, config_content)
        .with_context(|| format!("Failed to write {:?}", output))?;
    println!("Configuration written to {:?}", output);
    println!("Edit the file, then run: storage-proxy --config {:?} serve", output);
    Ok(())
}

/// Validate configuration file
fn run_validate(config_path: &Path) -> anyhow::Result<()> {
    match Config::from_file(config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!("  Listen Address:    {}", config.listen_address());
            println!("  Bucket:            {}", config.storage.bucket);
            println!("  Store URL:         {}", config.store_url());
            println!("  Default Prefix:    {:?}", config.storage.default_prefix);
            println!("  Strip Path Prefix: {:?}", config.storage.strip_path_prefix);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            Err(e.into())
        }
    }
}
