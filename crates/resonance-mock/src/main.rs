use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use resonance_mock::admin_api::AdminApiServer;
use resonance_mock::config::AppConfig;
use resonance_mock::mock::{load_collections, JsonFileStore, MockServerEngine};
use resonance_mock::openapi::{assemble_with_report, serialize, ExportFormat};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "resonance-mock")]
#[command(about = "Local mock server and OpenAPI exporter for endpoint collections")]
#[command(version)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "RESONANCE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Key-value store file holding collections and mock settings
    #[arg(short, long, env = "RESONANCE_STORE", global = true)]
    store: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the admin API, optionally starting the mock server
    Serve {
        /// Admin API bind address
        #[arg(long, env = "RESONANCE_ADMIN_HOST")]
        admin_host: Option<IpAddr>,
        /// Admin API port
        #[arg(long, env = "RESONANCE_ADMIN_PORT")]
        admin_port: Option<u16>,
        /// Mock server bind address
        #[arg(long, env = "RESONANCE_MOCK_HOST")]
        mock_host: Option<IpAddr>,
        /// Start the mock server immediately
        #[arg(long)]
        autostart: bool,
    },
    /// Export a collection as an OpenAPI 3.0 document
    Export {
        /// Collection id
        #[arg(long)]
        collection: String,
        /// Output format (json or yaml)
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormat {
    Text,
    Json,
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {e}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_format);

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(store) = args.store {
        config.store.path = store;
    }

    match args.command {
        Command::Serve {
            admin_host,
            admin_port,
            mock_host,
            autostart,
        } => {
            if let Some(host) = admin_host {
                config.admin.host = host;
            }
            if let Some(port) = admin_port {
                config.admin.port = port;
            }
            if let Some(host) = mock_host {
                config.mock.host = host;
            }
            config.mock.autostart |= autostart;
            config.validate()?;
            serve(config).await
        }
        Command::Export {
            collection,
            format,
            output,
        } => export(&config, &collection, format, output.as_deref()),
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let store = Arc::new(
        JsonFileStore::open(&config.store.path)
            .with_context(|| format!("Failed to open store {}", config.store.path.display()))?,
    );
    let collections = load_collections(store.as_ref()).context("Failed to load collections")?;
    info!(
        "Loaded {} collections from {}",
        collections.len(),
        config.store.path.display()
    );

    let engine = Arc::new(MockServerEngine::new(
        store,
        collections,
        config.engine_options(),
    ));

    if config.mock.autostart {
        if let Err(e) = engine.start().await {
            error!("Mock server failed to start: {}", e);
        }
    }

    let admin = AdminApiServer::new(config.admin_addr(), Arc::clone(&engine));
    tokio::select! {
        result = admin.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
    }

    engine.stop().await?;
    Ok(())
}

fn export(
    config: &AppConfig,
    collection_id: &str,
    format: ExportFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let store = JsonFileStore::open(&config.store.path)
        .with_context(|| format!("Failed to open store {}", config.store.path.display()))?;
    let collections = load_collections(&store).context("Failed to load collections")?;
    let collection = collections
        .iter()
        .find(|c| c.id == collection_id)
        .with_context(|| format!("Collection {collection_id} not found"))?;

    let report = assemble_with_report(collection);
    for skipped in &report.skipped {
        warn!("Skipped non-HTTP endpoint: {}", skipped);
    }
    let document = serialize(&report.document, format)?;

    match output {
        Some(path) => {
            std::fs::write(path, &document)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} document to {}", format, path.display());
        }
        None => println!("{document}"),
    }
    Ok(())
}
