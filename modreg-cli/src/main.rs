mod config;
use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use crate::config::Config;
use modreg_core::Storage;
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "modreg")]
#[command(about = "Inspect and seed module registry storage")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one stored module version
    Get {
        namespace: String,
        name: String,
        provider: String,
        version: String,
    },
    /// List every stored version of a module
    List {
        namespace: String,
        name: String,
        provider: String,
    },
    /// Upload a module archive; fails if the version already exists
    Upload {
        namespace: String,
        name: String,
        provider: String,
        version: String,
        /// Archive file to upload
        file: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modreg=info,modreg_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let cfg = match Config::from_file(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cfg, cli.command).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cfg: Config, command: Commands) -> anyhow::Result<()> {
    let storage = cfg
        .storage
        .storage_builder()?
        .build()
        .await
        .context("failed to initialize storage")?;

    match command {
        Commands::Get {
            namespace,
            name,
            provider,
            version,
        } => {
            let module = storage
                .get_module(&namespace, &name, &provider, &version)
                .await?;
            print_json(&module)?;
        }
        Commands::List {
            namespace,
            name,
            provider,
        } => {
            let mut modules = storage
                .list_module_versions(&namespace, &name, &provider)
                .await?;
            modules.sort_by(|a, b| a.version.cmp(&b.version));
            tracing::info!(
                "Found {} versions of {}/{}/{}",
                modules.len(),
                namespace,
                name,
                provider
            );
            print_json(&modules)?;
        }
        Commands::Upload {
            namespace,
            name,
            provider,
            version,
            file,
        } => {
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read archive {}", file))?;
            let module = storage
                .upload_module(&namespace, &name, &provider, &version, Bytes::from(content))
                .await?;
            print_json(&module)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
