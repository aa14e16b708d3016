use anyhow::Context;
use clap::{Parser, Subcommand};
use nr_storage::{create_storage, MediaStore, SQLiteStorage, StorageKind};
use nr_web::{AppState, WebConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::info;

mod logging;

#[derive(Parser, Debug)]
#[command(author, version, about = "Newsroom articles and comments API", long_about = None)]
pub struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, env = "NR_STORAGE", default_value = "sqlite", global = true)]
    storage: StorageKind,
    #[arg(
        long,
        env = "NR_DATABASE_URL",
        default_value = nr_storage::DEFAULT_DATABASE_URL,
        global = true
    )]
    database_url: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "NR_HOST", default_value = "127.0.0.1")]
        host: IpAddr,
        #[arg(long, env = "NR_PORT", default_value_t = 8000)]
        port: u16,
        /// Directory uploaded images are written to
        #[arg(long, env = "NR_MEDIA_ROOT", default_value = "media")]
        media_root: PathBuf,
        /// Base URL used for pagination, media and API root links
        #[arg(long, env = "NR_PUBLIC_URL", default_value = "http://localhost:8000")]
        public_url: String,
        /// Comma separated list of allowed origins, or `*`
        #[arg(long, env = "NR_CORS_ORIGINS", value_delimiter = ',')]
        cors_origins: Vec<String>,
    },
    /// Apply the SQLite schema migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            media_root,
            public_url,
            cors_origins,
        } => {
            let storage = create_storage(cli.storage, Some(cli.database_url.as_str())).await?;

            let mut config = WebConfig::default()
                .with_public_url(&public_url)
                .with_context(|| format!("Invalid public url: {}", public_url))?;
            if !cors_origins.is_empty() {
                config = config.with_cors_origins(cors_origins);
            }

            let media = MediaStore::new(media_root);
            info!("🖼️ Media root: {}", media.root().display());
            let state = AppState::new(storage, media, config);
            let app = nr_web::create_app(state);
            nr_web::serve(SocketAddr::new(host, port), app).await?;
        }
        Commands::Migrate => {
            // Connecting applies any pending migrations.
            SQLiteStorage::new_with_url(&cli.database_url).await?;
            info!("✅ Migrations applied to {}", cli.database_url);
        }
    }

    Ok(())
}
