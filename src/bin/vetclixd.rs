//! `vetclixd` – Vetclix record server.
//!
//! Serves the s-expression protocol over TCP (default) or stdio, backed by
//! the in-memory record store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use vetclix::auth::{UserEntry, hash_password};
use vetclix::config::{self, ServerConfig};
use vetclix::server::{self, Session};
use vetclix::store::MemoryStore;
use vetclix::{Dispatcher, Permission};

#[derive(Parser)]
#[command(name = "vetclixd")]
#[command(about = "Vetclix record server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server
    Serve {
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen address, overriding the configuration
        #[arg(long)]
        listen: Option<String>,

        /// Serve a single session over stdin/stdout instead of TCP
        #[arg(long)]
        stdio: bool,

        /// Enable testing mode (allows `clear`)
        #[arg(long)]
        testing: bool,
    },

    /// Print the stored hash for a password
    HashPassword {
        /// Plaintext password
        password: String,
    },

    /// Write a starter configuration file with a single account
    InitConfig {
        /// Destination path
        path: PathBuf,

        /// Account name
        #[arg(long)]
        user: String,

        /// Account password
        #[arg(long)]
        password: String,

        /// Granted level: none, read or write
        #[arg(long, default_value = "write")]
        permission: String,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so stdio mode keeps stdout for responses.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            listen,
            stdio,
            testing,
        } => {
            let mut settings = match config {
                Some(path) => config::load_config(&path)?,
                None => ServerConfig::default(),
            };
            if let Some(addr) = listen {
                settings.listen = addr;
            }
            settings.testing |= testing;
            serve(settings, stdio)?;
        }

        Commands::HashPassword { password } => {
            println!("{}", hash_password(&password));
        }

        Commands::InitConfig {
            path,
            user,
            password,
            permission,
        } => {
            let permission: Permission = permission.parse()?;
            let settings = ServerConfig {
                users: vec![UserEntry::with_password(user, &password, permission)],
                ..ServerConfig::default()
            };
            config::write_config(&path, &settings)?;
            println!("Wrote configuration to {:?}", path);
        }
    }

    Ok(())
}

fn serve(settings: ServerConfig, stdio: bool) -> Result<()> {
    if settings.users.is_empty() {
        warn!("No accounts configured; only version? and auth will succeed");
    }
    if settings.testing {
        warn!("Running in testing mode! Do not deploy in production.");
    }

    let store = Arc::new(MemoryStore::new());
    let dispatcher = Dispatcher::new(store.clone(), store, Arc::new(settings.credentials()))
        .with_testing(settings.testing);

    if stdio {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let writer = BufWriter::new(stdout.lock());
        let mut session = Session::new(&dispatcher, settings.max_message_len);
        return session
            .run(stdin.lock(), writer)
            .context("stdio session failed");
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    runtime.block_on(async move {
        let listener = TcpListener::bind(settings.listen.as_str())
            .await
            .with_context(|| format!("Failed to bind {}", settings.listen))?;
        let shutdown = async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        };
        server::serve(
            listener,
            Arc::new(dispatcher),
            settings.max_message_len,
            shutdown,
        )
        .await
        .context("listener failed")?;
        info!("server stopped");
        Ok::<_, anyhow::Error>(())
    })
}
