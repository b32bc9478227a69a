use std::path::PathBuf;
use std::sync::Arc;
use clap::{Parser, Subcommand};
use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wikitutor::{ApiServer, ApiServerConfig};
use wikitutor_kb::{FetchMode, KbConfig, Level, LinkPolicy, PersistentStore, Resolver, SqliteStore};

#[derive(Parser)]
#[command(name = "wikitutor")]
#[command(about = "Wikipedia intros, links and tiered summaries", long_about = None)]
struct Cli {
    /// SQLite database path (overrides WIKITUTOR_DB_PATH)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Redis URL for the volatile cache (overrides REDIS_URL)
    #[arg(long)]
    redis_url: Option<String>,

    /// Link selection policy: lead or referenced (overrides LINK_POLICY)
    #[arg(long)]
    link_policy: Option<LinkPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start API server
    Serve {
        /// Host to bind to
        #[arg(long, env = "WIKITUTOR_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, env = "WIKITUTOR_PORT", default_value = "5000")]
        port: u16,
    },

    /// Create the database schema
    InitDb,

    /// Print a topic's intro and internal links
    Topic {
        /// Topic title
        topic: String,

        /// Maximum links to print
        #[arg(short, long, default_value = "5")]
        max_links: usize,

        /// Skip cache and store, re-fetch from Wikipedia
        #[arg(long)]
        refresh: bool,
    },

    /// Print one reading-level summary of a topic
    Summary {
        /// Topic title
        topic: String,

        /// basic, intermediate or advanced
        #[arg(short, long, default_value = "basic")]
        level: Level,
    },

    /// Drop a topic's cache entries
    Invalidate {
        /// Topic title
        topic: String,
    },

    /// Check the persistent store
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "wikitutor=info,wikitutor_kb=info".into())
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Serve { ref host, port } => {
            let resolver = Arc::new(Resolver::connect(&config).await?);
            let server = ApiServer::new(
                ApiServerConfig {
                    host: host.clone(),
                    port,
                },
                resolver,
            );
            println!("Starting API server on {}:{}", host, port);
            server.start().await?;
        }

        Commands::InitDb => {
            SqliteStore::open(&config.db_path)?;
            println!("Database initialized at {}", config.db_path.display());
        }

        Commands::Topic { ref topic, max_links, refresh } => {
            let resolver = Resolver::connect(&config).await?;
            let mode = if refresh { FetchMode::Refresh } else { FetchMode::Tiered };

            let article = resolver.resolve_article_with(topic, mode).await?;
            let title = resolver.canonical_title(topic).await?;
            println!("{} (from {})", title, article.tier);
            println!("{}", "=".repeat(70));
            println!("{}", article.value);

            match resolver.resolve_links_with(topic, mode).await {
                Ok(links) if !links.value.is_empty() => {
                    println!();
                    println!("Links:");
                    for link in links.value.iter().take(max_links) {
                        println!("  - {}", link);
                    }
                }
                Ok(_) => println!("\nNo links."),
                Err(e) => println!("\nLinks unavailable: {}", e),
            }
        }

        Commands::Summary { ref topic, level } => {
            let resolver = Resolver::connect(&config).await?;
            let summary = resolver.resolve_summary(topic, level).await?;
            println!("{} [{}] (from {})", topic, level, summary.tier);
            println!("{}", "=".repeat(70));
            println!("{}", summary.value);
        }

        Commands::Invalidate { ref topic } => {
            let resolver = Resolver::connect(&config).await?;
            let event = resolver.invalidate(topic).await?;
            println!("Invalidated {} keys:", event.keys.len());
            for key in event.keys {
                println!("  - {}", key);
            }
        }

        Commands::Health => {
            let store = SqliteStore::open(&config.db_path)?;
            let result = store.health_check().await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.status.is_operational() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Environment configuration with command-line overrides applied
fn load_config(cli: &Cli) -> Result<KbConfig> {
    let mut config = KbConfig::from_env()?;

    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(url) = &cli.redis_url {
        config.redis_url = Some(url.clone());
    }
    if let Some(policy) = cli.link_policy {
        config.link_policy = policy;
    }

    Ok(config)
}
