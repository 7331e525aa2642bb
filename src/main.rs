use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use embedcache::keys::KeyGeneratorKind;
use embedcache::store::StoreKind;
use embedcache::{CacheEmbeddings, Config, Embedding, KeyGenerator};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "embedcache")]
#[command(about = "Inspect and maintain an embedding cache")]
struct Args {
    /// Config file (default: $EMBEDCACHE_CONFIG or ./embedcache.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured store (memory, filesystem, redis)
    #[arg(long, global = true)]
    store: Option<StoreKind>,

    /// Override the configured key generator (md5, hash)
    #[arg(long, global = true)]
    generator: Option<KeyGeneratorKind>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the cache key of a text
    Key { text: String },
    /// Print the cached embedding of a text as JSON (exit code 1 on miss)
    Get { text: String },
    /// Cache an embedding given as a JSON array of numbers
    Set { text: String, embedding: String },
    /// Remove cached entries from the configured store
    Clear {
        /// Required for the redis store, which flushes the whole instance
        #[arg(long)]
        yes: bool,
    },
    /// Print the resolved configuration
    Config,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load_or_default()?,
    };
    if let Some(store) = args.store {
        config.cache.store = store;
    }
    if let Some(generator) = args.generator {
        config.cache.key_generator = generator;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let config = load_config(&args)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.logging.level.as_str()),
    )
    .init();

    match &args.command {
        Command::Key { text } => {
            // No store needed to derive a key
            let key = config.cache.key_generator.build().generate_key(text);
            println!("{}", key);
        }
        Command::Get { text } => {
            let cache = CacheEmbeddings::from_config(&config.cache)?;
            match cache.get(text).await? {
                Some(embedding) => println!("{}", serde_json::to_string(&embedding)?),
                None => {
                    log::info!("Cache miss for key {}", cache.key_for(text));
                    return Ok(ExitCode::from(1));
                }
            }
        }
        Command::Set { text, embedding } => {
            let embedding: Embedding = serde_json::from_str(embedding)
                .context("embedding must be a JSON array of numbers, e.g. [0.1, 0.2]")?;
            let cache = CacheEmbeddings::from_config(&config.cache)?;
            cache.set(text, &embedding).await?;
            log::info!(
                "Cached {}-dimensional embedding under {}",
                embedding.len(),
                cache.key_for(text)
            );
        }
        Command::Clear { yes } => {
            if config.cache.store == StoreKind::Redis && !yes {
                anyhow::bail!(
                    "clearing the redis store runs FLUSHALL on {}; pass --yes to confirm",
                    config.cache.redis.connection_url()
                );
            }
            let cache = CacheEmbeddings::from_config(&config.cache)?;
            cache.clear().await?;
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}
