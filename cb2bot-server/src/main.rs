use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use cb2bot_core::BotConfig;

mod context;
use context::ServerContext;

#[derive(Parser, Debug, Clone)]
#[command(name = "cb2bot")]
#[command(author, version, about = "cb2bot - Twitch chat bot with EventSub announcements")]
pub struct Args {
    /// Env file loaded before reading configuration.
    #[arg(long, default_value = "config.env")]
    env_file: String,

    /// Overrides HTTP_PORT.
    #[arg(long)]
    http_port: Option<u16>,

    /// Overrides DB (SQLite file path).
    #[arg(long)]
    db_path: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("cb2bot=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {}", e);
    }
}

/// Loads `path` into the process environment. Runs before `init_tracing` so a
/// `RUST_LOG` set in the file reaches the filter.
fn load_env_file(path: &str) -> Result<PathBuf, dotenv::Error> {
    dotenv::from_filename(path)
}

fn load_config(args: &Args) -> anyhow::Result<BotConfig> {
    let mut config = BotConfig::from_env()?;
    if let Some(port) = args.http_port {
        config.http_port = port;
    }
    if let Some(path) = args.db_path.as_ref() {
        config.db_path = path.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let env_file = load_env_file(&args.env_file);
    init_tracing();
    match env_file {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => warn!("Could not load {}: {} (using the process environment)", args.env_file, e),
    }

    let config = load_config(&args)?;
    info!("cb2bot starting: {:?}", config);

    let ctx = match ServerContext::new(config).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Startup failed: {:?}", e);
            return Err(e);
        }
    };

    if let Err(e) = ctx.run().await {
        error!("Server error: {:?}", e);
        return Err(e);
    }

    info!("Main finished. Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_file_values_reach_the_process_environment() {
        let path = std::env::temp_dir().join(format!("cb2bot-env-{}.env", std::process::id()));
        std::fs::write(&path, "CB2BOT_ENV_FILE_CHECK=loaded\n").unwrap();

        let loaded = load_env_file(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();

        assert!(loaded.is_ok());
        assert_eq!(std::env::var("CB2BOT_ENV_FILE_CHECK").as_deref(), Ok("loaded"));
    }

    #[test]
    fn missing_env_file_is_an_error() {
        assert!(load_env_file("/nonexistent/cb2bot/config.env").is_err());
    }
}
