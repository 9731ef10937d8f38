use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lib::config::{self, Config};
use lib::transport::{upload_image_file, LarkTransport};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "larkbridge")]
#[command(about = "Lark webhook relay bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: LARKBRIDGE_CONFIG_PATH or ~/.larkbridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the webhook server.
    Serve {
        /// Config file path (default: LARKBRIDGE_CONFIG_PATH or ~/.larkbridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config, LARKBRIDGE_PORT env, or 9000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Upload an image file to the chat platform and print its image key.
    Upload {
        /// Path to the image file
        path: PathBuf,

        /// Config file path (default: LARKBRIDGE_CONFIG_PATH or ~/.larkbridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Version) | None => {
            println!("larkbridge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Init { config }) => run_init(config),
        Some(Commands::Serve { config, port }) => run_serve(config, port).await,
        Some(Commands::Upload { path, config }) => run_upload(path, config).await,
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Create the config directory and write a default config file when missing.
fn run_init(config_path: Option<PathBuf>) -> Result<()> {
    let path = config_path.unwrap_or_else(config::default_config_path);
    if path.exists() {
        println!("config already exists: {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let default = serde_json::to_string_pretty(&Config::default())?;
    std::fs::write(&path, default).with_context(|| format!("writing {}", path.display()))?;
    println!("wrote default config: {}", path.display());
    println!("set app.appId, app.appSecret and answer.url (or use LARK_APP_ID, LARK_APP_SECRET, ANSWER_SERVICE_URL)");
    Ok(())
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> Result<()> {
    let (mut config, path) = config::load_config(config_path)?;
    log::debug!("using config from {}", path.display());
    if let Ok(env_port) = std::env::var("LARKBRIDGE_PORT") {
        if let Ok(p) = env_port.trim().parse() {
            config.server.port = p;
        }
    }
    if let Some(p) = port {
        config.server.port = p;
    }
    lib::gateway::run_server(config).await
}

/// Upload an image through the configured transport; prints the image key so
/// it can be referenced in replies or used to verify credentials end to end.
async fn run_upload(path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let (config, _) = config::load_config(config_path)?;
    let app_id =
        config::resolve_app_id(&config).context("app id is not configured (LARK_APP_ID)")?;
    let app_secret = config::resolve_app_secret(&config)
        .context("app secret is not configured (LARK_APP_SECRET)")?;
    let transport = LarkTransport::new(app_id, app_secret, None);
    let image_key = upload_image_file(&transport, &path)
        .await
        .with_context(|| format!("uploading {}", path.display()))?;
    println!("{}", image_key);
    Ok(())
}
