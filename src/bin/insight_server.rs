use clap::Parser;
use socialinsight::config::toml_config::TomlConfig;
use socialinsight::dashboard::server::{refresh_worker, DashboardConfig, DashboardServer};
use socialinsight::dashboard::DashboardState;
use socialinsight::utils::{logger, validation::Validate};

#[derive(Parser)]
#[command(name = "insight-server")]
#[command(about = "Live dashboard for scraped social profile metrics")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "insight-config.toml")]
    config: String,

    /// Override listen host from config
    #[arg(long)]
    host: Option<String>,

    /// Override listen port from config
    #[arg(long)]
    port: Option<u16>,

    /// Override refresh interval (seconds) from config
    #[arg(long)]
    refresh_seconds: Option<u64>,

    /// Log in human-readable format instead of JSON
    #[arg(long)]
    pretty_logs: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.pretty_logs {
        logger::init_cli_logger(args.verbose);
    } else {
        logger::init_server_logger(args.verbose);
    }

    tracing::info!("🚀 Starting insight dashboard server");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let server_config = DashboardConfig {
        host: args.host.unwrap_or_else(|| config.dashboard_host()),
        port: args.port.unwrap_or_else(|| config.dashboard_port()),
        refresh_seconds: args
            .refresh_seconds
            .unwrap_or_else(|| config.dashboard_refresh_seconds()),
        enable_cors: config.dashboard_cors_enabled(),
    };

    let state = DashboardState::new();

    // 背景刷新迴圈：啟動時先抓一次，之後按間隔或手動觸發
    let refresh_state = state.clone();
    let refresh_seconds = server_config.refresh_seconds;
    tokio::spawn(async move {
        refresh_worker(refresh_state, config, refresh_seconds).await;
    });

    DashboardServer::with_config(state, server_config).run().await
}
