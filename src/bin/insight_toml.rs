use clap::Parser;
use socialinsight::config::toml_config::TomlConfig;
use socialinsight::core::ConfigProvider;
use socialinsight::utils::{logger, validation::Validate};
use socialinsight::{InsightEngine, LocalStorage, ProfilePipeline};

#[derive(Parser)]
#[command(name = "insight-toml")]
#[command(about = "Profile insight tool with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "insight-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show what would be scraped without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based insight tool");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 顯示配置摘要
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual scraping will occur");
        perform_dry_run(&config);
        return Ok(());
    }

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());

    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 創建存儲和管道
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = match ProfilePipeline::new(storage, config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    // 創建引擎並運行
    let engine = InsightEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Insight report completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ Insight report completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Insight pipeline failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                socialinsight::utils::error::ErrorSeverity::Low => 0,
                socialinsight::utils::error::ErrorSeverity::Medium => 2,
                socialinsight::utils::error::ErrorSeverity::High => 1,
                socialinsight::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Project: {} v{}",
        config.project.name, config.project.version
    );
    println!("  Targets: {}", config.targets.len());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.load.output_formats.join(", "));
    println!("  Concurrent Requests: {}", config.concurrent_requests());
    println!(
        "  Engagement Threshold: {:.2}%",
        config.engagement_threshold() * 100.0
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Scrape Targets:");
    for target in config.targets() {
        println!("  {} -> {}", target.label(), target.url);
        if let Some(selectors) = &target.selectors {
            if let Some(css) = &selectors.followers {
                println!("    followers selector: {}", css);
            }
            if let Some(css) = &selectors.post_item {
                println!("    post item selector: {}", css);
            }
        }
    }

    println!();
    println!("⚙️ Fetch Settings:");
    println!("  User-Agent: {}", config.user_agent());
    println!("  Timeout: {}s", config.request_timeout_secs());
    println!("  Concurrency: {}", config.concurrent_requests());
    if config.fetch_delay_ms() > 0 {
        println!(
            "  Politeness delay: {}ms between requests",
            config.fetch_delay_ms()
        );
    }

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    println!("  Formats: {}", config.load.output_formats.join(", "));

    if config.dashboard.is_some() {
        println!();
        println!("🖥️ Dashboard:");
        println!(
            "  {}:{} (refresh every {}s)",
            config.dashboard_host(),
            config.dashboard_port(),
            config.dashboard_refresh_seconds()
        );
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
