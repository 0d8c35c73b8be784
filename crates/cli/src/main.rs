mod content_commands;
mod job_commands;
mod publish_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "gramflow", about = "gramflow — scheduled media publishing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config file (overrides discovery in ./ and ~/.config/gramflow/).
    #[arg(long, global = true, env = "GRAMFLOW_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the scheduler loop.
    Run,
    /// Publish immediately, bypassing the scheduler.
    Post(publish_commands::PostArgs),
    /// Scheduled job management.
    Jobs {
        #[command(subcommand)]
        action: job_commands::JobAction,
    },
    /// AI content generation.
    Generate {
        #[command(subcommand)]
        action: content_commands::GenerateAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = match &cli.config {
        Some(path) => gramflow_config::load_config(path)?,
        None => gramflow_config::discover_and_load(),
    };

    match cli.command {
        Commands::Run => publish_commands::run_scheduler(&config).await,
        Commands::Post(args) => publish_commands::post_now(&config, args).await,
        Commands::Jobs { action } => job_commands::handle(&config, action).await,
        Commands::Generate { action } => content_commands::handle(&config, action).await,
    }
}
