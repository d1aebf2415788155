mod console;

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    tokio::io::{AsyncBufReadExt, BufReader},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    console::ConsoleTransport,
    snagbot_channels::Transport,
    snagbot_media::{MediaSource, YtDlp},
};

#[derive(Parser)]
#[command(name = "snagbot", about = "snagbot — chat-bot media downloader")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file path (overrides the default location).
    #[arg(long, global = true, env = "SNAGBOT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot on a console transport (default when no subcommand is
    /// provided).
    Run,
    /// Check that the external tools are available.
    Doctor,
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
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "snagbot starting");

    match cli.command {
        None | Some(Commands::Run) => run(cli.config.as_deref()).await,
        Some(Commands::Doctor) => doctor(cli.config.as_deref()),
    }
}

async fn run(config_path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let config = snagbot_config::load(config_path)?;
    tokio::fs::create_dir_all(&config.downloads.dir).await?;

    let source: Arc<dyn MediaSource> = Arc::new(YtDlp::new(
        &config.ytdlp.binary,
        config.ytdlp.cookies_file.as_deref(),
    )?);
    let transport: Arc<dyn Transport> = Arc::new(ConsoleTransport::new());
    let registry = snagbot_plugins::build_registry(Arc::clone(&transport), source, &config);

    info!(
        plugins = ?registry.list(),
        prefix = %config.bot.command_prefix,
        "bot ready; type commands on stdin, @<msg-id> to quote a message"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next_id: u64 = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) if !line.trim().is_empty() => {
                        next_id += 1;
                        let msg = console::parse_line(
                            "console",
                            "local",
                            &format!("in-{next_id}"),
                            &line,
                        );
                        registry.dispatch(&config.bot.command_prefix, &msg).await;
                    },
                    Some(_) => {},
                    None => break,
                }
            }
        }
    }
    Ok(())
}

fn doctor(config_path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let config = snagbot_config::load(config_path)?;
    for tool in [config.ytdlp.binary.as_str(), "ffmpeg"] {
        match which::which(tool) {
            Ok(path) => println!("ok:      {tool} -> {}", path.display()),
            Err(_) => println!("missing: {tool}"),
        }
    }
    if let Some(cookies) = &config.ytdlp.cookies_file {
        let state = if cookies.exists() { "ok:     " } else { "missing:" };
        println!("{state} cookies -> {}", cookies.display());
    }
    Ok(())
}
