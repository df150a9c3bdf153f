// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::Parser;
use glassd::config::{DaemonConfig, ServerOptions};
use glassd::{ipc, AppContext};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glassd", about = "Glass — live mirror-editing daemon", version)]
struct Args {
    /// Path to config.toml (defaults apply when omitted)
    #[arg(long, env = "GLASSD_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// WebSocket server port
    #[arg(long, env = "GLASSD_PORT")]
    port: Option<u16>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "GLASSD_BIND")]
    bind_address: Option<String>,

    /// Language bound to new sessions (default: text)
    #[arg(long, env = "GLASSD_LANGUAGE")]
    language: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GLASSD_LOG")]
    log: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "GLASSD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,

    /// Include exception messages in error results sent to clients
    #[arg(long, env = "GLASSD_EXCEPTION_DETAILS")]
    include_exception_details: bool,

    /// Record a per-session command ring, dumped by the self-debug command
    #[arg(long, env = "GLASSD_SELF_DEBUG")]
    self_debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(args.log.as_deref().unwrap_or("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // File logging keeps a guard alive for the process lifetime; dropping
    // it would lose buffered lines.
    let _file_guard = match &args.log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            let file = path.file_name().map(|f| f.to_os_string()).unwrap_or_else(|| "glassd.log".into());
            let appender = tracing_appender::rolling::daily(dir, file);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    };

    let mut config = DaemonConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind_address {
        config.bind_address = bind;
    }
    if let Some(language) = args.language {
        config.default_language = language;
    }
    if args.include_exception_details {
        config.include_exception_details = true;
    }
    if args.self_debug {
        config.self_debug_enabled = true;
    }

    let options = ServerOptions::from_daemon_config(&config);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        languages = ?options.registry.names(),
        default = %config.default_language,
        "starting glassd"
    );

    let ctx = AppContext::new(config, options)?;
    ipc::run(ctx).await
}
