use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use thread_relay::api::{create_router, AppState};
use thread_relay::client::{AutoRefresh, RelayHttp, RelaySocket, ThreadView, POLL_INTERVAL};
use thread_relay::protocol::WireMessage;
use thread_relay::upstream::{ThreadsClient, DEFAULT_BASE_URL};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Relay between a chat UI and an upstream conversation-thread API.",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    /// Reduce output to only errors
    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    quiet: bool,
    /// Increase logging verbosity (stackable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the relay HTTP/WebSocket server
    Serve(ServeCommand),
    /// Follow a thread from a running relay in the terminal
    Watch(WatchCommand),
}

#[derive(Debug, Args)]
struct ServeCommand {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port to listen on
    #[arg(long, default_value_t = 5000)]
    port: u16,
    /// Base URL of the upstream thread provider
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    upstream_url: String,
}

#[derive(Debug, Args)]
struct WatchCommand {
    /// Base URL of the relay
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    server: String,
    /// External thread identifier to follow
    #[arg(long)]
    thread_id: String,
    /// Upstream API key, forwarded to the relay
    #[arg(long, env = "OPENAI_API_KEY")]
    api_key: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.common);

    match cli.command {
        Command::Serve(cmd) => serve(cmd).await,
        Command::Watch(cmd) => watch(cmd).await,
    }
}

fn init_tracing(opts: &CommonOpts) {
    let default_level = if opts.quiet {
        "error"
    } else {
        match opts.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn serve(cmd: ServeCommand) -> Result<()> {
    let state = AppState::new(ThreadsClient::new(cmd.upstream_url.clone()));
    let router = create_router(state);

    let addr = format!("{}:{}", cmd.host, cmd.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(addr = %addr, upstream = %cmd.upstream_url, "thread relay listening");

    axum::serve(listener, router)
        .await
        .context("serving HTTP")?;
    Ok(())
}

async fn watch(cmd: WatchCommand) -> Result<()> {
    let http = RelayHttp::new(cmd.server.clone());
    let view = Mutex::new(ThreadView::new(cmd.thread_id.clone()));

    // Initial load populates the view and subscribes server-side caches.
    let initial = http
        .load_thread(&cmd.thread_id, &cmd.api_key)
        .await
        .context("loading thread")?;
    info!(thread_id = %cmd.thread_id, count = initial.len(), "thread loaded");
    for message in &initial {
        print_message(message);
    }
    view.lock().expect("view lock poisoned").apply_refresh(initial);

    // Push channel: ws://.../ws with automatic reconnect.
    let ws_url = format!("{}/ws", cmd.server.replacen("http", "ws", 1));
    let mut socket = RelaySocket::connect(ws_url);
    socket.subscribe(&cmd.thread_id).await;

    // Poll channel: fixed interval, skipped while a request is outstanding.
    let refresh = AutoRefresh::new(http, cmd.api_key.clone());
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ticker.tick().await; // first tick completes immediately

    loop {
        tokio::select! {
            frame = socket.next_frame() => {
                let Some(frame) = frame else { break };
                let appended = view
                    .lock()
                    .expect("view lock poisoned")
                    .apply_frame(frame);
                for message in &appended {
                    print_message(message);
                }
            }
            _ = ticker.tick() => {
                for message in &refresh.poll_once(&view).await {
                    print_message(message);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                socket.unsubscribe(&cmd.thread_id).await;
                break;
            }
        }
    }
    Ok(())
}

fn print_message(message: &WireMessage) {
    let role = message.role.to_string();
    println!("[{}] {:>9}: {}", message.timestamp, role, message.content);
}
