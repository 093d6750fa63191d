//! Demo host: drives one editor bridge over stdin/stdout.
//!
//! ```text
//! $ echo '{"id":1,"call":"setColorScheme","scheme":"dark"}' | editor-bridge-stdio
//! {"Event":"Editor Initialising"}
//! {"id":1,"result":null}
//! ```
//!
//! Logs go to stderr, filtered by `EDITOR_BRIDGE_LOG` (default `info`).

mod session;

use clap::Parser;
use editor_bridge::BridgeConfig;
use session::Session;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "editor-bridge-stdio",
    about = "Line-delimited JSON host for editor-bridge",
    version
)]
struct Cli {
    #[arg(long, help = "JSON bridge configuration file")]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_env("EDITOR_BRIDGE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(path: Option<&PathBuf>) -> io::Result<BridgeConfig> {
    let Some(path) = path else {
        return Ok(BridgeConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    BridgeConfig::from_json_str(&text).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config(cli.config.as_ref())?;
    let poll_interval = config.socket_poll_interval();
    tracing::info!(config = ?cli.config, "editor bridge host starting");

    // Stdin blocks, so it gets its own thread; the session stays on this one.
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "stdin read failed");
                    break;
                }
            }
        }
    });

    let mut session = Session::new(config, io::stdout());
    loop {
        match rx.recv_timeout(poll_interval) {
            Ok(line) => session.handle_line(&line),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        session.poll();
    }
    tracing::info!("stdin closed, shutting down");
    Ok(())
}
