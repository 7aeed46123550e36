//! # ECDIS Risk Server
//!
//! Native host for the collision risk engine.
//!
//! This crate runs an [`ecdis_risk_core::CollisionRiskEngine`] inside a tokio
//! runtime:
//! - Drives the engine's fast and cleanup ticks from tokio intervals
//! - Reads own-ship, target, environment and guard zone updates from a
//!   JSON-lines feed (a file or stdin)
//! - Broadcasts risk events and optionally writes them to stdout
//! - Loads the assessment configuration from a JSON file
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  ecdis-risk-server                      │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────┐ │
//! │  │ feed        │  │ RiskMonitor │  │ event output     │ │
//! │  │ (JSON lines)│  │ (intervals) │  │ (JSON lines)     │ │
//! │  └──────┬──────┘  └──────┬──────┘  └────────▲─────────┘ │
//! │         │                │                  │           │
//! │         ▼                ▼                  │           │
//! │  ┌─────────────────────────────────────┐    │           │
//! │  │  CollisionRiskEngine (Arc)          │    │           │
//! │  └──────────────────┬──────────────────┘    │           │
//! │                     ▼                       │           │
//! │  ┌─────────────────────────────────────────────────────┐│
//! │  │              TokioHost                              ││
//! │  │  - wall clock, log routing                          ││
//! │  │  - broadcast::Sender<RiskEvent>                     ││
//! │  └─────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Components
//!
//! - [`monitor::RiskMonitor`] - Timer driver for the engine scheduler
//! - [`tokio_host::TokioHost`] - Tokio-based [`ecdis_risk_core::EngineHost`]
//! - [`feed`] - JSON-lines update feed
//! - [`config`] - Configuration file loading
//! - [`output`] - Risk events as JSON lines
//!
//! ## Example: Starting the Monitor
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use ecdis_risk_core::{CollisionRiskEngine, RiskAssessmentConfig};
//! use ecdis_risk_server::{monitor::RiskMonitor, tokio_host::TokioHost};
//! use tokio_graceful_shutdown::{SubsystemBuilder, Toplevel};
//!
//! #[tokio::main]
//! async fn main() {
//!     let host = Arc::new(TokioHost::new());
//!     let engine = CollisionRiskEngine::new(RiskAssessmentConfig::default(), host.clone())
//!         .unwrap();
//!     let monitor = Arc::new(RiskMonitor::new(Arc::new(engine)));
//!
//!     Toplevel::new(|s| async move {
//!         s.start(SubsystemBuilder::new("monitor", |s| monitor.run(s)));
//!     })
//!     .catch_signals()
//!     .handle_shutdown_requests(Duration::from_secs(5))
//!     .await
//!     .unwrap();
//! }
//! ```
//!
//! ## Command-Line Interface
//!
//! See [`Cli`] for all available options. Key options:
//!
//! - `-c, --config` - Configuration file (default: project config dir)
//! - `-f, --feed` - Update feed, `-` for stdin
//! - `--output` - Write risk events to stdout as JSON lines
//! - `-v` - Increase verbosity (use multiple times)

extern crate tokio;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ecdis_risk_core::{RiskError, RiskEvent};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_graceful_shutdown::{SubsystemBuilder, Toplevel};

use crate::monitor::RiskMonitor;

pub mod config;
pub mod feed;
pub mod monitor;
pub mod output;
pub mod tokio_host;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Clone, Debug)]
#[command(version, about)]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    /// Configuration file (JSON). Defaults to risk-config.json in the
    /// project config directory; a missing default file means defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Update feed with one JSON message per line, `-` for stdin
    #[arg(short, long, default_value = "-")]
    pub feed: String,

    /// Write risk events to stdout as JSON lines
    #[arg(long, default_value_t = false)]
    pub output: bool,

    /// Shut down once the feed reaches end of file
    #[arg(long, default_value_t = false)]
    pub exit_on_eof: bool,

    /// Write the default configuration to the config path and exit
    #[arg(long, default_value_t = false)]
    pub write_default_config: bool,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Cannot access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: RiskError,
    },
    #[error("Stream I/O failed")]
    Stream(#[from] io::Error),
    #[error("No configuration directory available on this platform")]
    NoConfigDir,
}

/// Run the monitor, the feed and (with `events`) the output writer until a
/// signal arrives or, with `--exit-on-eof`, the feed ends.
pub async fn serve(
    args: Cli,
    monitor: Arc<RiskMonitor>,
    events: Option<broadcast::Receiver<RiskEvent>>,
) -> miette::Result<()> {
    Toplevel::new(move |s| async move {
        if let Some(events) = events {
            s.start(SubsystemBuilder::new("output", |s| output::run(events, s)));
        }
        s.start(SubsystemBuilder::new("monitor", {
            let monitor = monitor.clone();
            |s| monitor.run(s)
        }));
        s.start(SubsystemBuilder::new("feed", move |s| {
            feed::run(args.feed, monitor, args.exit_on_eof, s)
        }));
    })
    .catch_signals()
    .handle_shutdown_requests(Duration::from_secs(5))
    .await
    .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokio_host::TokioHost;
    use ecdis_risk_core::{CollisionRiskEngine, RiskAssessmentConfig};

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["ecdis-risk-server"]);
        assert_eq!(cli.feed, "-");
        assert!(cli.config.is_none());
        assert!(!cli.output);
        assert!(!cli.exit_on_eof);
    }

    #[test]
    fn test_cli_options() {
        let cli = Cli::parse_from([
            "ecdis-risk-server",
            "--config",
            "/tmp/risk.json",
            "-f",
            "track.jsonl",
            "--output",
            "--exit-on-eof",
            "-vv",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/risk.json")));
        assert_eq!(cli.feed, "track.jsonl");
        assert!(cli.output);
        assert!(cli.exit_on_eof);
        assert_eq!(cli.verbose.log_level_filter(), log::LevelFilter::Trace);
    }

    #[tokio::test]
    async fn test_serve_stops_at_end_of_feed() {
        let dir = tempfile::tempdir().unwrap();
        let feed_path = dir.path().join("track.jsonl");
        std::fs::write(
            &feed_path,
            concat!(
                "{\"type\":\"own_ship\",\"lat\":0.0,\"lon\":1.0,\"heading\":90.0,\"sog\":10.0}\n",
                "{\"type\":\"target\",\"id\":\"244123456\",\"lat\":0.0,\"lon\":1.02,\"cog\":270.0,\"sog\":10.0}\n",
            ),
        )
        .unwrap();

        let args = Cli::parse_from([
            "ecdis-risk-server",
            "--feed",
            feed_path.to_str().unwrap(),
            "--exit-on-eof",
        ]);
        let host = Arc::new(TokioHost::new());
        let engine =
            CollisionRiskEngine::new(RiskAssessmentConfig::default(), host.clone()).unwrap();
        let monitor = Arc::new(RiskMonitor::new(Arc::new(engine)));
        let events = Some(host.subscribe());

        tokio::time::timeout(
            Duration::from_secs(10),
            serve(args, monitor.clone(), events),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(!monitor.is_running());
        assert_eq!(
            monitor.engine().tracked_targets(),
            vec!["244123456".to_string()]
        );
    }
}
