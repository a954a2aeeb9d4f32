//! # Pathwise
//!
//! The developer harness for the Pathwise learning-path engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │              apps/pathwise (THE BINARY)           │
//! │                                                   │
//! │  ┌─────────────┐   ┌──────────────┐               │
//! │  │   CLI       │   │   Config     │               │
//! │  │  (clap)     │   │  (toml)      │               │
//! │  └──────┬──────┘   └──────┬───────┘               │
//! │         └────────┬────────┘                       │
//! │                  ▼                                │
//! │          ┌───────────────┐                        │
//! │          │ pathwise-core │                        │
//! │          │ (THE LOGIC)   │                        │
//! │          └───────────────┘                        │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! pathwise graph -i skill.json
//! pathwise link -i skill.json --concept 3 --prerequisite 1 --write
//! pathwise roadmap -i courses.json --json-mode
//! pathwise assess -i questions.json --answers A,B,A,C,A
//! ```

use clap::Parser;
use pathwise::cli;
use pathwise::config::{AppConfig, LogConfig, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    init_tracing(&config.log, cli.verbose);

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli, &config) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install the global subscriber.
///
/// `PATHWISE_LOG_FORMAT=json` enables machine-parseable output. The filter
/// is `RUST_LOG` when set, else debug for both crates under `--verbose`,
/// else the configured one.
fn init_tracing(log: &LogConfig, verbose: bool) {
    let format = std::env::var("PATHWISE_LOG_FORMAT")
        .map(|value| LogFormat::from_env_value(&value))
        .unwrap_or(log.format);

    let rust_log = std::env::var("RUST_LOG").ok();
    let filter =
        tracing_subscriber::EnvFilter::new(log.filter_directive(rust_log.as_deref(), verbose));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Print the Pathwise startup banner.
fn print_banner() {
    println!("Pathwise v{}", env!("CARGO_PKG_VERSION"));
    println!();
}
