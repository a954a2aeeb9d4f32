//! # Pathwise CLI Module
//!
//! This module implements the CLI interface for Pathwise.
//!
//! ## Available Commands
//!
//! - `graph` - Show a skill's concept graph and topological order
//! - `link` - Validate (and optionally store) a prerequisite edge
//! - `roadmap` - Order courses and build the roadmap
//! - `progress` - Build a user's progress graph
//! - `assess` - Replay answers through a question tree
//! - `check-questions` - Validate a question bank

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use pathwise_core::PathwiseError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Pathwise - learning-path graph engine
///
/// Reads rows from JSON files and prints the derived graphs, orders and
/// scores.
#[derive(Parser, Debug)]
#[command(name = "pathwise")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Path to the configuration file (default: ./pathwise.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a skill's concepts, edges and topological order
    Graph {
        /// Skill snapshot file (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Validate a prerequisite edge against a skill snapshot
    Link {
        /// Skill snapshot file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Concept that needs the prerequisite
        #[arg(long)]
        concept: i64,

        /// Concept to learn first
        #[arg(long)]
        prerequisite: i64,

        /// Append an accepted edge to the snapshot file
        #[arg(short, long)]
        write: bool,
    },

    /// Order courses and build the roadmap
    Roadmap {
        /// Roadmap input file (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Build a user's progress graph
    Progress {
        /// Progress input file (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Replay answers through a skill's question tree
    Assess {
        /// Question bank file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Selected options in order (comma-separated, e.g. A,c,B)
        #[arg(short, long, value_delimiter = ',')]
        answers: Vec<String>,
    },

    /// Check that a question bank forms a complete tree
    CheckQuestions {
        /// Question bank file (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli, config: &AppConfig) -> Result<(), PathwiseError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Graph { input } => cmd_graph(&input, json_mode),
        Commands::Link {
            input,
            concept,
            prerequisite,
            write,
        } => cmd_link(&input, json_mode, concept, prerequisite, write),
        Commands::Roadmap { input } => cmd_roadmap(&input, json_mode),
        Commands::Progress { input } => cmd_progress(&input, json_mode),
        Commands::Assess { input, answers } => {
            cmd_assess(&input, json_mode, &answers, config.assessment_policy())
        }
        Commands::CheckQuestions { input } => cmd_check_questions(&input, json_mode),
    }
}
