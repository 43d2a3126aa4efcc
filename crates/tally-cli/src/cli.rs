//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Natural-language expense tracking and spending insights
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Parse expense notes and analyze spending history", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the data dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a free-text expense note
    Parse {
        /// The note, e.g. "午餐 150" or "taxi 250"
        text: String,

        /// JSON file with recent corrections (most recent first)
        #[arg(long)]
        samples: Option<PathBuf>,

        /// Skip the completion service and use the rule-based parser
        #[arg(long)]
        offline: bool,
    },

    /// Show monthly spending trends
    Trends {
        /// JSON file with expense records
        #[arg(short, long)]
        file: PathBuf,

        /// Restrict to one category (e.g. FOOD)
        #[arg(short, long)]
        category: Option<String>,

        /// Keep INCOME records in the analysis
        #[arg(long)]
        include_income: bool,

        /// Months of history (defaults to config)
        #[arg(short, long)]
        months: Option<u32>,

        /// End of the window, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        today: Option<String>,
    },

    /// Detect unusual expenses and unusual days
    ///
    /// Pass either --file (split into baseline and analysis windows) or
    /// explicit --baseline and --recent files.
    Anomalies {
        /// JSON file with the full expense history
        #[arg(short, long, conflicts_with_all = ["baseline", "recent"])]
        file: Option<PathBuf>,

        /// JSON file with historical (baseline) records
        #[arg(long, requires = "recent")]
        baseline: Option<PathBuf>,

        /// JSON file with the records to score
        #[arg(long, requires = "baseline")]
        recent: Option<PathBuf>,

        /// Analysis window in days when using --file (defaults to config)
        #[arg(long)]
        days: Option<i64>,

        /// End of the analysis window, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        today: Option<String>,

        /// Minimum |z| that is flagged (defaults to config)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Minimum baseline records per category (defaults to config)
        #[arg(long)]
        min_samples: Option<usize>,
    },

    /// Summarize one month
    Summary {
        /// JSON file with expense records
        #[arg(short, long)]
        file: PathBuf,

        /// Month to summarize (YYYY-MM)
        #[arg(short, long)]
        month: String,
    },

    /// Show each category's share of spending
    Categories {
        /// JSON file with expense records
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Summarize subscriptions and upcoming billings
    Subscriptions {
        /// JSON file with subscriptions
        #[arg(short, long)]
        file: PathBuf,

        /// Reference date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        today: Option<String>,

        /// Show due reminders and auto-recorded charges instead of the summary
        #[arg(long)]
        billing: bool,
    },

    /// Test the completion backend configured in the environment
    AiTest {
        /// Note to parse (defaults to a few samples)
        text: Option<String>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origin (repeatable)
        #[arg(long = "allow-origin")]
        allowed_origins: Vec<String>,
    },
}
