//! Tally CLI - Natural-language expense tracking
//!
//! Usage:
//!   tally parse "午餐 150"                  Parse a note into an expense
//!   tally trends --file expenses.json       Monthly spending trends
//!   tally anomalies --file expenses.json    Unusual expenses and days
//!   tally serve --port 3000                 Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;
    let json = cli.json;

    match cli.command {
        Commands::Parse {
            text,
            samples,
            offline,
        } => commands::cmd_parse(&config, &text, samples.as_deref(), offline, json).await,
        Commands::Trends {
            file,
            category,
            include_income,
            months,
            today,
        } => commands::cmd_trends(
            &config,
            &file,
            category.as_deref(),
            include_income,
            months,
            today.as_deref(),
            json,
        ),
        Commands::Anomalies {
            file,
            baseline,
            recent,
            days,
            today,
            threshold,
            min_samples,
        } => {
            let source = match (file, baseline, recent) {
                (Some(file), _, _) => commands::AnomalySource::History {
                    file,
                    days,
                    today,
                },
                (None, Some(baseline), Some(recent)) => {
                    commands::AnomalySource::Explicit { baseline, recent }
                }
                _ => anyhow::bail!("Pass --file, or both --baseline and --recent"),
            };
            commands::cmd_anomalies(&config, source, threshold, min_samples, json)
        }
        Commands::Summary { file, month } => commands::cmd_summary(&file, &month, json),
        Commands::Categories { file } => commands::cmd_categories(&file, json),
        Commands::Subscriptions {
            file,
            today,
            billing,
        } => commands::cmd_subscriptions(&config, &file, today.as_deref(), billing, json),
        Commands::AiTest { text } => commands::cmd_ai_test(&config, text.as_deref()).await,
        Commands::Serve {
            port,
            host,
            allowed_origins,
        } => commands::cmd_serve(config, &host, port, allowed_origins).await,
    }
}
