// Copyright 2026 Sentra Contributors
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

mod backend;
mod cli;
mod config;
mod detect;
mod engine;
mod events;
mod navigation;
mod overlay;
mod protocol;
mod state;

use config::EngineConfig;

#[derive(Parser)]
#[command(
    name = "sentra",
    about = "Sentra — signup-intent detection and privacy insight engine",
    version,
    after_help = "Run 'sentra <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Path to a JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a page for policy/terms links
    Links {
        /// URL or local HTML file
        source: String,
        /// Page URL to evaluate a local file under
        #[arg(long)]
        url: Option<String>,
    },
    /// Evaluate signup intent for a page
    Detect {
        /// URL or local HTML file
        source: String,
        /// Page URL to evaluate a local file under
        #[arg(long)]
        url: Option<String>,
        /// CSS selector of the focused element
        #[arg(long)]
        focus: Option<String>,
        /// CSS selector of a clicked element (takes precedence over --focus)
        #[arg(long)]
        click: Option<String>,
    },
    /// Fetch a privacy insight for a domain from the analysis backend
    Insight {
        /// Domain to analyze (e.g. "example.com")
        domain: String,
        /// Candidate policy URL; can be repeated
        #[arg(long = "link")]
        links: Vec<String>,
    },
    /// Look up already-finished analyses for one or more domains
    Cached {
        /// Domains to look up
        #[arg(required = true)]
        domains: Vec<String>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate for
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "sentra=debug" } else { "sentra=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse().expect("directive is valid")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match args.command {
        Commands::Links { source, url } => {
            cli::links_cmd::run(&source, url.as_deref(), args.json).await
        }
        Commands::Detect {
            source,
            url,
            focus,
            click,
        } => {
            cli::detect_cmd::run(
                &source,
                url.as_deref(),
                focus.as_deref(),
                click.as_deref(),
                &config,
                args.json,
            )
            .await
        }
        Commands::Insight { domain, links } => {
            cli::insight_cmd::run(&domain, &links, config, args.json).await
        }
        Commands::Cached { domains } => cli::cached_cmd::run(&domains, &config, args.json).await,
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "sentra",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}
