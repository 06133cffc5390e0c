//! Command-line boundary around the observation pipeline.
//!
//! Request validation and the external-alias remapping live here, not in
//! the core: the pipeline only ever sees a fully-formed [`Observation`].

mod analyze;
mod feedback_cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::config::Config;

pub use analyze::AnalyzeArgs;
pub use feedback_cmd::FeedbackArgs;

#[derive(Debug, Parser)]
#[command(
    name = "sitewatch",
    about = "AI-powered safety observation analyzer",
    version,
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a safety observation through the analysis pipeline.
    Analyze(AnalyzeArgs),
    /// Record or list feedback on agent output.
    Feedback(FeedbackArgs),
    /// Show the resolved configuration.
    Config,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Analyze(args) => analyze::run(args).await,
            Command::Feedback(args) => feedback_cmd::run(args),
            Command::Config => show_config(),
        }
    }
}

fn show_config() -> Result<()> {
    let config = Config::load()?;
    println!("{}", "Configuration".bold());
    println!("  provider:   {}", config.llm.provider);
    println!("  base_url:   {}", config.llm.base_url);
    println!("  api_key:    {}", mask_key(&config.llm.api_key));
    println!("  timeout:    {}s", config.llm.timeout_secs);
    println!("  model:      {}", config.models.model);
    println!("  max_tokens: {}", config.models.max_tokens);
    println!("  file:       {}", Config::config_path()?.display());
    Ok(())
}

fn mask_key(key: &str) -> String {
    if key.len() <= 8 {
        "********".to_string()
    } else {
        format!("{}…{}", &key[..4], &key[key.len() - 4..])
    }
}
