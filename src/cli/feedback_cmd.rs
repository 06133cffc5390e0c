use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::agents::AgentKind;
use crate::feedback::{ErrorCategory, FeedbackCreate, FeedbackFilter, FeedbackStore, Rating};

#[derive(Debug, Args)]
pub struct FeedbackArgs {
    #[command(subcommand)]
    pub command: FeedbackCommand,
}

#[derive(Debug, Subcommand)]
pub enum FeedbackCommand {
    /// Record feedback for one agent response.
    Submit(SubmitArgs),
    /// List recorded feedback, newest first.
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Agent the feedback is about (risk_analyzer, score_manager, action_planner).
    #[arg(long)]
    pub agent: AgentKind,

    /// Rating (terrible, bad, normal, good, amazing).
    #[arg(long)]
    pub rating: Rating,

    /// Optional free-text comment.
    #[arg(long)]
    pub comment: Option<String>,

    /// Error-category tags, comma separated (e.g. missed_hazard,false_positive).
    #[arg(long, value_delimiter = ',')]
    pub error_categories: Option<Vec<ErrorCategory>>,

    /// JSON snapshot of the input the agent received.
    #[arg(long)]
    pub input: String,

    /// JSON snapshot of the output the agent produced.
    #[arg(long)]
    pub response: String,

    #[arg(long)]
    pub session_id: Option<String>,

    #[arg(long)]
    pub pipeline_run_id: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only show feedback for this agent.
    #[arg(long)]
    pub agent: Option<AgentKind>,

    /// Only show feedback with this rating.
    #[arg(long)]
    pub rating: Option<Rating>,

    /// Maximum number of records to show.
    #[arg(long, default_value_t = 100)]
    pub limit: usize,
}

pub fn run(args: FeedbackArgs) -> Result<()> {
    let store = FeedbackStore::open_default()?;
    match args.command {
        FeedbackCommand::Submit(submit) => {
            let feedback = store
                .append(FeedbackCreate {
                    agent_type: submit.agent,
                    rating: submit.rating,
                    comment: submit.comment,
                    error_categories: submit.error_categories,
                    original_input: submit.input,
                    agent_response: submit.response,
                    session_id: submit.session_id,
                    pipeline_run_id: submit.pipeline_run_id,
                })
                .context("Failed to record feedback")?;
            println!("Feedback {} saved to {}", feedback.id, store.path().display());
            Ok(())
        }
        FeedbackCommand::List(list) => {
            let records = store.list(&FeedbackFilter {
                agent_type: list.agent,
                rating: list.rating,
                limit: Some(list.limit),
            })?;

            if records.is_empty() {
                println!("No feedback recorded.");
                return Ok(());
            }

            for record in records {
                println!(
                    "{} {} {} {}",
                    record.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                    record.agent_type.to_string().cyan(),
                    record.rating.to_string().bold(),
                    record.comment.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }
    }
}
