//! Reasoning stages and the contract that lets the pipeline sequence them.
//!
//! An agent transforms one typed input into one typed output through an
//! LLM call plus structured parsing. The only externally visible
//! operation is [`Agent::run`]; prompt building and response parsing are
//! internal to each concrete agent, which all follow the same
//! build-prompt, complete, parse-response shape.

mod action_planner;
mod parsing;
mod risk_analyzer;
mod score_manager;

use std::fmt;

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::{CompletionClient, LlmError};

pub use action_planner::ActionPlanner;
pub use risk_analyzer::RiskAnalyzer;
pub use score_manager::ScoreManager;

/// Identity of a reasoning stage, carried on errors and feedback records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    RiskAnalyzer,
    ScoreManager,
    ActionPlanner,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AgentKind::RiskAnalyzer => "risk_analyzer",
            AgentKind::ScoreManager => "score_manager",
            AgentKind::ActionPlanner => "action_planner",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for AgentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "risk_analyzer" => Ok(AgentKind::RiskAnalyzer),
            "score_manager" => Ok(AgentKind::ScoreManager),
            "action_planner" => Ok(AgentKind::ActionPlanner),
            other => Err(anyhow!("Unknown agent '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AgentError {
    /// The stage could not produce valid output from valid input. The
    /// pipeline converts this into a failed result.
    #[error("[{agent}] {message}")]
    Stage { agent: AgentKind, message: String },
    /// The LLM integration itself is broken. The pipeline passes this
    /// through untouched so the boundary can tell the two apart.
    #[error(transparent)]
    Configuration(#[from] crate::client::ConfigurationError),
}

impl AgentError {
    pub fn stage(agent: AgentKind, message: impl Into<String>) -> Self {
        AgentError::Stage {
            agent,
            message: message.into(),
        }
    }
}

/// Contract every reasoning stage satisfies. Input and output types are
/// stage-specific; `Serialize` bounds keep per-stage values snapshotable
/// for feedback capture.
#[async_trait]
pub trait Agent: Send + Sync {
    type Input: Serialize + Send + Sync;
    type Output: Serialize + Send;

    fn kind(&self) -> AgentKind;

    /// Execute the stage against one input item. Must be a pure function
    /// of the input plus the completion the client returns.
    async fn run(&self, input: &Self::Input) -> Result<Self::Output, AgentError>;
}

/// Shared completion step for agents following the standard flow. Call
/// errors become stage errors owned by the calling agent; configuration
/// errors pass through unchanged.
pub(crate) async fn complete_prompt(
    client: &dyn CompletionClient,
    agent: AgentKind,
    prompt: &str,
) -> Result<String, AgentError> {
    client.complete(prompt).await.map_err(|error| match error {
        LlmError::Configuration(inner) => AgentError::Configuration(inner),
        LlmError::Call(message) => AgentError::Stage { agent, message },
    })
}

#[cfg(test)]
mod tests;
