use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::agents::AgentKind;

/// Five-point rating scale for agent output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Terrible,
    Bad,
    Normal,
    Good,
    Amazing,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rating::Terrible => "terrible",
            Rating::Bad => "bad",
            Rating::Normal => "normal",
            Rating::Good => "good",
            Rating::Amazing => "amazing",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for Rating {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terrible" => Ok(Rating::Terrible),
            "bad" => Ok(Rating::Bad),
            "normal" => Ok(Rating::Normal),
            "good" => Ok(Rating::Good),
            "amazing" => Ok(Rating::Amazing),
            other => Err(anyhow!("Unknown rating '{other}'")),
        }
    }
}

/// Tags categorizing what went wrong in an agent's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    // Risk analyzer
    MissedHazard,
    WrongHazardType,
    TooGenericHazard,
    FalsePositive,
    MissingContext,
    // Score manager
    SeverityTooHigh,
    SeverityTooLow,
    LikelihoodTooHigh,
    LikelihoodTooLow,
    PriorityWrong,
    // Action planner
    PlanTooGeneric,
    PlanNotActionable,
    MissingAcceptanceCriteria,
    CitationIrrelevantOrMissing,
}

impl std::str::FromStr for ErrorCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "missed_hazard" => Ok(ErrorCategory::MissedHazard),
            "wrong_hazard_type" => Ok(ErrorCategory::WrongHazardType),
            "too_generic_hazard" => Ok(ErrorCategory::TooGenericHazard),
            "false_positive" => Ok(ErrorCategory::FalsePositive),
            "missing_context" => Ok(ErrorCategory::MissingContext),
            "severity_too_high" => Ok(ErrorCategory::SeverityTooHigh),
            "severity_too_low" => Ok(ErrorCategory::SeverityTooLow),
            "likelihood_too_high" => Ok(ErrorCategory::LikelihoodTooHigh),
            "likelihood_too_low" => Ok(ErrorCategory::LikelihoodTooLow),
            "priority_wrong" => Ok(ErrorCategory::PriorityWrong),
            "plan_too_generic" => Ok(ErrorCategory::PlanTooGeneric),
            "plan_not_actionable" => Ok(ErrorCategory::PlanNotActionable),
            "missing_acceptance_criteria" => Ok(ErrorCategory::MissingAcceptanceCriteria),
            "citation_irrelevant_or_missing" => Ok(ErrorCategory::CitationIrrelevantOrMissing),
            other => Err(anyhow!("Unknown error category '{other}'")),
        }
    }
}

/// Fields supplied by the caller when recording feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackCreate {
    pub agent_type: AgentKind,
    pub rating: Rating,
    pub comment: Option<String>,
    pub error_categories: Option<Vec<ErrorCategory>>,
    /// JSON snapshot of the agent's input.
    pub original_input: String,
    /// JSON snapshot of the agent's output.
    pub agent_response: String,
    pub session_id: Option<String>,
    pub pipeline_run_id: Option<String>,
}

/// Persisted feedback record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub agent_type: AgentKind,
    pub rating: Rating,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_categories: Option<Vec<ErrorCategory>>,
    pub original_input: String,
    pub agent_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_run_id: Option<String>,
}

impl Feedback {
    pub fn new(create: FeedbackCreate) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            agent_type: create.agent_type,
            rating: create.rating,
            comment: create.comment,
            error_categories: create.error_categories,
            original_input: create.original_input,
            agent_response: create.agent_response,
            session_id: create.session_id,
            pipeline_run_id: create.pipeline_run_id,
        }
    }
}
