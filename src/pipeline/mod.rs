//! Sequences the three reasoning stages over one observation.
//!
//! Stage order is fixed: risk analysis, scoring, action planning. Each
//! stage consumes the complete ordered output of the previous one, and
//! per-item work inside a stage runs in input order, so two runs against
//! the same observation and a deterministic client produce identical
//! results. Failure is atomic per stage-group: if any item in a stage
//! fails, the run keeps only what earlier stages fully completed.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::{ActionPlanner, Agent, AgentError, RiskAnalyzer, ScoreManager};
use crate::client::{CompletionClient, ConfigurationError};
use crate::model::{ActionPlan, Hazard, Observation, ScoredHazard};

/// Aggregate outcome of one pipeline run. Built incrementally as stages
/// complete, immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub observation_id: Uuid,
    pub success: bool,
    pub error: Option<String>,
    pub hazards: Vec<Hazard>,
    pub scored_hazards: Vec<ScoredHazard>,
    pub action_plans: Vec<ActionPlan>,
}

impl PipelineResult {
    fn succeeded(
        observation_id: Uuid,
        hazards: Vec<Hazard>,
        scored_hazards: Vec<ScoredHazard>,
        action_plans: Vec<ActionPlan>,
    ) -> Self {
        Self {
            observation_id,
            success: true,
            error: None,
            hazards,
            scored_hazards,
            action_plans,
        }
    }

    /// A failed run keeps only the output of stage-groups that completed
    /// before the failing one.
    fn failed(
        observation_id: Uuid,
        error: String,
        hazards: Vec<Hazard>,
        scored_hazards: Vec<ScoredHazard>,
    ) -> Self {
        Self {
            observation_id,
            success: false,
            error: Some(error),
            hazards,
            scored_hazards,
            action_plans: Vec::new(),
        }
    }
}

/// Three-stage observation pipeline with statically dispatched agents.
pub struct ObservationPipeline<R, S, P> {
    risk_analyzer: R,
    score_manager: S,
    action_planner: P,
}

impl ObservationPipeline<RiskAnalyzer, ScoreManager, ActionPlanner> {
    /// Standard pipeline with the three production agents sharing one
    /// LLM client.
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            risk_analyzer: RiskAnalyzer::new(client.clone()),
            score_manager: ScoreManager::new(client.clone()),
            action_planner: ActionPlanner::new(client),
        }
    }
}

impl<R, S, P> ObservationPipeline<R, S, P>
where
    R: Agent<Input = Observation, Output = Vec<Hazard>>,
    S: Agent<Input = Hazard, Output = ScoredHazard>,
    P: Agent<Input = ScoredHazard, Output = ActionPlan>,
{
    pub fn with_agents(risk_analyzer: R, score_manager: S, action_planner: P) -> Self {
        Self {
            risk_analyzer,
            score_manager,
            action_planner,
        }
    }

    /// Run one observation through all three stages.
    ///
    /// Stage errors become a failed [`PipelineResult`]; configuration
    /// errors from the LLM client propagate unchanged so the boundary can
    /// tell a bad analysis from a broken integration. No stage is retried.
    pub async fn run(&self, observation: &Observation) -> Result<PipelineResult, ConfigurationError> {
        info!(observation = %observation.id, site = %observation.site, "pipeline started");

        let hazards = match self.risk_analyzer.run(observation).await {
            Ok(hazards) => hazards,
            Err(error) => {
                return self.fail(observation.id, error, Vec::new(), Vec::new());
            }
        };
        info!(observation = %observation.id, hazards = hazards.len(), "risk analysis complete");

        // No detected hazard is a valid outcome, not an error.
        if hazards.is_empty() {
            info!(observation = %observation.id, "no hazards detected, pipeline done");
            return Ok(PipelineResult::succeeded(
                observation.id,
                hazards,
                Vec::new(),
                Vec::new(),
            ));
        }

        let mut scored_hazards = Vec::with_capacity(hazards.len());
        let mut failure = None;
        for hazard in &hazards {
            match self.score_manager.run(hazard).await {
                Ok(scored) => scored_hazards.push(scored),
                Err(error) => {
                    failure = Some(attach_item(error, "hazard", hazard.id));
                    break;
                }
            }
        }
        if let Some(error) = failure {
            return self.fail(observation.id, error, hazards, Vec::new());
        }
        info!(observation = %observation.id, scored = scored_hazards.len(), "scoring complete");

        let mut action_plans = Vec::with_capacity(scored_hazards.len());
        let mut failure = None;
        for scored in &scored_hazards {
            match self.action_planner.run(scored).await {
                Ok(plan) => action_plans.push(plan),
                Err(error) => {
                    failure = Some(attach_item(error, "scored hazard", scored.id));
                    break;
                }
            }
        }
        if let Some(error) = failure {
            return self.fail(observation.id, error, hazards, scored_hazards);
        }
        info!(observation = %observation.id, plans = action_plans.len(), "pipeline done");

        Ok(PipelineResult::succeeded(
            observation.id,
            hazards,
            scored_hazards,
            action_plans,
        ))
    }

    fn fail(
        &self,
        observation_id: Uuid,
        error: AgentError,
        hazards: Vec<Hazard>,
        scored_hazards: Vec<ScoredHazard>,
    ) -> Result<PipelineResult, ConfigurationError> {
        match error {
            AgentError::Configuration(inner) => {
                warn!(observation = %observation_id, error = %inner, "pipeline aborted: LLM misconfigured");
                Err(inner)
            }
            stage_error @ AgentError::Stage { .. } => {
                warn!(observation = %observation_id, error = %stage_error, "pipeline failed");
                Ok(PipelineResult::failed(
                    observation_id,
                    stage_error.to_string(),
                    hazards,
                    scored_hazards,
                ))
            }
        }
    }
}

/// Tag a stage error with the item that triggered it, so the reported
/// failure identifies both the stage and the input.
fn attach_item(error: AgentError, label: &str, id: Uuid) -> AgentError {
    match error {
        AgentError::Stage { agent, message } => AgentError::Stage {
            agent,
            message: format!("{message} ({label} {id})"),
        },
        configuration => configuration,
    }
}

#[cfg(test)]
mod tests;
