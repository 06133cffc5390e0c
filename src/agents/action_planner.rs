use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::client::CompletionClient;
use crate::model::{ActionPlan, ScoredHazard};

use super::parsing::extract_json_object;
use super::{Agent, AgentError, AgentKind, complete_prompt};

const SYSTEM_PROMPT: &str = r#"You are a safety remediation planner. Produce a corrective action plan for the scored hazard below.

OUTPUT FORMAT (STRICT JSON ONLY)
- Return exactly one JSON object, no prose, no markdown, no comments.
- Schema:

{
  "recommended_actions": ["<concrete action, imperative voice>", ...],
  "acceptance_criteria": "<how to verify the hazard is controlled>",
  "regulatory_citation": "<applicable OSHA standard, e.g. 29 CFR 1926.701(b), or null>"
}

RULES
- At least one recommended action; order them by the hierarchy of controls (eliminate, substitute, engineer, administer, PPE).
- Acceptance criteria must be observable and specific, not "hazard resolved".
- Cite a regulation only when one clearly applies; otherwise use null.
"#;

/// Plans remediation for one scored hazard. Final stage of the pipeline.
pub struct ActionPlanner {
    client: Arc<dyn CompletionClient>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlanPayload {
    recommended_actions: Vec<String>,
    acceptance_criteria: String,
    #[serde(default)]
    regulatory_citation: Option<String>,
}

impl ActionPlanner {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    fn build_prompt(&self, scored: &ScoredHazard) -> String {
        format!(
            "{SYSTEM_PROMPT}\nSCORED HAZARD\n- Type: {}\n- Description: {}\n- Severity: {}/5\n- Likelihood: {}/5\n- Risk score: {}\n- Priority: {}\n",
            scored.hazard_type,
            scored.description,
            scored.severity,
            scored.likelihood,
            scored.risk_score,
            scored.priority
        )
    }

    fn parse_response(&self, scored: &ScoredHazard, raw: &str) -> Result<ActionPlan, AgentError> {
        let json = extract_json_object(raw).ok_or_else(|| {
            AgentError::stage(self.kind(), "Response did not contain a JSON object")
        })?;

        let payload: PlanPayload = serde_json::from_str(&json).map_err(|error| {
            AgentError::stage(self.kind(), format!("Failed to parse plan JSON: {error}"))
        })?;

        if payload.recommended_actions.iter().all(|a| a.trim().is_empty()) {
            return Err(AgentError::stage(
                self.kind(),
                "Plan contains no recommended actions",
            ));
        }
        if payload.acceptance_criteria.trim().is_empty() {
            return Err(AgentError::stage(
                self.kind(),
                "Plan is missing acceptance criteria",
            ));
        }

        let citation = payload
            .regulatory_citation
            .filter(|citation| !citation.trim().is_empty());

        Ok(ActionPlan::new(
            scored,
            payload.recommended_actions,
            payload.acceptance_criteria,
            citation,
        ))
    }
}

#[async_trait]
impl Agent for ActionPlanner {
    type Input = ScoredHazard;
    type Output = ActionPlan;

    fn kind(&self) -> AgentKind {
        AgentKind::ActionPlanner
    }

    async fn run(&self, input: &Self::Input) -> Result<Self::Output, AgentError> {
        let prompt = self.build_prompt(input);
        let raw = complete_prompt(self.client.as_ref(), self.kind(), &prompt).await?;
        let plan = self.parse_response(input, raw.trim())?;
        debug!(
            scored_hazard = %input.id,
            actions = plan.recommended_actions.len(),
            "action plan produced"
        );
        Ok(plan)
    }
}
