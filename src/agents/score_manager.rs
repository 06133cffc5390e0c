use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::client::CompletionClient;
use crate::model::{Hazard, ScoredHazard};

use super::parsing::extract_json_object;
use super::{Agent, AgentError, AgentKind, complete_prompt};

const SYSTEM_PROMPT: &str = r#"You are a safety risk assessor. Rate the hazard below on a standard 5x5 risk matrix.

OUTPUT FORMAT (STRICT JSON ONLY)
- Return exactly one JSON object, no prose, no markdown, no comments.
- Schema:

{
  "severity": <integer 1-5, 1 = negligible injury, 5 = fatality>,
  "likelihood": <integer 1-5, 1 = rare, 5 = almost certain>
}

RULES
- Judge severity by the worst credible outcome of this specific hazard.
- Judge likelihood for an active construction site with routine controls.
- Both values MUST be integers between 1 and 5 inclusive.
"#;

/// Scores one hazard on the risk matrix. Priority is derived from the
/// score in code, not trusted from the model.
pub struct ScoreManager {
    client: Arc<dyn CompletionClient>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScorePayload {
    severity: u8,
    likelihood: u8,
}

impl ScoreManager {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    fn build_prompt(&self, hazard: &Hazard) -> String {
        format!(
            "{SYSTEM_PROMPT}\nHAZARD\n- Type: {}\n- Description: {}\n",
            hazard.hazard_type, hazard.description
        )
    }

    fn parse_response(&self, hazard: &Hazard, raw: &str) -> Result<ScoredHazard, AgentError> {
        let json = extract_json_object(raw).ok_or_else(|| {
            AgentError::stage(self.kind(), "Response did not contain a JSON object")
        })?;

        let payload: ScorePayload = serde_json::from_str(&json).map_err(|error| {
            AgentError::stage(self.kind(), format!("Failed to parse score JSON: {error}"))
        })?;

        if !(1..=5).contains(&payload.severity) {
            return Err(AgentError::stage(
                self.kind(),
                format!("Severity {} is outside 1-5", payload.severity),
            ));
        }
        if !(1..=5).contains(&payload.likelihood) {
            return Err(AgentError::stage(
                self.kind(),
                format!("Likelihood {} is outside 1-5", payload.likelihood),
            ));
        }

        Ok(ScoredHazard::new(hazard, payload.severity, payload.likelihood))
    }
}

#[async_trait]
impl Agent for ScoreManager {
    type Input = Hazard;
    type Output = ScoredHazard;

    fn kind(&self) -> AgentKind {
        AgentKind::ScoreManager
    }

    async fn run(&self, input: &Self::Input) -> Result<Self::Output, AgentError> {
        let prompt = self.build_prompt(input);
        let raw = complete_prompt(self.client.as_ref(), self.kind(), &prompt).await?;
        let scored = self.parse_response(input, raw.trim())?;
        debug!(
            hazard = %input.id,
            score = scored.risk_score,
            priority = %scored.priority,
            "hazard scored"
        );
        Ok(scored)
    }
}
