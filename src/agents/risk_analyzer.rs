use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::client::CompletionClient;
use crate::model::{Hazard, Observation};

use super::parsing::extract_json_object;
use super::{Agent, AgentError, AgentKind, complete_prompt};

const SYSTEM_PROMPT: &str = r#"You are a construction-safety analyst. Identify every distinct hazard present in the reported observation below.

OUTPUT FORMAT (STRICT JSON ONLY)
- Return exactly one JSON object, no prose, no markdown, no comments.
- Schema:

{
  "hazards": [
    {"description": "<specific hazard, one sentence>", "hazard_type": "<short snake_case category, e.g. fall_from_height, struck_by, impalement, electrical>"}
  ]
}

RULES
- One entry per distinct hazard; do not merge unrelated hazards.
- If the observation describes no hazard (e.g. a positive observation), return {"hazards": []}.
- Base every hazard on the observation text; never invent site conditions.
"#;

/// Detects hazards in a reported observation. First stage of the pipeline.
pub struct RiskAnalyzer {
    client: Arc<dyn CompletionClient>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HazardsPayload {
    hazards: Vec<HazardPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HazardPayload {
    description: String,
    hazard_type: String,
}

impl RiskAnalyzer {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    fn build_prompt(&self, observation: &Observation) -> String {
        format!(
            "{SYSTEM_PROMPT}\nOBSERVATION\n- Site: {}\n- Potential: {}\n- Type: {}\n- Description: {}\n",
            observation.site, observation.potential, observation.kind, observation.description
        )
    }

    fn parse_response(
        &self,
        observation: &Observation,
        raw: &str,
    ) -> Result<Vec<Hazard>, AgentError> {
        let json = extract_json_object(raw).ok_or_else(|| {
            AgentError::stage(self.kind(), "Response did not contain a JSON object")
        })?;

        let payload: HazardsPayload = serde_json::from_str(&json).map_err(|error| {
            AgentError::stage(self.kind(), format!("Failed to parse hazards JSON: {error}"))
        })?;

        let mut hazards = Vec::with_capacity(payload.hazards.len());
        for (index, item) in payload.hazards.into_iter().enumerate() {
            if item.description.trim().is_empty() {
                return Err(AgentError::stage(
                    self.kind(),
                    format!("Hazard {index} has an empty description"),
                ));
            }
            hazards.push(Hazard::new(
                observation,
                index,
                item.description,
                item.hazard_type,
            ));
        }
        Ok(hazards)
    }
}

#[async_trait]
impl Agent for RiskAnalyzer {
    type Input = Observation;
    type Output = Vec<Hazard>;

    fn kind(&self) -> AgentKind {
        AgentKind::RiskAnalyzer
    }

    async fn run(&self, input: &Self::Input) -> Result<Self::Output, AgentError> {
        let prompt = self.build_prompt(input);
        let raw = complete_prompt(self.client.as_ref(), self.kind(), &prompt).await?;
        let hazards = self.parse_response(input, raw.trim())?;
        debug!(observation = %input.id, count = hazards.len(), "hazards detected");
        Ok(hazards)
    }
}
