use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::agents::{Agent, AgentError, AgentKind};
use crate::client::ConfigurationError;
use crate::model::{
    ActionPlan, Hazard, Observation, ObservationPotential, ObservationType, Priority, ScoredHazard,
};

use super::ObservationPipeline;

fn sample_observation() -> Observation {
    Observation {
        id: Uuid::new_v5(&Uuid::NAMESPACE_OID, b"observation/fixture"),
        observed_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
        site: "Site A".to_string(),
        potential: ObservationPotential::NearMiss,
        kind: ObservationType::UnsafeCondition,
        description: "Exposed rebar near walkway".to_string(),
        trade_category_id: None,
        trade_partner_id: None,
        photo_id: None,
    }
}

/// Risk analyzer stub emitting a fixed number of hazards.
struct StubAnalyzer {
    hazard_count: usize,
}

#[async_trait]
impl Agent for StubAnalyzer {
    type Input = Observation;
    type Output = Vec<Hazard>;

    fn kind(&self) -> AgentKind {
        AgentKind::RiskAnalyzer
    }

    async fn run(&self, input: &Self::Input) -> Result<Self::Output, AgentError> {
        Ok((0..self.hazard_count)
            .map(|index| {
                Hazard::new(
                    input,
                    index,
                    format!("hazard {index}"),
                    "exposed_rebar".to_string(),
                )
            })
            .collect())
    }
}

struct FailingAnalyzer {
    error: AgentError,
}

#[async_trait]
impl Agent for FailingAnalyzer {
    type Input = Observation;
    type Output = Vec<Hazard>;

    fn kind(&self) -> AgentKind {
        AgentKind::RiskAnalyzer
    }

    async fn run(&self, _input: &Self::Input) -> Result<Self::Output, AgentError> {
        Err(self.error.clone())
    }
}

/// Score manager stub that can fail on one hazard, selected by input order.
struct StubScorer {
    fail_on_index: Option<usize>,
    seen: std::sync::Mutex<usize>,
}

impl StubScorer {
    fn passing() -> Self {
        Self {
            fail_on_index: None,
            seen: std::sync::Mutex::new(0),
        }
    }

    fn failing_on(index: usize) -> Self {
        Self {
            fail_on_index: Some(index),
            seen: std::sync::Mutex::new(0),
        }
    }
}

#[async_trait]
impl Agent for StubScorer {
    type Input = Hazard;
    type Output = ScoredHazard;

    fn kind(&self) -> AgentKind {
        AgentKind::ScoreManager
    }

    async fn run(&self, input: &Self::Input) -> Result<Self::Output, AgentError> {
        let mut seen = self.seen.lock().unwrap();
        let index = *seen;
        *seen += 1;
        if self.fail_on_index == Some(index) {
            return Err(AgentError::stage(self.kind(), "Severity 9 is outside 1-5"));
        }
        Ok(ScoredHazard::new(input, 3, 2))
    }
}

struct StubPlanner;

#[async_trait]
impl Agent for StubPlanner {
    type Input = ScoredHazard;
    type Output = ActionPlan;

    fn kind(&self) -> AgentKind {
        AgentKind::ActionPlanner
    }

    async fn run(&self, input: &Self::Input) -> Result<Self::Output, AgentError> {
        Ok(ActionPlan::new(
            input,
            vec!["Cap the rebar".to_string()],
            "All rebar ends are capped".to_string(),
            None,
        ))
    }
}

struct FailingPlanner;

#[async_trait]
impl Agent for FailingPlanner {
    type Input = ScoredHazard;
    type Output = ActionPlan;

    fn kind(&self) -> AgentKind {
        AgentKind::ActionPlanner
    }

    async fn run(&self, _input: &Self::Input) -> Result<Self::Output, AgentError> {
        Err(AgentError::stage(self.kind(), "Plan is missing acceptance criteria"))
    }
}

#[tokio::test]
async fn scored_hazards_preserve_hazard_order() {
    let pipeline = ObservationPipeline::with_agents(
        StubAnalyzer { hazard_count: 3 },
        StubScorer::passing(),
        StubPlanner,
    );

    let result = pipeline.run(&sample_observation()).await.unwrap();

    assert!(result.success);
    assert_eq!(result.hazards.len(), 3);
    assert_eq!(result.scored_hazards.len(), 3);
    for (hazard, scored) in result.hazards.iter().zip(&result.scored_hazards) {
        assert_eq!(scored.hazard_id, hazard.id);
    }
}

#[tokio::test]
async fn successful_runs_are_referentially_closed() {
    let pipeline = ObservationPipeline::with_agents(
        StubAnalyzer { hazard_count: 2 },
        StubScorer::passing(),
        StubPlanner,
    );

    let result = pipeline.run(&sample_observation()).await.unwrap();

    for scored in &result.scored_hazards {
        assert!(result.hazards.iter().any(|h| h.id == scored.hazard_id));
    }
    for plan in &result.action_plans {
        assert!(
            result
                .scored_hazards
                .iter()
                .any(|s| s.id == plan.scored_hazard_id)
        );
    }
}

#[tokio::test]
async fn zero_hazards_short_circuits_as_success() {
    let pipeline = ObservationPipeline::with_agents(
        StubAnalyzer { hazard_count: 0 },
        StubScorer::failing_on(0),
        FailingPlanner,
    );

    let result = pipeline.run(&sample_observation()).await.unwrap();

    assert!(result.success);
    assert_eq!(result.error, None);
    assert!(result.hazards.is_empty());
    assert!(result.scored_hazards.is_empty());
    assert!(result.action_plans.is_empty());
}

#[tokio::test]
async fn scoring_failure_is_atomic_for_the_stage_group() {
    let pipeline = ObservationPipeline::with_agents(
        StubAnalyzer { hazard_count: 3 },
        StubScorer::failing_on(1),
        StubPlanner,
    );

    let result = pipeline.run(&sample_observation()).await.unwrap();

    assert!(!result.success);
    let error = result.error.as_deref().unwrap();
    assert!(error.contains("[score_manager]"));
    assert!(error.contains("hazard"));
    // All hazards are kept, but no partial scores and nothing downstream.
    assert_eq!(result.hazards.len(), 3);
    assert!(result.scored_hazards.is_empty());
    assert!(result.action_plans.is_empty());
}

#[tokio::test]
async fn planning_failure_keeps_completed_scoring_stage() {
    let pipeline = ObservationPipeline::with_agents(
        StubAnalyzer { hazard_count: 2 },
        StubScorer::passing(),
        FailingPlanner,
    );

    let result = pipeline.run(&sample_observation()).await.unwrap();

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("[action_planner]"));
    assert_eq!(result.hazards.len(), 2);
    assert_eq!(result.scored_hazards.len(), 2);
    assert!(result.action_plans.is_empty());
}

#[tokio::test]
async fn analyzer_failure_returns_empty_failed_result() {
    let pipeline = ObservationPipeline::with_agents(
        FailingAnalyzer {
            error: AgentError::stage(AgentKind::RiskAnalyzer, "Failed to parse hazards JSON"),
        },
        StubScorer::passing(),
        StubPlanner,
    );

    let result = pipeline.run(&sample_observation()).await.unwrap();

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("[risk_analyzer]"));
    assert!(result.hazards.is_empty());
    assert!(result.scored_hazards.is_empty());
    assert!(result.action_plans.is_empty());
}

#[tokio::test]
async fn configuration_errors_propagate_past_the_pipeline() {
    let inner = ConfigurationError("Invalid API key".to_string());
    let pipeline = ObservationPipeline::with_agents(
        FailingAnalyzer {
            error: AgentError::Configuration(inner.clone()),
        },
        StubScorer::passing(),
        StubPlanner,
    );

    let err = pipeline.run(&sample_observation()).await.unwrap_err();
    assert_eq!(err, inner);
}

#[tokio::test]
async fn identical_runs_produce_identical_results() {
    let observation = sample_observation();

    let first = ObservationPipeline::with_agents(
        StubAnalyzer { hazard_count: 2 },
        StubScorer::passing(),
        StubPlanner,
    )
    .run(&observation)
    .await
    .unwrap();

    let second = ObservationPipeline::with_agents(
        StubAnalyzer { hazard_count: 2 },
        StubScorer::passing(),
        StubPlanner,
    )
    .run(&observation)
    .await
    .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn single_hazard_scenario_flows_through_all_stages() {
    let pipeline = ObservationPipeline::with_agents(
        StubAnalyzer { hazard_count: 1 },
        StubScorer::passing(),
        StubPlanner,
    );
    let observation = sample_observation();

    let result = pipeline.run(&observation).await.unwrap();

    assert!(result.success);
    assert_eq!(result.observation_id, observation.id);
    assert_eq!(result.hazards.len(), 1);
    assert_eq!(result.scored_hazards.len(), 1);
    assert_eq!(result.action_plans.len(), 1);
    assert_eq!(result.scored_hazards[0].severity, 3);
    assert_eq!(result.scored_hazards[0].likelihood, 2);
    assert_eq!(result.scored_hazards[0].priority, Priority::Medium);
    assert!(!result.action_plans[0].acceptance_criteria.is_empty());
}

#[tokio::test]
async fn result_serializes_with_boundary_field_names() {
    let pipeline = ObservationPipeline::with_agents(
        StubAnalyzer { hazard_count: 1 },
        StubScorer::passing(),
        StubPlanner,
    );

    let result = pipeline.run(&sample_observation()).await.unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["success"], serde_json::Value::Bool(true));
    assert_eq!(json["error"], serde_json::Value::Null);
    assert!(json["hazards"].is_array());
    assert!(json["scored_hazards"].is_array());
    assert!(json["action_plans"].is_array());
}
