use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::client::{CompletionClient, ConfigurationError, LlmError};
use crate::model::{
    Hazard, Observation, ObservationPotential, ObservationType, Priority, ScoredHazard,
};

use super::{ActionPlanner, Agent, AgentError, AgentKind, RiskAnalyzer, ScoreManager};

/// Client that always returns the same canned completion.
pub(crate) struct StubClient {
    response: String,
}

impl StubClient {
    pub(crate) fn new(response: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            response: response.into(),
        })
    }
}

#[async_trait]
impl CompletionClient for StubClient {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Ok(self.response.clone())
    }
}

/// Client that always fails with the given error.
pub(crate) struct FailingClient {
    error: LlmError,
}

impl FailingClient {
    pub(crate) fn new(error: LlmError) -> Arc<Self> {
        Arc::new(Self { error })
    }
}

#[async_trait]
impl CompletionClient for FailingClient {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(self.error.clone())
    }
}

pub(crate) fn sample_observation() -> Observation {
    Observation {
        id: Uuid::new_v4(),
        observed_at: Utc::now(),
        site: "Site A".to_string(),
        potential: ObservationPotential::NearMiss,
        kind: ObservationType::UnsafeCondition,
        description: "Exposed rebar near walkway".to_string(),
        trade_category_id: None,
        trade_partner_id: None,
        photo_id: None,
    }
}

fn sample_hazard(observation: &Observation) -> Hazard {
    Hazard::new(
        observation,
        0,
        "Exposed rebar at walking height".to_string(),
        "impalement".to_string(),
    )
}

#[tokio::test]
async fn risk_analyzer_parses_hazards_and_links_observation() {
    let client = StubClient::new(
        r#"{"hazards": [
            {"description": "Exposed rebar at walking height", "hazard_type": "impalement"},
            {"description": "Unmarked walkway next to rebar", "hazard_type": "trip"}
        ]}"#,
    );
    let analyzer = RiskAnalyzer::new(client);
    let observation = sample_observation();

    let hazards = analyzer.run(&observation).await.unwrap();

    assert_eq!(hazards.len(), 2);
    assert!(hazards.iter().all(|h| h.observation_id == observation.id));
    assert_eq!(hazards[0].hazard_type, "impalement");
    assert_eq!(hazards[1].hazard_type, "trip");
}

#[tokio::test]
async fn risk_analyzer_output_is_deterministic() {
    let client = StubClient::new(
        r#"{"hazards": [{"description": "Exposed rebar", "hazard_type": "impalement"}]}"#,
    );
    let analyzer = RiskAnalyzer::new(client);
    let observation = sample_observation();

    let first = analyzer.run(&observation).await.unwrap();
    let second = analyzer.run(&observation).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn risk_analyzer_accepts_fenced_completion() {
    let client = StubClient::new("```json\n{\"hazards\": []}\n```");
    let analyzer = RiskAnalyzer::new(client);

    let hazards = analyzer.run(&sample_observation()).await.unwrap();
    assert!(hazards.is_empty());
}

#[tokio::test]
async fn risk_analyzer_reports_malformed_content_as_stage_error() {
    let client = StubClient::new("I could not find any hazards, sorry!");
    let analyzer = RiskAnalyzer::new(client);

    let err = analyzer.run(&sample_observation()).await.unwrap_err();
    match err {
        AgentError::Stage { agent, message } => {
            assert_eq!(agent, AgentKind::RiskAnalyzer);
            assert!(message.contains("JSON object"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn configuration_errors_pass_through_agents_unchanged() {
    let inner = ConfigurationError("API key is not set".to_string());
    let client = FailingClient::new(LlmError::Configuration(inner.clone()));
    let analyzer = RiskAnalyzer::new(client);

    let err = analyzer.run(&sample_observation()).await.unwrap_err();
    match err {
        AgentError::Configuration(error) => assert_eq!(error, inner),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn call_errors_become_stage_errors_with_agent_identity() {
    let client = FailingClient::new(LlmError::Call("Rate limit exceeded".to_string()));
    let analyzer = RiskAnalyzer::new(client);

    let err = analyzer.run(&sample_observation()).await.unwrap_err();
    assert_eq!(err.to_string(), "[risk_analyzer] Rate limit exceeded");
}

#[tokio::test]
async fn score_manager_scores_and_derives_priority() {
    let client = StubClient::new(r#"{"severity": 3, "likelihood": 2}"#);
    let manager = ScoreManager::new(client);
    let observation = sample_observation();
    let hazard = sample_hazard(&observation);

    let scored = manager.run(&hazard).await.unwrap();

    assert_eq!(scored.hazard_id, hazard.id);
    assert_eq!(scored.severity, 3);
    assert_eq!(scored.likelihood, 2);
    assert_eq!(scored.risk_score, 6);
    assert_eq!(scored.priority, Priority::Medium);
}

#[tokio::test]
async fn score_manager_rejects_out_of_range_values() {
    let client = StubClient::new(r#"{"severity": 9, "likelihood": 2}"#);
    let manager = ScoreManager::new(client);
    let observation = sample_observation();

    let err = manager.run(&sample_hazard(&observation)).await.unwrap_err();
    match err {
        AgentError::Stage { agent, message } => {
            assert_eq!(agent, AgentKind::ScoreManager);
            assert!(message.contains("outside 1-5"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn action_planner_builds_plan_with_citation() {
    let client = StubClient::new(
        r#"{
            "recommended_actions": ["Cap all exposed rebar with OSHA-rated caps", "Rope off the walkway until capped"],
            "acceptance_criteria": "All rebar ends within 2m of the walkway carry protective caps",
            "regulatory_citation": "29 CFR 1926.701(b)"
        }"#,
    );
    let planner = ActionPlanner::new(client);
    let observation = sample_observation();
    let scored = ScoredHazard::new(&sample_hazard(&observation), 3, 2);

    let plan = planner.run(&scored).await.unwrap();

    assert_eq!(plan.scored_hazard_id, scored.id);
    assert_eq!(plan.recommended_actions.len(), 2);
    assert!(!plan.acceptance_criteria.is_empty());
    assert_eq!(plan.regulatory_citation.as_deref(), Some("29 CFR 1926.701(b)"));
}

#[tokio::test]
async fn action_planner_requires_acceptance_criteria() {
    let client = StubClient::new(
        r#"{"recommended_actions": ["Cap the rebar"], "acceptance_criteria": "", "regulatory_citation": null}"#,
    );
    let planner = ActionPlanner::new(client);
    let observation = sample_observation();
    let scored = ScoredHazard::new(&sample_hazard(&observation), 3, 2);

    let err = planner.run(&scored).await.unwrap_err();
    match err {
        AgentError::Stage { agent, message } => {
            assert_eq!(agent, AgentKind::ActionPlanner);
            assert!(message.contains("acceptance criteria"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn action_planner_requires_at_least_one_action() {
    let client = StubClient::new(
        r#"{"recommended_actions": [], "acceptance_criteria": "Rebar is capped", "regulatory_citation": null}"#,
    );
    let planner = ActionPlanner::new(client);
    let observation = sample_observation();
    let scored = ScoredHazard::new(&sample_hazard(&observation), 3, 2);

    let err = planner.run(&scored).await.unwrap_err();
    assert!(err.to_string().contains("no recommended actions"));
}

#[test]
fn agent_kind_round_trips_through_strings() {
    for kind in [
        AgentKind::RiskAnalyzer,
        AgentKind::ScoreManager,
        AgentKind::ActionPlanner,
    ] {
        let parsed: AgentKind = kind.to_string().parse().unwrap();
        assert_eq!(parsed, kind);
    }
    assert!("auditor".parse::<AgentKind>().is_err());
}
