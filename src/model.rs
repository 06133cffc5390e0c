//! Domain records produced and consumed by the observation pipeline.
//!
//! Every record here is created once by its producing stage and never
//! mutated afterwards. Derived records carry the id of the record they
//! were produced from, so a single pipeline run is referentially closed:
//! each `ScoredHazard` points at a `Hazard` in the same run, each
//! `ActionPlan` at a `ScoredHazard`.

use std::fmt;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Worst plausible outcome category of a reported observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObservationPotential {
    NearMiss,
    FirstAid,
    MedicalTreatment,
    LostTime,
    Fatality,
}

impl fmt::Display for ObservationPotential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ObservationPotential::NearMiss => "NEAR_MISS",
            ObservationPotential::FirstAid => "FIRST_AID",
            ObservationPotential::MedicalTreatment => "MEDICAL_TREATMENT",
            ObservationPotential::LostTime => "LOST_TIME",
            ObservationPotential::Fatality => "FATALITY",
        };
        write!(f, "{label}")
    }
}

/// Reporting category of the observation itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObservationType {
    AreaForImprovement,
    PositiveObservation,
    UnsafeCondition,
    UnsafeAct,
    Environmental,
}

impl fmt::Display for ObservationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ObservationType::AreaForImprovement => "AREA_FOR_IMPROVEMENT",
            ObservationType::PositiveObservation => "POSITIVE_OBSERVATION",
            ObservationType::UnsafeCondition => "UNSAFE_CONDITION",
            ObservationType::UnsafeAct => "UNSAFE_ACT",
            ObservationType::Environmental => "ENVIRONMENTAL",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for ObservationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AREA_FOR_IMPROVEMENT" => Ok(ObservationType::AreaForImprovement),
            "POSITIVE_OBSERVATION" => Ok(ObservationType::PositiveObservation),
            "UNSAFE_CONDITION" => Ok(ObservationType::UnsafeCondition),
            "UNSAFE_ACT" => Ok(ObservationType::UnsafeAct),
            "ENVIRONMENTAL" => Ok(ObservationType::Environmental),
            other => Err(anyhow!("Unknown observation type '{other}'")),
        }
    }
}

/// A reported safety event as it enters the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: Uuid,
    pub observed_at: DateTime<Utc>,
    pub site: String,
    pub potential: ObservationPotential,
    #[serde(rename = "type")]
    pub kind: ObservationType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_partner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_id: Option<String>,
}

/// One hazard the risk analyzer identified inside an observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: Uuid,
    pub observation_id: Uuid,
    pub description: String,
    pub hazard_type: String,
}

impl Hazard {
    /// Hazard ids are derived from the source observation and the hazard's
    /// position in the analyzer output, so the same observation analyzed
    /// twice yields the same ids.
    pub fn new(observation: &Observation, index: usize, description: String, hazard_type: String) -> Self {
        let id = Uuid::new_v5(&observation.id, format!("hazard/{index}").as_bytes());
        Self {
            id,
            observation_id: observation.id,
            description,
            hazard_type,
        }
    }
}

/// Remediation urgency derived from the risk matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Matrix lookup over the severity x likelihood product (both 1..=5).
    pub fn from_score(score: u8) -> Self {
        match score {
            15.. => Priority::Critical,
            8..=14 => Priority::High,
            4..=7 => Priority::Medium,
            _ => Priority::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        };
        write!(f, "{label}")
    }
}

/// A hazard augmented with its risk-matrix score and derived priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredHazard {
    pub id: Uuid,
    pub hazard_id: Uuid,
    pub description: String,
    pub hazard_type: String,
    pub severity: u8,
    pub likelihood: u8,
    pub risk_score: u8,
    pub priority: Priority,
}

impl ScoredHazard {
    pub fn new(hazard: &Hazard, severity: u8, likelihood: u8) -> Self {
        let risk_score = severity * likelihood;
        Self {
            id: Uuid::new_v5(&hazard.id, b"score"),
            hazard_id: hazard.id,
            description: hazard.description.clone(),
            hazard_type: hazard.hazard_type.clone(),
            severity,
            likelihood,
            risk_score,
            priority: Priority::from_score(risk_score),
        }
    }
}

/// A remediation plan for one scored hazard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub id: Uuid,
    pub scored_hazard_id: Uuid,
    pub recommended_actions: Vec<String>,
    pub acceptance_criteria: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regulatory_citation: Option<String>,
}

impl ActionPlan {
    pub fn new(
        scored: &ScoredHazard,
        recommended_actions: Vec<String>,
        acceptance_criteria: String,
        regulatory_citation: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v5(&scored.id, b"plan"),
            scored_hazard_id: scored.id,
            recommended_actions,
            acceptance_criteria,
            regulatory_citation,
        }
    }
}
