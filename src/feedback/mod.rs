//! JSON-file-backed store for agent feedback.
//!
//! Feedback rates one agent's output against the input that produced it.
//! The core pipeline never reads these records; this store exists so the
//! boundary can capture ratings alongside serialized input/output
//! snapshots.

mod types;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs::home_dir;

use crate::agents::AgentKind;

pub use types::{ErrorCategory, Feedback, FeedbackCreate, Rating};

#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    pub agent_type: Option<AgentKind>,
    pub rating: Option<Rating>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct FeedbackStore {
    path: PathBuf,
}

impl FeedbackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open_default() -> Result<Self> {
        let mut path = home_dir().context("Could not determine home directory")?;
        path.push(".sitewatch/feedback.json");
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. The whole file is rewritten; the store is a
    /// single JSON array, not a log.
    pub fn append(&self, create: FeedbackCreate) -> Result<Feedback> {
        let mut records = self.load_all()?;
        let feedback = Feedback::new(create);
        records.push(feedback.clone());
        self.save_all(&records)?;
        Ok(feedback)
    }

    /// List records newest first, optionally filtered by agent and rating.
    pub fn list(&self, filter: &FeedbackFilter) -> Result<Vec<Feedback>> {
        let mut records = self.load_all()?;

        if let Some(agent_type) = filter.agent_type {
            records.retain(|record| record.agent_type == agent_type);
        }
        if let Some(rating) = filter.rating {
            records.retain(|record| record.rating == rating);
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    fn load_all(&self) -> Result<Vec<Feedback>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed reading feedback at {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed parsing feedback JSON at {}", self.path.display()))
    }

    fn save_all(&self, records: &[Feedback]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Unable to create feedback directory {}", parent.display())
            })?;
        }
        let json = serde_json::to_string_pretty(records)
            .context("Failed to serialize feedback to JSON")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write feedback to {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_create(agent_type: AgentKind, rating: Rating) -> FeedbackCreate {
        FeedbackCreate {
            agent_type,
            rating,
            comment: Some("missed the trip hazard".to_string()),
            error_categories: Some(vec![ErrorCategory::MissedHazard]),
            original_input: r#"{"description":"Exposed rebar"}"#.to_string(),
            agent_response: r#"{"hazards":[]}"#.to_string(),
            session_id: None,
            pipeline_run_id: None,
        }
    }

    #[test]
    fn append_then_list_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = FeedbackStore::new(dir.path().join("feedback.json"));

        let saved = store
            .append(sample_create(AgentKind::RiskAnalyzer, Rating::Bad))
            .unwrap();

        let listed = store.list(&FeedbackFilter::default()).unwrap();
        assert_eq!(listed, vec![saved]);
    }

    #[test]
    fn list_filters_by_agent_and_rating() {
        let dir = TempDir::new().unwrap();
        let store = FeedbackStore::new(dir.path().join("feedback.json"));

        store
            .append(sample_create(AgentKind::RiskAnalyzer, Rating::Bad))
            .unwrap();
        store
            .append(sample_create(AgentKind::ScoreManager, Rating::Good))
            .unwrap();
        store
            .append(sample_create(AgentKind::ScoreManager, Rating::Bad))
            .unwrap();

        let filter = FeedbackFilter {
            agent_type: Some(AgentKind::ScoreManager),
            rating: Some(Rating::Bad),
            limit: None,
        };
        let listed = store.list(&filter).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].agent_type, AgentKind::ScoreManager);
        assert_eq!(listed[0].rating, Rating::Bad);
    }

    #[test]
    fn list_applies_limit_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = FeedbackStore::new(dir.path().join("feedback.json"));

        let _first = store
            .append(sample_create(AgentKind::RiskAnalyzer, Rating::Bad))
            .unwrap();
        // Timestamps order the listing; make sure the second append is later.
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = store
            .append(sample_create(AgentKind::RiskAnalyzer, Rating::Good))
            .unwrap();

        let filter = FeedbackFilter {
            limit: Some(1),
            ..FeedbackFilter::default()
        };
        let listed = store.list(&filter).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, second.id);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FeedbackStore::new(dir.path().join("feedback.json"));

        assert!(store.list(&FeedbackFilter::default()).unwrap().is_empty());
    }
}
