use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use uuid::Uuid;

use crate::client::HttpLlmClient;
use crate::config::Config;
use crate::model::{Observation, ObservationPotential, ObservationType};
use crate::pipeline::{ObservationPipeline, PipelineResult};

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Site where the observation was made.
    #[arg(long)]
    pub site: String,

    /// Potential severity (NEAR_MISS, FIRST_AID, MEDICAL_TREATMENT,
    /// LOST_TIME, FATALITY; legacy reporting aliases are accepted).
    #[arg(long)]
    pub potential: String,

    /// Observation type (AREA_FOR_IMPROVEMENT, POSITIVE_OBSERVATION,
    /// UNSAFE_CONDITION, UNSAFE_ACT, ENVIRONMENTAL).
    #[arg(long = "type")]
    pub kind: String,

    /// Free-text description of what was observed.
    #[arg(long)]
    pub description: String,

    /// When the observation was made (RFC 3339; defaults to now).
    #[arg(long)]
    pub observed_at: Option<DateTime<Utc>>,

    #[arg(long)]
    pub trade_category_id: Option<String>,

    #[arg(long)]
    pub trade_partner_id: Option<String>,

    #[arg(long)]
    pub photo_id: Option<String>,

    /// Print the raw pipeline result as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

/// Collapse the external reporting vocabulary onto the internal severity
/// enum. Several legacy categories map onto one internal value; this
/// mapping is boundary policy, and the core stores whatever it is handed.
pub fn map_potential(value: &str) -> Result<ObservationPotential> {
    match value {
        "NEAR_MISS" | "SAFE_PRACTICE" | "AT_RISK_BEHAVIOR" | "OTHER" => {
            Ok(ObservationPotential::NearMiss)
        }
        "FIRST_AID" | "HAZARD" => Ok(ObservationPotential::FirstAid),
        "MEDICAL_TREATMENT" => Ok(ObservationPotential::MedicalTreatment),
        "LOST_TIME" => Ok(ObservationPotential::LostTime),
        "FATALITY" => Ok(ObservationPotential::Fatality),
        other => Err(anyhow!("Invalid potential value: {other}")),
    }
}

pub async fn run(args: AnalyzeArgs) -> Result<()> {
    if args.description.trim().is_empty() {
        bail!("Description must not be empty");
    }
    if args.site.trim().is_empty() {
        bail!("Site must not be empty");
    }

    let potential = map_potential(&args.potential)?;
    let kind: ObservationType = args
        .kind
        .parse()
        .with_context(|| format!("Invalid type value: {}", args.kind))?;

    let observation = Observation {
        id: Uuid::new_v4(),
        observed_at: args.observed_at.unwrap_or_else(Utc::now),
        site: args.site,
        potential,
        kind,
        description: args.description,
        trade_category_id: args.trade_category_id,
        trade_partner_id: args.trade_partner_id,
        photo_id: args.photo_id,
    };

    let config = Config::load()?;
    let client = HttpLlmClient::new(&config.llm, &config.models)
        .map_err(|error| anyhow!("LLM service is misconfigured: {error}"))?;
    let pipeline = ObservationPipeline::new(Arc::new(client));

    let result = pipeline
        .run(&observation)
        .await
        .map_err(|error| anyhow!("LLM service is misconfigured: {error}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        if !result.success {
            bail!("Analysis failed");
        }
        return Ok(());
    }

    render(&result);
    if let Some(error) = &result.error {
        bail!("Analysis failed: {error}");
    }
    Ok(())
}

fn render(result: &PipelineResult) {
    println!();
    println!("{} {}", "Observation".bold(), result.observation_id);

    if result.hazards.is_empty() && result.success {
        println!("{}", "No hazards detected.".green());
        return;
    }

    println!("{}", format!("Hazards ({})", result.hazards.len()).bold());
    for hazard in &result.hazards {
        println!("  - [{}] {}", hazard.hazard_type.cyan(), hazard.description);
    }

    if !result.scored_hazards.is_empty() {
        println!("{}", format!("Risk scores ({})", result.scored_hazards.len()).bold());
        for scored in &result.scored_hazards {
            let priority = match scored.priority {
                crate::model::Priority::Low => scored.priority.to_string().green(),
                crate::model::Priority::Medium => scored.priority.to_string().yellow(),
                _ => scored.priority.to_string().red(),
            };
            println!(
                "  - {} severity {} x likelihood {} = {} ({priority})",
                scored.description,
                scored.severity,
                scored.likelihood,
                scored.risk_score
            );
        }
    }

    if !result.action_plans.is_empty() {
        println!("{}", format!("Action plans ({})", result.action_plans.len()).bold());
        for plan in &result.action_plans {
            for action in &plan.recommended_actions {
                println!("  - {action}");
            }
            println!("    {} {}", "done when:".dimmed(), plan.acceptance_criteria);
            if let Some(citation) = &plan.regulatory_citation {
                println!("    {} {}", "cites:".dimmed(), citation);
            }
        }
    }

    if let Some(error) = &result.error {
        println!("{} {}", "Pipeline failed:".red().bold(), error);
    }
}
