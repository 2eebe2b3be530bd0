use std::path::{Path, PathBuf};

use meddpicc_core::domain::insight::Insight;
use serde::Serialize;

use crate::commands::{prepare_assessment, CommandResult, EXIT_EXPORT};

#[derive(Debug, Serialize)]
struct InsightReport<'a> {
    opportunity_id: &'a str,
    total_score: u32,
    risk_level: &'a str,
    insights: Vec<Insight>,
    coaching: Vec<CoachingLine>,
}

#[derive(Debug, Serialize)]
struct CoachingLine {
    pillar: String,
    prompt: String,
    action_items: Vec<String>,
}

pub fn run(
    config_path: Option<PathBuf>,
    answers_path: &Path,
    limit: Option<usize>,
    opportunity: Option<String>,
) -> CommandResult {
    let prepared = prepare_assessment("insights", config_path, answers_path, opportunity);
    let (engine, store) = match prepared {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let assessment = engine.recompute(&store, None);
    let coaching = engine
        .coaching_prompts(&assessment.answers)
        .into_iter()
        .map(|prompt| CoachingLine {
            pillar: prompt.pillar.to_string(),
            prompt: prompt.prompt_text,
            action_items: prompt.action_items,
        })
        .collect();
    let report = InsightReport {
        opportunity_id: assessment.opportunity_id.as_str(),
        total_score: assessment.total_score,
        risk_level: assessment.risk_level.as_str(),
        insights: engine.ranked_insights(&assessment, limit),
        coaching,
    };

    match serde_json::to_string_pretty(&report) {
        Ok(rendered) => CommandResult::raw(rendered),
        Err(error) => {
            CommandResult::failure("insights", "serialization", error.to_string(), EXIT_EXPORT)
        }
    }
}
