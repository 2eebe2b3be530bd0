pub mod assess;
pub mod config;
pub mod doctor;
pub mod insights;
pub mod pillars;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use meddpicc_core::config::{AppConfig, LoadOptions};
use meddpicc_core::domain::answer::{AnswerSubmission, ConfidenceLevel};
use meddpicc_core::domain::assessment::OpportunityId;
use meddpicc_core::errors::{ApplicationError, InterfaceError};
use meddpicc_core::qualification::AssessmentEngine;
use meddpicc_core::store::AnswerStore;
use serde::{Deserialize, Serialize};

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;
pub const EXIT_VALIDATION: u8 = 4;
pub const EXIT_EXPORT: u8 = 5;

const DEFAULT_OPPORTUNITY: &str = "cli";

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            hint: None,
            correlation_id: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    /// Successful command whose output is the rendered artifact itself.
    pub fn raw(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            hint: None,
            correlation_id: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Failure carrying the user-facing hint and correlation id of an interface error.
    pub fn interface_failure(
        command: &str,
        error_class: &str,
        error: InterfaceError,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: error.to_string(),
            hint: Some(error.user_message().to_string()),
            correlation_id: Some(error.correlation_id().to_string()),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Answers file accepted by `assess` and `insights`.
#[derive(Debug, Deserialize)]
pub struct AnswersFile {
    #[serde(default)]
    pub opportunity_id: Option<String>,
    #[serde(default)]
    pub answers: Vec<AnswerEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerEntry {
    pub pillar: String,
    pub question_id: String,
    pub value: String,
    #[serde(default = "default_confidence")]
    pub confidence: ConfidenceLevel,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_confidence() -> ConfidenceLevel {
    ConfidenceLevel::Medium
}

pub fn read_answers_file(path: &Path) -> anyhow::Result<AnswersFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read answers file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("could not parse answers file `{}`", path.display()))
}

/// Shared front half of `assess` and `insights`: the configured engine and a
/// validated answer store. Failures come back as ready-to-print results.
pub(crate) fn prepare_assessment(
    command: &str,
    config_path: Option<PathBuf>,
    answers_path: &Path,
    opportunity: Option<String>,
) -> Result<(AssessmentEngine, AnswerStore), CommandResult> {
    let config = load_config(command, config_path)?;
    let engine = config.build_engine().map_err(|error| {
        CommandResult::failure(command, "framework", error.to_string(), EXIT_CONFIG)
    })?;

    let file = read_answers_file(answers_path).map_err(|error| {
        CommandResult::failure(command, "answers_input", format!("{error:#}"), EXIT_INPUT)
    })?;
    let opportunity_id = opportunity
        .or(file.opportunity_id)
        .unwrap_or_else(|| DEFAULT_OPPORTUNITY.to_string());

    let mut store = AnswerStore::create(OpportunityId::new(opportunity_id.clone()));
    let now = Utc::now();
    for entry in file.answers {
        let mut submission =
            AnswerSubmission::new(entry.pillar, entry.question_id, entry.value, entry.confidence);
        if let Some(notes) = entry.notes {
            submission = submission.with_notes(notes);
        }
        store.upsert(engine.framework(), submission, now).map_err(|error| {
            let error = ApplicationError::from(error).into_interface(opportunity_id.as_str());
            CommandResult::interface_failure(command, "answer_validation", error, EXIT_VALIDATION)
        })?;
    }

    Ok((engine, store))
}

pub(crate) fn load_config(
    command: &str,
    config_path: Option<PathBuf>,
) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions { config_path, ..LoadOptions::default() }).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })
}
