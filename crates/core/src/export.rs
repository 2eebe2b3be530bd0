//! Assessment export and import.
//!
//! JSON exports are wrapped in a versioned [`AssessmentDocument`] carrying a
//! SHA-256 digest of the answers, so an import can detect hand-edited files.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::domain::answer::Answer;
use crate::domain::assessment::Assessment;
use crate::framework::Framework;
use crate::qualification::percent_of;

pub const EXPORT_SCHEMA_VERSION: u32 = 1;

const DIGEST_PREFIX: &str = "sha256:";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("assessment could not be serialized: {0}")]
    Serialization(String),
    #[error("unsupported export schema version {found} (expected {expected})")]
    UnsupportedSchemaVersion { found: u32, expected: u32 },
    #[error("answers digest mismatch: document says {expected}, answers hash to {actual}")]
    DigestMismatch { expected: String, actual: String },
    #[error("unknown export format `{0}` (expected json|csv|summary)")]
    UnknownFormat(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Json,
    Csv,
    Summary,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Summary => "summary",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "summary" | "text" => Ok(Self::Summary),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentDocument {
    pub schema_version: u32,
    pub exported_at: DateTime<Utc>,
    pub answers_digest: String,
    pub assessment: Assessment,
}

impl AssessmentDocument {
    pub fn new(assessment: Assessment, exported_at: DateTime<Utc>) -> Result<Self, ExportError> {
        let answers_digest = answers_digest(&assessment.answers)?;
        Ok(Self { schema_version: EXPORT_SCHEMA_VERSION, exported_at, answers_digest, assessment })
    }
}

pub fn render(
    framework: &Framework,
    assessment: &Assessment,
    format: ExportFormat,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => to_json(assessment),
        ExportFormat::Csv => Ok(to_csv(framework, assessment)),
        ExportFormat::Summary => Ok(to_summary(framework, assessment)),
    }
}

pub fn to_json(assessment: &Assessment) -> Result<String, ExportError> {
    let document = AssessmentDocument::new(assessment.clone(), Utc::now())?;
    serde_json::to_string_pretty(&document)
        .map_err(|error| ExportError::Serialization(error.to_string()))
}

/// Parses an exported document, verifying its schema version and answers digest.
pub fn import_json(raw: &str) -> Result<Assessment, ExportError> {
    let document = serde_json::from_str::<AssessmentDocument>(raw)
        .map_err(|error| ExportError::Serialization(error.to_string()))?;

    if document.schema_version != EXPORT_SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchemaVersion {
            found: document.schema_version,
            expected: EXPORT_SCHEMA_VERSION,
        });
    }

    let actual = answers_digest(&document.assessment.answers)?;
    if actual != document.answers_digest {
        return Err(ExportError::DigestMismatch { expected: document.answers_digest, actual });
    }

    Ok(document.assessment)
}

pub fn answers_digest(answers: &[Answer]) -> Result<String, ExportError> {
    let payload =
        serde_json::to_vec(answers).map_err(|error| ExportError::Serialization(error.to_string()))?;
    Ok(format!("{DIGEST_PREFIX}{}", sha256_hex(&payload)))
}

/// One row per pillar in framework order, followed by a `total` row.
pub fn to_csv(framework: &Framework, assessment: &Assessment) -> String {
    let mut output = String::from("pillar,title,score,max_score,percent\n");

    for pillar in framework.pillars() {
        let score = assessment.pillar_score(&pillar.id);
        let max = pillar.max_score();
        push_csv_row(
            &mut output,
            &[
                pillar.id.as_str(),
                &pillar.title,
                &score.to_string(),
                &max.to_string(),
                &percent_of(score, max).to_string(),
            ],
        );
    }

    let max = framework.max_total_score();
    push_csv_row(
        &mut output,
        &[
            "total",
            "Total",
            &assessment.total_score.to_string(),
            &max.to_string(),
            &percent_of(assessment.total_score, max).to_string(),
        ],
    );
    output
}

fn push_csv_row(output: &mut String, fields: &[&str]) {
    let row: Vec<String> = fields.iter().map(|field| csv_field(field)).collect();
    output.push_str(&row.join(","));
    output.push('\n');
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn to_summary(framework: &Framework, assessment: &Assessment) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Opportunity {} (version {}, updated {})",
        assessment.opportunity_id,
        assessment.version,
        assessment.last_updated.to_rfc3339()
    );
    let _ = writeln!(
        output,
        "Total score: {}/{}",
        assessment.total_score,
        framework.max_total_score()
    );
    let _ = writeln!(output, "Confidence: {}/100", assessment.confidence_score);
    let _ = writeln!(output, "Completion: {}%", assessment.completion_percentage);
    let _ = writeln!(output, "Risk: {}", assessment.risk_level);

    let readiness: Vec<String> = assessment
        .stage_readiness
        .iter()
        .map(|(stage, ready)| format!("{stage}={}", if *ready { "ready" } else { "not ready" }))
        .collect();
    let _ = writeln!(output, "Stage readiness: {}", readiness.join(", "));

    let _ = writeln!(output, "\nPillars:");
    let width = framework.pillars().iter().map(|pillar| pillar.title.len()).max().unwrap_or(0);
    for pillar in framework.pillars() {
        let _ = writeln!(
            output,
            "  {:<width$}  {:>3}/{}",
            pillar.title,
            assessment.pillar_score(&pillar.id),
            pillar.max_score(),
        );
    }

    push_section(&mut output, "Strengths", &assessment.competitive_strengths);
    push_section(&mut output, "Concerns", &assessment.areas_of_concern);
    push_section(&mut output, "Coaching actions", &assessment.coaching_actions);
    output
}

fn push_section(output: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(output, "\n{heading}:");
    for item in items {
        let _ = writeln!(output, "  - {item}");
    }
}

fn sha256_hex(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    let mut output = String::with_capacity(digest.len() * 2);
    for byte in digest.as_slice() {
        let _ = write!(output, "{byte:02x}");
    }
    output
}
