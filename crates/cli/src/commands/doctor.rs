use std::path::PathBuf;

use meddpicc_core::config::{AppConfig, LoadOptions};
use meddpicc_core::domain::assessment::{OpportunityId, RiskLevel};
use meddpicc_core::export;
use meddpicc_core::qualification::AssessmentEngine;
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_CONFIG};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(config_path: Option<PathBuf>, json_output: bool) -> CommandResult {
    let report = build_report(config_path);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_CONFIG };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report(config_path: Option<PathBuf>) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions { config_path, ..LoadOptions::default() }) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match config.build_engine() {
                Ok(engine) => {
                    checks.push(DoctorCheck {
                        name: "framework_load",
                        status: CheckStatus::Pass,
                        details: describe_framework(&engine),
                    });
                    checks.push(check_export_round_trip(&engine));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "framework_load",
                        status: CheckStatus::Fail,
                        details: error.to_string(),
                    });
                    checks.push(skipped("export_round_trip", "framework did not load"));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("framework_load", "configuration did not load"));
            checks.push(skipped("export_round_trip", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn describe_framework(engine: &AssessmentEngine) -> String {
    let framework = engine.framework();
    format!(
        "{} pillars, {} questions, max score {}, {} stage gates, {} coaching prompts",
        framework.pillars().len(),
        framework.total_questions(),
        framework.max_total_score(),
        framework.stages().len(),
        framework.coaching_prompts().len()
    )
}

/// An empty assessment must classify as critical and survive a JSON round trip.
fn check_export_round_trip(engine: &AssessmentEngine) -> DoctorCheck {
    let empty = engine.empty(OpportunityId::new("doctor"));
    if empty.risk_level != RiskLevel::Critical {
        return DoctorCheck {
            name: "export_round_trip",
            status: CheckStatus::Fail,
            details: format!("empty assessment classified as `{}`", empty.risk_level.as_str()),
        };
    }

    let result = export::to_json(&empty).and_then(|raw| export::import_json(&raw));
    match result {
        Ok(restored) if restored == empty => DoctorCheck {
            name: "export_round_trip",
            status: CheckStatus::Pass,
            details: format!("schema version {} verified", export::EXPORT_SCHEMA_VERSION),
        },
        Ok(_) => DoctorCheck {
            name: "export_round_trip",
            status: CheckStatus::Fail,
            details: "imported assessment differs from export".to_string(),
        },
        Err(error) => {
            DoctorCheck {
                name: "export_round_trip",
                status: CheckStatus::Fail,
                details: error.to_string(),
            }
        }
    }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
