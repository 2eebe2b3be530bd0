use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use meddpicc_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run(config_path: Option<PathBuf>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions {
        config_path: config_path.clone(),
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            )
        }
    };

    let config_file_path = resolve_config_path(config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(format!("- {} = {} (source: {source})", field.key, field.value));
    }

    CommandResult::raw(lines.join("\n"))
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let scoring = &config.scoring;
    vec![
        Field {
            key: "framework.path",
            value: config
                .framework
                .path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<built-in>".to_string()),
            env_keys: &["MEDDPICC_FRAMEWORK_PATH"],
        },
        Field {
            key: "framework.format",
            value: format!("{:?}", config.framework.format),
            env_keys: &["MEDDPICC_FRAMEWORK_FORMAT"],
        },
        Field {
            key: "scoring.completion_threshold_pct",
            value: scoring.completion_threshold_pct.to_string(),
            env_keys: &["MEDDPICC_SCORING_COMPLETION_THRESHOLD_PCT"],
        },
        Field {
            key: "scoring.insight_limit",
            value: scoring.insight_limit.to_string(),
            env_keys: &["MEDDPICC_SCORING_INSIGHT_LIMIT"],
        },
        Field {
            key: "scoring.lock_completed",
            value: scoring.lock_completed.to_string(),
            env_keys: &["MEDDPICC_SCORING_LOCK_COMPLETED"],
        },
        Field {
            key: "scoring.risk.critical_below",
            value: scoring.risk.critical_below.to_string(),
            env_keys: &["MEDDPICC_RISK_CRITICAL_BELOW"],
        },
        Field {
            key: "scoring.risk.high_below",
            value: scoring.risk.high_below.to_string(),
            env_keys: &["MEDDPICC_RISK_HIGH_BELOW"],
        },
        Field {
            key: "scoring.risk.critical_confidence_below",
            value: scoring.risk.critical_confidence_below.to_string(),
            env_keys: &["MEDDPICC_RISK_CRITICAL_CONFIDENCE_BELOW"],
        },
        Field {
            key: "scoring.risk.elevated_confidence_below",
            value: scoring.risk.elevated_confidence_below.to_string(),
            env_keys: &["MEDDPICC_RISK_ELEVATED_CONFIDENCE_BELOW"],
        },
        Field {
            key: "scoring.confidence.low",
            value: scoring.confidence.low.to_string(),
            env_keys: &["MEDDPICC_CONFIDENCE_LOW"],
        },
        Field {
            key: "scoring.confidence.medium",
            value: scoring.confidence.medium.to_string(),
            env_keys: &["MEDDPICC_CONFIDENCE_MEDIUM"],
        },
        Field {
            key: "scoring.confidence.high",
            value: scoring.confidence.high.to_string(),
            env_keys: &["MEDDPICC_CONFIDENCE_HIGH"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["MEDDPICC_LOGGING_LEVEL", "MEDDPICC_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["MEDDPICC_LOGGING_FORMAT", "MEDDPICC_LOG_FORMAT"],
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::contains_path;

    #[test]
    fn nested_keys_are_found_in_config_document() {
        let doc: Value = "[scoring.risk]\ncritical_below = 150\n".parse().expect("toml");

        assert!(contains_path(&doc, "scoring.risk.critical_below"));
        assert!(!contains_path(&doc, "scoring.risk.high_below"));
        assert!(!contains_path(&doc, "logging.level"));
    }
}
