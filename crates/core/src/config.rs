use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::framework::{Framework, FrameworkError};
use crate::qualification::{AssessmentEngine, ScoringPolicy};

pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["meddpicc.toml", "config/meddpicc.toml"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub framework: FrameworkConfig,
    pub scoring: ScoringPolicy,
    pub logging: LoggingConfig,
}

/// Where the qualification framework comes from. No path means the built-in
/// eight-pillar framework.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameworkConfig {
    pub path: Option<PathBuf>,
    pub format: FrameworkFormat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// `native` is the TOML framework definition; `legacy` is the older JSON shape
/// with per-question weights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkFormat {
    #[default]
    Native,
    Legacy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub framework_path: Option<PathBuf>,
    pub framework_format: Option<FrameworkFormat>,
    pub log_level: Option<String>,
    pub completion_threshold_pct: Option<u8>,
    pub insight_limit: Option<usize>,
    pub lock_completed: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
    #[error("could not read framework file `{path}`: {source}")]
    ReadFramework { path: PathBuf, source: std::io::Error },
    #[error("invalid framework in `{path}`: {source}")]
    Framework { path: PathBuf, source: FrameworkError },
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            framework: FrameworkConfig::default(),
            scoring: ScoringPolicy::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for FrameworkFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "legacy" => Ok(Self::Legacy),
            other => Err(ConfigError::Validation(format!(
                "unsupported framework format `{other}` (expected native|legacy)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch, path.parent());
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Reads the configured framework, or returns the built-in one.
    pub fn load_framework(&self) -> Result<Framework, ConfigError> {
        let Some(path) = &self.framework.path else {
            return Ok(Framework::meddpicc());
        };

        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFramework { path: path.clone(), source })?;
        let framework = match self.framework.format {
            FrameworkFormat::Native => Framework::from_toml_str(&raw),
            FrameworkFormat::Legacy => Framework::from_legacy_json(&raw),
        };
        framework.map_err(|source| ConfigError::Framework { path: path.clone(), source })
    }

    /// Loads the framework and checks the scoring policy against it.
    pub fn build_engine(&self) -> Result<AssessmentEngine, ConfigError> {
        let framework = self.load_framework()?;
        self.scoring.validate_for(&framework).map_err(ConfigError::Validation)?;
        Ok(AssessmentEngine::new(framework, self.scoring.clone()))
    }

    fn apply_patch(&mut self, patch: ConfigPatch, config_dir: Option<&Path>) {
        if let Some(framework) = patch.framework {
            if let Some(path) = framework.path {
                // Relative framework paths are resolved against the config file.
                self.framework.path = Some(match config_dir {
                    Some(dir) if path.is_relative() => dir.join(path),
                    _ => path,
                });
            }
            if let Some(format) = framework.format {
                self.framework.format = format;
            }
        }

        if let Some(scoring) = patch.scoring {
            if let Some(completion_threshold_pct) = scoring.completion_threshold_pct {
                self.scoring.completion_threshold_pct = completion_threshold_pct;
            }
            if let Some(insight_limit) = scoring.insight_limit {
                self.scoring.insight_limit = insight_limit;
            }
            if let Some(lock_completed) = scoring.lock_completed {
                self.scoring.lock_completed = lock_completed;
            }

            if let Some(risk) = scoring.risk {
                if let Some(critical_below) = risk.critical_below {
                    self.scoring.risk.critical_below = critical_below;
                }
                if let Some(high_below) = risk.high_below {
                    self.scoring.risk.high_below = high_below;
                }
                if let Some(value) = risk.critical_confidence_below {
                    self.scoring.risk.critical_confidence_below = value;
                }
                if let Some(value) = risk.elevated_confidence_below {
                    self.scoring.risk.elevated_confidence_below = value;
                }
            }

            if let Some(confidence) = scoring.confidence {
                if let Some(low) = confidence.low {
                    self.scoring.confidence.low = low;
                }
                if let Some(medium) = confidence.medium {
                    self.scoring.confidence.medium = medium;
                }
                if let Some(high) = confidence.high {
                    self.scoring.confidence.high = high;
                }
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("MEDDPICC_FRAMEWORK_PATH") {
            self.framework.path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("MEDDPICC_FRAMEWORK_FORMAT") {
            self.framework.format = value.parse()?;
        }

        if let Some(value) = read_env("MEDDPICC_SCORING_COMPLETION_THRESHOLD_PCT") {
            self.scoring.completion_threshold_pct =
                parse_u8("MEDDPICC_SCORING_COMPLETION_THRESHOLD_PCT", &value)?;
        }
        if let Some(value) = read_env("MEDDPICC_SCORING_INSIGHT_LIMIT") {
            self.scoring.insight_limit = parse_usize("MEDDPICC_SCORING_INSIGHT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("MEDDPICC_SCORING_LOCK_COMPLETED") {
            self.scoring.lock_completed = parse_bool("MEDDPICC_SCORING_LOCK_COMPLETED", &value)?;
        }

        if let Some(value) = read_env("MEDDPICC_RISK_CRITICAL_BELOW") {
            self.scoring.risk.critical_below = parse_u32("MEDDPICC_RISK_CRITICAL_BELOW", &value)?;
        }
        if let Some(value) = read_env("MEDDPICC_RISK_HIGH_BELOW") {
            self.scoring.risk.high_below = parse_u32("MEDDPICC_RISK_HIGH_BELOW", &value)?;
        }
        if let Some(value) = read_env("MEDDPICC_RISK_CRITICAL_CONFIDENCE_BELOW") {
            self.scoring.risk.critical_confidence_below =
                parse_u8("MEDDPICC_RISK_CRITICAL_CONFIDENCE_BELOW", &value)?;
        }
        if let Some(value) = read_env("MEDDPICC_RISK_ELEVATED_CONFIDENCE_BELOW") {
            self.scoring.risk.elevated_confidence_below =
                parse_u8("MEDDPICC_RISK_ELEVATED_CONFIDENCE_BELOW", &value)?;
        }

        if let Some(value) = read_env("MEDDPICC_CONFIDENCE_LOW") {
            self.scoring.confidence.low = parse_u8("MEDDPICC_CONFIDENCE_LOW", &value)?;
        }
        if let Some(value) = read_env("MEDDPICC_CONFIDENCE_MEDIUM") {
            self.scoring.confidence.medium = parse_u8("MEDDPICC_CONFIDENCE_MEDIUM", &value)?;
        }
        if let Some(value) = read_env("MEDDPICC_CONFIDENCE_HIGH") {
            self.scoring.confidence.high = parse_u8("MEDDPICC_CONFIDENCE_HIGH", &value)?;
        }

        let log_level =
            read_env("MEDDPICC_LOGGING_LEVEL").or_else(|| read_env("MEDDPICC_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("MEDDPICC_LOGGING_FORMAT").or_else(|| read_env("MEDDPICC_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(framework_path) = overrides.framework_path {
            self.framework.path = Some(framework_path);
        }
        if let Some(framework_format) = overrides.framework_format {
            self.framework.format = framework_format;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(completion_threshold_pct) = overrides.completion_threshold_pct {
            self.scoring.completion_threshold_pct = completion_threshold_pct;
        }
        if let Some(insight_limit) = overrides.insight_limit {
            self.scoring.insight_limit = insight_limit;
        }
        if let Some(lock_completed) = overrides.lock_completed {
            self.scoring.lock_completed = lock_completed;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_framework(&self.framework)?;
        self.scoring.validate().map_err(ConfigError::Validation)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `load` would read, if any.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_framework(framework: &FrameworkConfig) -> Result<(), ConfigError> {
    if let Some(path) = &framework.path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "framework.path must not be empty when set".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u8(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.parse::<u8>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    framework: Option<FrameworkPatch>,
    scoring: Option<ScoringPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct FrameworkPatch {
    path: Option<PathBuf>,
    format: Option<FrameworkFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct ScoringPatch {
    completion_threshold_pct: Option<u8>,
    insight_limit: Option<usize>,
    lock_completed: Option<bool>,
    risk: Option<RiskPatch>,
    confidence: Option<ConfidencePatch>,
}

#[derive(Debug, Default, Deserialize)]
struct RiskPatch {
    critical_below: Option<u32>,
    high_below: Option<u32>,
    critical_confidence_below: Option<u8>,
    elevated_confidence_below: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfidencePatch {
    low: Option<u8>,
    medium: Option<u8>,
    high: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
