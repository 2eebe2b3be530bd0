use serde::{Deserialize, Serialize};

use super::confidence::ConfidenceWeights;
use crate::framework::Framework;
use super::insights::DEFAULT_INSIGHT_LIMIT;
use super::risk::RiskThresholds;

pub const DEFAULT_COMPLETION_THRESHOLD_PCT: u8 = 80;

/// Tunable scoring knobs loaded from the `[scoring]` config section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub completion_threshold_pct: u8,
    pub insight_limit: usize,
    pub lock_completed: bool,
    pub risk: RiskThresholds,
    pub confidence: ConfidenceWeights,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            completion_threshold_pct: DEFAULT_COMPLETION_THRESHOLD_PCT,
            insight_limit: DEFAULT_INSIGHT_LIMIT,
            lock_completed: false,
            risk: RiskThresholds::default(),
            confidence: ConfidenceWeights::default(),
        }
    }
}

impl ScoringPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.completion_threshold_pct == 0 || self.completion_threshold_pct > 100 {
            return Err("scoring.completion_threshold_pct must be in range 1..=100".to_string());
        }
        if self.insight_limit == 0 {
            return Err("scoring.insight_limit must be greater than zero".to_string());
        }
        self.risk.validate()?;
        self.confidence.validate()
    }

    /// [`validate`](Self::validate) plus the checks that depend on the framework
    /// being scored: the low-risk band must be reachable at its maximum score.
    pub fn validate_for(&self, framework: &Framework) -> Result<(), String> {
        self.validate()?;
        let max_total = framework.max_total_score();
        if self.risk.high_below > max_total {
            return Err(format!(
                "scoring.risk.high_below ({}) exceeds the framework maximum score ({max_total})",
                self.risk.high_below
            ));
        }
        Ok(())
    }
}
