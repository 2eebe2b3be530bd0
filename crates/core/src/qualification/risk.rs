//! Risk classification decision table.

use serde::{Deserialize, Serialize};

use crate::domain::assessment::RiskLevel;

/// Score and confidence cut-offs for the risk decision table.
///
/// Rules are evaluated in order, first match wins:
///
/// | total score              | confidence                        | risk     |
/// |--------------------------|-----------------------------------|----------|
/// | `< critical_below`       | `< critical_confidence_below`     | critical |
/// | `< critical_below`       | any                               | high     |
/// | `< high_below`           | `< elevated_confidence_below`     | high     |
/// | `< high_below`           | any                               | medium   |
/// | otherwise                | any                               | low      |
///
/// Lower bounds are inclusive: a score equal to a cut-off belongs to the better band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub critical_below: u32,
    pub high_below: u32,
    pub critical_confidence_below: u8,
    pub elevated_confidence_below: u8,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            critical_below: 192,
            high_below: 256,
            critical_confidence_below: 50,
            elevated_confidence_below: 60,
        }
    }
}

impl RiskThresholds {
    pub fn classify(&self, total_score: u32, confidence_score: u8) -> RiskLevel {
        if total_score < self.critical_below {
            if confidence_score < self.critical_confidence_below {
                RiskLevel::Critical
            } else {
                RiskLevel::High
            }
        } else if total_score < self.high_below {
            if confidence_score < self.elevated_confidence_below {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            }
        } else {
            RiskLevel::Low
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.critical_below > self.high_below {
            return Err(
                "scoring.risk.critical_below must not exceed scoring.risk.high_below".to_string()
            );
        }
        if self.critical_confidence_below > 100 || self.elevated_confidence_below > 100 {
            return Err("scoring.risk confidence cut-offs must be in range 0..=100".to_string());
        }
        Ok(())
    }
}
