//! Verdict aggregation and statistics.
//!
//! This module combines the verdicts of several source documents into a
//! summary view: averages, stance distribution, overall bias and the
//! rate-change outlook.

use crate::models::{Stance, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Probability above which a rate change is considered likely.
const HIGH_PROBABILITY: f64 = 60.0;
/// Probability above which a rate change is considered possible.
const MODERATE_PROBABILITY: f64 = 30.0;

/// Number of verdicts per stance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StanceCounts {
    pub hawkish: usize,
    pub dovish: usize,
    pub neutral: usize,
    pub hold: usize,
    pub unknown: usize,
    pub error: usize,
}

impl StanceCounts {
    pub fn from_verdicts(verdicts: &[Verdict]) -> Self {
        let mut counts = Self::default();
        for verdict in verdicts {
            match verdict.stance {
                Stance::Hawkish => counts.hawkish += 1,
                Stance::Dovish => counts.dovish += 1,
                Stance::Neutral => counts.neutral += 1,
                Stance::Hold => counts.hold += 1,
                Stance::Unknown => counts.unknown += 1,
                Stance::Error => counts.error += 1,
            }
        }
        counts
    }

    /// Verdicts that did not produce a usable judgment.
    pub fn degraded(&self) -> usize {
        self.unknown + self.error
    }
}

/// Overall leaning across all sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Bias {
    Hawkish,
    Dovish,
    Hold,
    Mixed,
}

impl Bias {
    /// A stance wins only when it strictly outnumbers the other two
    /// directional stances.
    pub fn from_counts(counts: &StanceCounts) -> Self {
        let (hawk, dove, hold) = (counts.hawkish, counts.dovish, counts.hold);
        if hawk > dove && hawk > hold {
            Bias::Hawkish
        } else if dove > hawk && dove > hold {
            Bias::Dovish
        } else if hold > hawk && hold > dove {
            Bias::Hold
        } else {
            Bias::Mixed
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Bias::Hawkish => "⚠️  HAWKISH BIAS - Rate increases more likely",
            Bias::Dovish => "📉 DOVISH BIAS - Rate cuts more likely",
            Bias::Hold => "⏸️  HOLD STANCE - Rates likely to remain stable",
            Bias::Mixed => "⚖️  MIXED SIGNALS - No clear consensus",
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bias::Hawkish => write!(f, "HAWKISH"),
            Bias::Dovish => write!(f, "DOVISH"),
            Bias::Hold => write!(f, "HOLD"),
            Bias::Mixed => write!(f, "MIXED"),
        }
    }
}

/// Likelihood of a rate change within three months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RateOutlook {
    High,
    Moderate,
    Low,
}

impl RateOutlook {
    pub fn from_probability(probability: f64) -> Self {
        if probability > HIGH_PROBABILITY {
            RateOutlook::High
        } else if probability > MODERATE_PROBABILITY {
            RateOutlook::Moderate
        } else {
            RateOutlook::Low
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            RateOutlook::High => "⚠️  HIGH probability of rate change in next 3 months",
            RateOutlook::Moderate => "⚡ MODERATE probability of rate change",
            RateOutlook::Low => "✅ LOW probability of rate change",
        }
    }

    pub fn guidance(&self) -> [&'static str; 2] {
        match self {
            RateOutlook::High => [
                "Monitor BoC announcements closely",
                "Consider locking in rates if borrowing soon",
            ],
            RateOutlook::Moderate => [
                "Stay informed of economic indicators",
                "Review mortgage renewal options",
            ],
            RateOutlook::Low => [
                "Stable rate environment expected",
                "Variable rate products may be attractive",
            ],
        }
    }
}

/// Summary of all verdicts in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    pub sources: usize,
    /// Averaged over every verdict, degraded ones counting as zero.
    pub average_confidence: f64,
    pub average_rate_change_probability: f64,
    pub stance_counts: StanceCounts,
    pub bias: Bias,
    pub outlook: RateOutlook,
}

impl PolicySummary {
    /// Aggregate verdicts; `None` when there is nothing to summarize.
    pub fn from_verdicts(verdicts: &[Verdict]) -> Option<Self> {
        if verdicts.is_empty() {
            return None;
        }

        let n = verdicts.len() as f64;
        let average_confidence = verdicts.iter().map(|v| v.confidence as f64).sum::<f64>() / n;
        let average_rate_change_probability = verdicts
            .iter()
            .map(|v| v.rate_change_probability as f64)
            .sum::<f64>()
            / n;

        let stance_counts = StanceCounts::from_verdicts(verdicts);
        let bias = Bias::from_counts(&stance_counts);

        Some(Self {
            sources: verdicts.len(),
            average_confidence,
            average_rate_change_probability,
            stance_counts,
            bias,
            outlook: RateOutlook::from_probability(average_rate_change_probability),
        })
    }
}

/// All key signals across verdicts, in source order.
pub fn all_signals(verdicts: &[Verdict]) -> Vec<&str> {
    verdicts
        .iter()
        .flat_map(|v| v.key_signals.iter().map(String::as_str))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(stance: Stance, confidence: u8, probability: u8) -> Verdict {
        Verdict {
            confidence,
            rate_change_probability: probability,
            stance,
            key_signals: vec![format!("{} signal", stance)],
            ..Verdict::error("Speech", "")
        }
    }

    #[test]
    fn test_empty_input_has_no_summary() {
        assert!(PolicySummary::from_verdicts(&[]).is_none());
    }

    #[test]
    fn test_averages_include_degraded_verdicts() {
        let verdicts = vec![
            verdict(Stance::Hawkish, 80, 70),
            verdict(Stance::Hawkish, 60, 50),
            Verdict::error("Speech", "unreachable"),
        ];

        let summary = PolicySummary::from_verdicts(&verdicts).unwrap();
        assert_eq!(summary.sources, 3);
        assert!((summary.average_confidence - 140.0 / 3.0).abs() < 1e-9);
        assert!((summary.average_rate_change_probability - 40.0).abs() < 1e-9);
        assert_eq!(summary.stance_counts.hawkish, 2);
        assert_eq!(summary.stance_counts.error, 1);
        assert_eq!(summary.stance_counts.degraded(), 1);
        assert_eq!(summary.bias, Bias::Hawkish);
        assert_eq!(summary.outlook, RateOutlook::Moderate);
    }

    #[test]
    fn test_bias_requires_strict_majority() {
        let counts = StanceCounts {
            hawkish: 2,
            dovish: 2,
            hold: 1,
            ..StanceCounts::default()
        };
        assert_eq!(Bias::from_counts(&counts), Bias::Mixed);

        let counts = StanceCounts {
            hold: 3,
            hawkish: 1,
            neutral: 5,
            ..StanceCounts::default()
        };
        assert_eq!(Bias::from_counts(&counts), Bias::Hold);

        let counts = StanceCounts {
            dovish: 1,
            ..StanceCounts::default()
        };
        assert_eq!(Bias::from_counts(&counts), Bias::Dovish);
    }

    #[test]
    fn test_rate_outlook_thresholds() {
        assert_eq!(RateOutlook::from_probability(60.1), RateOutlook::High);
        assert_eq!(RateOutlook::from_probability(60.0), RateOutlook::Moderate);
        assert_eq!(RateOutlook::from_probability(30.0), RateOutlook::Low);
        assert_eq!(RateOutlook::from_probability(0.0), RateOutlook::Low);
    }

    #[test]
    fn test_all_signals_in_order() {
        let verdicts = vec![
            verdict(Stance::Hold, 50, 10),
            verdict(Stance::Dovish, 50, 10),
        ];
        assert_eq!(all_signals(&verdicts), vec!["HOLD signal", "DOVISH signal"]);
    }
}
