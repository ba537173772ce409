//! Data models for the policy monitor.
//!
//! This module contains the core data structures used throughout the
//! application: text segments, per-chunk verdicts and the final
//! whole-document verdict, together with the closed enums that describe
//! a monetary-policy judgment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Maximum number of key signals carried by a verdict.
pub const MAX_KEY_SIGNALS: usize = 5;

/// Policy-direction classification of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum Stance {
    /// Signals rate increases likely
    Hawkish,
    /// Signals rate cuts likely
    Dovish,
    /// Balanced, no clear direction
    Neutral,
    /// Maintaining current rates
    Hold,
    /// The oracle answered but the answer could not be used
    Unknown,
    /// The analysis itself failed
    Error,
}

impl From<String> for Stance {
    fn from(s: String) -> Self {
        match s.trim().to_uppercase().as_str() {
            "HAWKISH" => Stance::Hawkish,
            "DOVISH" => Stance::Dovish,
            "NEUTRAL" => Stance::Neutral,
            "HOLD" => Stance::Hold,
            "ERROR" => Stance::Error,
            _ => Stance::Unknown,
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stance::Hawkish => write!(f, "HAWKISH"),
            Stance::Dovish => write!(f, "DOVISH"),
            Stance::Neutral => write!(f, "NEUTRAL"),
            Stance::Hold => write!(f, "HOLD"),
            Stance::Unknown => write!(f, "UNKNOWN"),
            Stance::Error => write!(f, "ERROR"),
        }
    }
}

impl Stance {
    /// Returns an emoji representation of the stance.
    pub fn emoji(&self) -> &'static str {
        match self {
            Stance::Hawkish => "🔴",
            Stance::Dovish => "🟢",
            Stance::Neutral => "🟡",
            Stance::Hold => "🔵",
            Stance::Unknown => "❓",
            Stance::Error => "❌",
        }
    }

    /// Whether this stance is a degraded result rather than a judgment.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Stance::Unknown | Stance::Error)
    }
}

/// Expected direction of the next rate move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum Direction {
    Up,
    Down,
    #[default]
    None,
}

impl From<String> for Direction {
    fn from(s: String) -> Self {
        match s.trim().to_uppercase().as_str() {
            "UP" => Direction::Up,
            "DOWN" => Direction::Down,
            _ => Direction::None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
            Direction::None => write!(f, "NONE"),
        }
    }
}

/// Level of concern about inflation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum InflationConcern {
    High,
    Medium,
    Low,
    #[default]
    Unclear,
}

impl From<String> for InflationConcern {
    fn from(s: String) -> Self {
        match s.trim().to_uppercase().as_str() {
            "HIGH" => InflationConcern::High,
            "MEDIUM" => InflationConcern::Medium,
            "LOW" => InflationConcern::Low,
            _ => InflationConcern::Unclear,
        }
    }
}

impl fmt::Display for InflationConcern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InflationConcern::High => write!(f, "HIGH"),
            InflationConcern::Medium => write!(f, "MEDIUM"),
            InflationConcern::Low => write!(f, "LOW"),
            InflationConcern::Unclear => write!(f, "UNCLEAR"),
        }
    }
}

/// How the bank views economic growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum GrowthOutlook {
    Strong,
    Moderate,
    Weak,
    #[default]
    Unclear,
}

impl From<String> for GrowthOutlook {
    fn from(s: String) -> Self {
        match s.trim().to_uppercase().as_str() {
            "STRONG" => GrowthOutlook::Strong,
            "MODERATE" => GrowthOutlook::Moderate,
            "WEAK" => GrowthOutlook::Weak,
            _ => GrowthOutlook::Unclear,
        }
    }
}

impl fmt::Display for GrowthOutlook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrowthOutlook::Strong => write!(f, "STRONG"),
            GrowthOutlook::Moderate => write!(f, "MODERATE"),
            GrowthOutlook::Weak => write!(f, "WEAK"),
            GrowthOutlook::Unclear => write!(f, "UNCLEAR"),
        }
    }
}

/// A bounded-size slice of a larger document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment text.
    pub text: String,
    /// Zero-based emission order.
    pub index: usize,
    /// Number of segments produced from the same input.
    pub total: usize,
}

/// Structured analysis of a single segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkVerdict {
    #[serde(default)]
    pub chunk_index: usize,
    #[serde(default, deserialize_with = "signals")]
    pub key_signals: Vec<String>,
    #[serde(default, deserialize_with = "label")]
    pub inflation_concern: InflationConcern,
    #[serde(default, deserialize_with = "label")]
    pub growth_outlook: GrowthOutlook,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: String,
}

/// Final whole-document verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(default = "unknown_stance", deserialize_with = "label")]
    pub stance: Stance,
    /// Confidence in the assessment (0-100).
    #[serde(default, deserialize_with = "percent")]
    pub confidence: u8,
    /// Probability of a rate change in the next three months (0-100).
    #[serde(default, deserialize_with = "percent")]
    pub rate_change_probability: u8,
    #[serde(default, deserialize_with = "label")]
    pub direction: Direction,
    #[serde(default, deserialize_with = "signals")]
    pub key_signals: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(default, deserialize_with = "label")]
    pub inflation_concern: InflationConcern,
    #[serde(default, deserialize_with = "label")]
    pub growth_outlook: GrowthOutlook,

    // The fields below are owned locally; oracle output never sets them.
    #[serde(skip_deserializing)]
    pub source_type: String,
    #[serde(skip_deserializing)]
    pub analyzed_at: Option<DateTime<Utc>>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub chunks_analyzed: Option<usize>,
    /// Document title, when the source had one.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Human-readable failure reason for degraded verdicts.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Oracle output that failed to decode.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    /// Set when the synthesis pass failed and the fallback was used.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub synthesis_error: Option<String>,
}

fn unknown_stance() -> Stance {
    Stance::Unknown
}

impl Verdict {
    /// Creates an empty verdict with the given stance.
    fn degraded(stance: Stance, source_type: &str, error: String) -> Self {
        Self {
            stance,
            confidence: 0,
            rate_change_probability: 0,
            direction: Direction::None,
            key_signals: Vec::new(),
            summary: String::new(),
            inflation_concern: InflationConcern::Unclear,
            growth_outlook: GrowthOutlook::Unclear,
            source_type: source_type.to_string(),
            analyzed_at: Some(Utc::now()),
            chunks_analyzed: None,
            title: None,
            error: Some(error),
            raw_response: None,
            synthesis_error: None,
        }
    }

    /// A verdict for an analysis that could not be carried out.
    pub fn error(source_type: &str, error: impl Into<String>) -> Self {
        Self::degraded(Stance::Error, source_type, error.into())
    }

    /// A verdict for an oracle answer that could not be decoded.
    pub fn unknown(source_type: &str, error: impl Into<String>, raw_response: &str) -> Self {
        Self {
            raw_response: Some(raw_response.to_string()),
            ..Self::degraded(Stance::Unknown, source_type, error.into())
        }
    }

    /// Attaches the document title.
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// Returns the verdict with `analyzed_at` cleared, for comparisons
    /// that should ignore capture time.
    #[cfg(test)]
    pub fn without_timestamp(mut self) -> Self {
        self.analyzed_at = None;
        self
    }
}

/// Accepts integer, float or numeric-string percentages and clamps to 0..=100.
fn percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(number.round().clamp(0.0, 100.0) as u8)
}

/// Accepts a list of signals, keeping string entries only, capped at five.
fn signals<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let signals = match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .take(MAX_KEY_SIGNALS)
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    };
    Ok(signals)
}

/// Decodes a closed label, mapping null or non-string values to the
/// type's unrecognized member.
fn label<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => T::from(s),
        _ => T::from(String::new()),
    })
}

/// Accepts a string, treating null or non-string values as empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        _ => String::new(),
    })
}
