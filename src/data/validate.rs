//! Classification of observed frequencies against the rule store.

use std::fmt;

use serde::{Serialize, Serializer};

use super::extract::ObservedStat;
use crate::rules::{FrequencyRange, MatchSource, RuleStore};

/// Placeholder shown where a result has no matching rule.
pub const NOT_AVAILABLE: &str = "N/A";

/// Health classification of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TopicStatus {
    /// Frequency is within the configured range.
    Ok,
    /// No rule matched the topic.
    ConfigNotFound,
    /// Frequency is outside the configured range, or undefined.
    Ng,
}

impl TopicStatus {
    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            TopicStatus::Ok => "OK",
            TopicStatus::Ng => "NG",
            TopicStatus::ConfigNotFound => "Config Not Found",
        }
    }

    /// Returns a short symbol for narrow table columns.
    pub fn symbol(&self) -> &'static str {
        match self {
            TopicStatus::Ok => "OK",
            TopicStatus::Ng => "NG",
            TopicStatus::ConfigNotFound => "N/F",
        }
    }
}

impl fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TopicStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Outcome of validating one [`ObservedStat`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub topic: String,
    pub message_count: u64,
    pub frequency: f64,
    /// Range of the matching rule, if any.
    pub expected_range: Option<FrequencyRange>,
    pub status: TopicStatus,
    /// Which rule matched, if any.
    pub config_source: Option<MatchSource>,
}

impl ValidationResult {
    /// `[min, max]` of the matched rule, or `N/A`.
    pub fn expected_range_label(&self) -> String {
        self.expected_range
            .map(|r| r.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// Description of the matched rule, or `N/A`.
    pub fn config_source_label(&self) -> String {
        self.config_source
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// Frequency formatted for display (`nan` when undefined).
    pub fn frequency_label(&self) -> String {
        if self.frequency.is_nan() {
            "nan".to_string()
        } else {
            format!("{:.2}", self.frequency)
        }
    }
}

/// Flat, string-valued form used for JSON output.
#[derive(Serialize)]
struct ResultRecord<'a> {
    topic: &'a str,
    message_count: u64,
    frequency: f64,
    expected_range: String,
    status: TopicStatus,
    config_source: String,
}

impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ResultRecord {
            topic: &self.topic,
            message_count: self.message_count,
            frequency: self.frequency,
            expected_range: self.expected_range_label(),
            status: self.status,
            config_source: self.config_source_label(),
        }
        .serialize(serializer)
    }
}

/// Validate one observation against the store. Always produces a result.
pub fn validate(stat: &ObservedStat, store: &RuleStore) -> ValidationResult {
    let found = store.find(&stat.topic);

    let status = match found {
        None => TopicStatus::ConfigNotFound,
        Some(rule) if rule.range().contains(stat.frequency) => TopicStatus::Ok,
        Some(_) => TopicStatus::Ng,
    };

    ValidationResult {
        topic: stat.topic.clone(),
        message_count: stat.message_count,
        frequency: stat.frequency,
        expected_range: found.map(|r| r.range()),
        status,
        config_source: found.map(|r| r.source()),
    }
}
