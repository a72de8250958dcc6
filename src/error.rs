//! Error types for rule loading.
//!
//! Nothing here is fatal: the loader records these, logs them and keeps going
//! with whatever rules it could still build.

use thiserror::Error;

/// A problem found while building a [`RuleStore`](crate::rules::RuleStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleLoadError {
    /// A whole configuration source was unreadable or structurally invalid.
    /// The source was skipped.
    #[error("config source '{source_name}' skipped: {reason}")]
    ConfigSource { source_name: String, reason: String },

    /// A single rule entry was malformed. Only that entry was skipped.
    #[error("invalid rule #{index} ('{name}') in '{source_name}': {reason}")]
    InvalidRule {
        source_name: String,
        index: usize,
        name: String,
        reason: String,
    },
}

impl RuleLoadError {
    /// Description of the configuration source the problem belongs to.
    pub fn source_name(&self) -> &str {
        match self {
            RuleLoadError::ConfigSource { source_name, .. } => source_name,
            RuleLoadError::InvalidRule { source_name, .. } => source_name,
        }
    }

    /// Returns true if the whole source was discarded.
    pub fn is_source_level(&self) -> bool {
        matches!(self, RuleLoadError::ConfigSource { .. })
    }
}
