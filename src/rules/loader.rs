//! Loading rules from YAML configuration sources.
//!
//! Each source is a YAML document of the form:
//!
//! ```yaml
//! topics:
//!   - name: /odom
//!     hz_range: [10, 30]
//!   - name: /camera\d+/image_raw
//!     hz_range: [25.0, 35.0]
//! ```
//!
//! Sources are merged in order. A broken source is skipped as a whole, a
//! broken entry is skipped on its own; both are reported in the
//! [`LoadReport`] and logged as warnings.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, warn};

use super::{FrequencyRange, Rule, RuleStore};
use crate::error::RuleLoadError;

/// Where a set of rules comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A YAML file on disk.
    File(PathBuf),
    /// YAML text held in memory, with a name used in messages.
    Inline { name: String, yaml: String },
}

impl ConfigSource {
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        ConfigSource::File(path.as_ref().to_path_buf())
    }

    pub fn inline(name: &str, yaml: &str) -> Self {
        ConfigSource::Inline {
            name: name.to_string(),
            yaml: yaml.to_string(),
        }
    }

    /// Human-readable description, also recorded as each rule's origin.
    pub fn description(&self) -> String {
        match self {
            ConfigSource::File(path) => format!("file: {}", path.display()),
            ConfigSource::Inline { name, .. } => format!("inline: {}", name),
        }
    }

    fn read(&self) -> Result<String, String> {
        match self {
            ConfigSource::File(path) => {
                fs::read_to_string(path).map_err(|e| format!("Read error: {}", e))
            }
            ConfigSource::Inline { yaml, .. } => Ok(yaml.clone()),
        }
    }
}

/// Outcome of [`RuleStore::load`]: the merged store plus everything that was
/// skipped along the way.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub store: RuleStore,
    pub issues: Vec<RuleLoadError>,
}

impl LoadReport {
    /// Returns true if every source and entry loaded cleanly.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl RuleStore {
    /// Build a store by merging `sources` in order.
    ///
    /// Never fails: unusable sources and entries are skipped and reported.
    pub fn load(sources: &[ConfigSource]) -> LoadReport {
        let mut report = LoadReport::default();

        for source in sources {
            let origin = source.description();
            if let Err(reason) = load_source(source, &origin, &mut report) {
                let err = RuleLoadError::ConfigSource {
                    source_name: origin,
                    reason,
                };
                warn!("{}", err);
                report.issues.push(err);
            }
        }

        report
    }
}

/// Load one source into the report. Entry-level problems are pushed
/// directly; a source-level problem is returned as `Err`.
fn load_source(source: &ConfigSource, origin: &str, report: &mut LoadReport) -> Result<(), String> {
    let content = source.read()?;
    let document: Value =
        serde_yaml::from_str(&content).map_err(|e| format!("Parse error: {}", e))?;

    let entries = match document {
        Value::Null => return Ok(()),
        Value::Mapping(ref map) => match map.get("topics") {
            None | Some(Value::Null) => {
                debug!("{} has no 'topics' list", origin);
                return Ok(());
            }
            Some(Value::Sequence(entries)) => entries,
            Some(_) => return Err("'topics' is not a list".to_string()),
        },
        _ => return Err("top level is not a mapping".to_string()),
    };

    for (index, entry) in entries.iter().enumerate() {
        match parse_entry(entry, origin) {
            Ok(rule) => report.store.insert(rule),
            Err((name, reason)) => {
                let err = RuleLoadError::InvalidRule {
                    source_name: origin.to_string(),
                    index,
                    name,
                    reason,
                };
                warn!("{}", err);
                report.issues.push(err);
            }
        }
    }

    Ok(())
}

/// Parse a single `{name, hz_range}` entry. On failure returns the entry's
/// name (or a placeholder) and the reason.
fn parse_entry(entry: &Value, origin: &str) -> Result<Rule, (String, String)> {
    let name = match entry.get("name") {
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        Some(Value::String(_)) => return Err(("<unnamed>".to_string(), "empty name".to_string())),
        Some(_) => return Err(("<unnamed>".to_string(), "name is not a string".to_string())),
        None => return Err(("<unnamed>".to_string(), "missing name".to_string())),
    };

    let range = match entry.get("hz_range") {
        Some(Value::Sequence(bounds)) if bounds.len() == 2 => {
            match (parse_bound(&bounds[0]), parse_bound(&bounds[1])) {
                (Some(min), Some(max)) => FrequencyRange::new(min, max),
                _ => {
                    return Err((
                        name,
                        format!("hz_range bound is not a number: {:?}", bounds),
                    ))
                }
            }
        }
        Some(Value::Sequence(bounds)) => {
            return Err((
                name,
                format!("hz_range must have 2 bounds, found {}", bounds.len()),
            ))
        }
        Some(_) => return Err((name, "hz_range is not a list".to_string())),
        None => return Err((name, "missing hz_range".to_string())),
    };

    Rule::parse(&name, range, origin).map_err(|e| (name, format!("invalid pattern: {}", e)))
}

/// A bound is a YAML number, or a string that parses as a float.
fn parse_bound(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
