//! Frequency-range rules and the store that resolves them.
//!
//! Rules come in two flavours. An exact rule is keyed by a literal topic name;
//! a pattern rule is keyed by a regular expression that must match the whole
//! topic name. Lookup always prefers an exact rule, then walks the pattern
//! rules in the order they were loaded and takes the first full match.
//!
//! ## Submodules
//!
//! - [`loader`]: Reading YAML configuration sources and merging them into a
//!   [`RuleStore`]

pub mod loader;

pub use loader::{ConfigSource, LoadReport};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use regex::Regex;
use tracing::info;

/// Characters that turn a configured topic name into a pattern rule.
///
/// `.` is intentionally absent: topic names like `/foo.bar` stay exact.
const PATTERN_METACHARACTERS: &[char] = &[
    '*', '+', '?', '^', '$', '[', ']', '(', ')', '{', '}', '|', '\\',
];

/// Returns true if a configured topic name should be treated as a regex.
pub fn is_pattern_name(name: &str) -> bool {
    name.contains(PATTERN_METACHARACTERS)
}

/// Inclusive bounds an observed frequency must fall within.
///
/// `min <= max` is not enforced; inverted bounds reject every frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyRange {
    pub min: f64,
    pub max: f64,
}

impl FrequencyRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns true if `frequency` lies within `[min, max]`.
    ///
    /// NaN compares false against both bounds, so it is never contained.
    pub fn contains(&self, frequency: f64) -> bool {
        self.min <= frequency && frequency <= self.max
    }
}

impl fmt::Display for FrequencyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// A rule keyed by a literal topic name.
#[derive(Debug, Clone)]
pub struct ExactRule {
    pub name: String,
    pub range: FrequencyRange,
    /// Description of the configuration source this rule came from.
    pub origin: String,
}

/// A rule keyed by a regular expression over the full topic name.
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// The pattern as written in the configuration.
    pub pattern: String,
    /// Compiled, anchored form of `pattern`.
    regex: Regex,
    pub range: FrequencyRange,
    pub origin: String,
}

impl PatternRule {
    /// Compile a pattern rule. The pattern is anchored at both ends.
    ///
    /// The pattern must be valid on its own: a stray `)` would otherwise
    /// close the anchoring group and leave an unanchored alternative.
    pub fn new(
        pattern: &str,
        range: FrequencyRange,
        origin: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Regex::new(pattern)?;
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            range,
            origin: origin.into(),
        })
    }

    /// Returns true if the pattern matches the entire topic name.
    pub fn matches(&self, topic: &str) -> bool {
        self.regex.is_match(topic)
    }
}

/// A single frequency-range rule.
#[derive(Debug, Clone)]
pub enum Rule {
    Exact(ExactRule),
    Pattern(PatternRule),
}

impl Rule {
    /// Build a rule from a configured topic name, classifying it as exact or
    /// pattern by the metacharacter test.
    pub fn parse(
        name: &str,
        range: FrequencyRange,
        origin: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        if is_pattern_name(name) {
            PatternRule::new(name, range, origin).map(Rule::Pattern)
        } else {
            Ok(Rule::Exact(ExactRule {
                name: name.to_string(),
                range,
                origin: origin.into(),
            }))
        }
    }
}

/// Which rule resolved a topic, in display form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSource {
    /// Matched an exact rule with this name.
    Exact(String),
    /// Matched a pattern rule with this pattern.
    Pattern(String),
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchSource::Exact(name) => write!(f, "exact match: {}", name),
            MatchSource::Pattern(pattern) => write!(f, "pattern match: {}", pattern),
        }
    }
}

/// A rule found by [`RuleStore::find`].
#[derive(Debug, Clone, Copy)]
pub enum RuleMatch<'a> {
    Exact(&'a ExactRule),
    Pattern(&'a PatternRule),
}

impl RuleMatch<'_> {
    pub fn range(&self) -> FrequencyRange {
        match self {
            RuleMatch::Exact(r) => r.range,
            RuleMatch::Pattern(r) => r.range,
        }
    }

    pub fn source(&self) -> MatchSource {
        match self {
            RuleMatch::Exact(r) => MatchSource::Exact(r.name.clone()),
            RuleMatch::Pattern(r) => MatchSource::Pattern(r.pattern.clone()),
        }
    }
}

/// The merged set of frequency-range rules.
///
/// Built once by [`RuleStore::load`] (or incrementally with
/// [`RuleStore::insert`] before it is shared) and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    exact: BTreeMap<String, ExactRule>,
    patterns: Vec<PatternRule>,
}

impl RuleStore {
    /// Create an empty store. Every topic resolves to "not found".
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule.
    ///
    /// Exact rules replace any earlier rule with the same name. Pattern rules
    /// are appended, so earlier patterns keep precedence.
    pub fn insert(&mut self, rule: Rule) {
        match rule {
            Rule::Exact(r) => {
                self.exact.insert(r.name.clone(), r);
            }
            Rule::Pattern(r) => self.patterns.push(r),
        }
    }

    /// Find the rule governing `topic`.
    pub fn find(&self, topic: &str) -> Option<RuleMatch<'_>> {
        if let Some(rule) = self.exact.get(topic) {
            return Some(RuleMatch::Exact(rule));
        }
        self.patterns.iter().find(|p| p.matches(topic)).map(RuleMatch::Pattern)
    }

    /// Exact rules, sorted by topic name.
    pub fn exact_rules(&self) -> impl Iterator<Item = &ExactRule> {
        self.exact.values()
    }

    /// Pattern rules in resolution order.
    pub fn pattern_rules(&self) -> &[PatternRule] {
        &self.patterns
    }

    /// Total number of rules.
    pub fn len(&self) -> usize {
        self.exact.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Log the loaded rules at info level.
    pub fn log_summary(&self) {
        info!("--- Loaded Hz range rules ---");
        if self.is_empty() {
            info!("No Hz range rules were loaded.");
            return;
        }
        info!("Exact match rules:");
        for rule in self.exact_rules() {
            info!("  '{}': {} ({})", rule.name, rule.range, rule.origin);
        }
        info!("Pattern match rules:");
        for rule in self.pattern_rules() {
            info!("  '{}': {} ({})", rule.pattern, rule.range, rule.origin);
        }
    }
}

/// A [`RuleStore`] handle that can be swapped out on reload.
///
/// Readers take a snapshot with [`SharedRules::current`] and keep using it
/// even if a reload replaces the store while they work.
#[derive(Debug, Clone, Default)]
pub struct SharedRules {
    inner: Arc<RwLock<Arc<RuleStore>>>,
}

impl SharedRules {
    pub fn new(store: RuleStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(store))),
        }
    }

    /// Snapshot of the current store.
    pub fn current(&self) -> Arc<RuleStore> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the store for all subsequent readers.
    pub fn replace(&self, store: RuleStore) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(rules: &[(&str, f64, f64)]) -> RuleStore {
        let mut store = RuleStore::new();
        for (name, min, max) in rules {
            store.insert(Rule::parse(name, FrequencyRange::new(*min, *max), "test").unwrap());
        }
        store
    }

    #[test]
    fn test_metacharacter_classification() {
        assert!(!is_pattern_name("/odom"));
        assert!(!is_pattern_name("/foo.bar"));
        assert!(is_pattern_name("/cam\\d+"));
        assert!(is_pattern_name("/sensor/.*"));
        assert!(is_pattern_name("/a|/b"));
        assert!(is_pattern_name("/lidar[0-3]"));
    }

    #[test]
    fn test_range_display_and_bounds() {
        let range = FrequencyRange::new(10.0, 30.0);
        assert_eq!(range.to_string(), "[10, 30]");
        assert_eq!(FrequencyRange::new(0.5, 2.5).to_string(), "[0.5, 2.5]");

        assert!(range.contains(10.0));
        assert!(range.contains(30.0));
        assert!(!range.contains(9.99));
        assert!(!range.contains(f64::NAN));

        let inverted = FrequencyRange::new(5.0, 1.0);
        assert!(!inverted.contains(3.0));
    }

    #[test]
    fn test_pattern_is_full_match() {
        let store = store_with(&[(r"/cam\d+", 1.0, 5.0)]);
        assert!(store.find("/cam0").is_some());
        assert!(store.find("/cam12").is_some());
        assert!(store.find("/cam0/data").is_none());
        assert!(store.find("/sensor/cam0").is_none());
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        let store = store_with(&[("/a|/b", 1.0, 5.0)]);
        assert!(store.find("/a").is_some());
        assert!(store.find("/b").is_some());
        assert!(store.find("/a/extra").is_none());
        assert!(store.find("/x/b").is_none());
    }

    #[test]
    fn test_exact_beats_earlier_pattern() {
        let store = store_with(&[("/cam.*", 1.0, 2.0), ("/camera", 10.0, 20.0)]);
        let found = store.find("/camera").unwrap();
        assert_eq!(found.source(), MatchSource::Exact("/camera".to_string()));
        assert_eq!(found.range(), FrequencyRange::new(10.0, 20.0));
    }

    #[test]
    fn test_first_registered_pattern_wins() {
        let store = store_with(&[("/lidar.*", 5.0, 15.0), (r"/lidar\d", 1.0, 2.0)]);
        let found = store.find("/lidar1").unwrap();
        assert_eq!(found.source(), MatchSource::Pattern("/lidar.*".to_string()));
        assert_eq!(found.source().to_string(), "pattern match: /lidar.*");
    }

    #[test]
    fn test_exact_last_insert_wins() {
        let store = store_with(&[("/odom", 10.0, 30.0), ("/odom", 1.0, 2.0)]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.find("/odom").unwrap().range(), FrequencyRange::new(1.0, 2.0));
    }

    #[test]
    fn test_invalid_pattern_fails_to_parse() {
        let result = Rule::parse("/cam(", FrequencyRange::new(1.0, 2.0), "test");
        assert!(result.is_err());
    }

    #[test]
    fn test_stray_close_paren_is_not_an_escape_from_anchoring() {
        let range = FrequencyRange::new(1.0, 2.0);
        assert!(PatternRule::new("/foo)|(bar", range, "test").is_err());
        assert!(PatternRule::new("/foo)|(?:bar", range, "test").is_err());
        assert!(PatternRule::new("(/foo)|(bar)", range, "test").is_ok());
    }

    #[test]
    fn test_shared_rules_replace() {
        let shared = SharedRules::new(store_with(&[("/odom", 10.0, 30.0)]));
        let before = shared.current();

        shared.replace(RuleStore::new());

        // Snapshots taken before the swap are unaffected
        assert_eq!(before.len(), 1);
        assert!(shared.current().is_empty());
    }

    #[test]
    fn test_shared_rules_survive_poisoning() {
        let shared = SharedRules::new(store_with(&[("/odom", 10.0, 30.0)]));
        let poisoner = shared.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(shared.current().len(), 1);
        shared.replace(RuleStore::new());
        assert!(shared.current().is_empty());
    }
}
