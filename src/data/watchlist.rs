//! The set of topics currently flagged as failing.
//!
//! Only `NG` topics are kept. Each processed record is reconciled against the
//! list: new failures are added, ongoing failures are updated, and topics
//! that reported anything other than `NG` are dropped.

use std::collections::HashMap;
use std::time::Instant;

use super::validate::{TopicStatus, ValidationResult};

/// A failing topic with the latest result that reported it.
#[derive(Debug, Clone)]
pub struct WatchedTopic {
    pub result: ValidationResult,
    /// When the topic first started failing.
    pub since: Instant,
    /// When the topic was last reported.
    pub last_seen: Instant,
}

impl WatchedTopic {
    pub fn topic(&self) -> &str {
        &self.result.topic
    }
}

/// Changes needed to bring a [`WatchList`] in line with a batch of results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub to_add: Vec<ValidationResult>,
    pub to_update: Vec<ValidationResult>,
    pub to_remove: Vec<String>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_remove.is_empty()
    }
}

/// Work out how `previous` should change given `results`.
///
/// If a topic appears more than once in `results`, its last entry wins.
pub fn reconcile(previous: &WatchList, results: &[ValidationResult]) -> Reconciliation {
    // Latest result per topic, in order of first appearance
    let mut latest: Vec<&ValidationResult> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for result in results {
        match positions.get(result.topic.as_str()).copied() {
            Some(i) => latest[i] = result,
            None => {
                positions.insert(result.topic.as_str(), latest.len());
                latest.push(result);
            }
        }
    }

    let mut changes = Reconciliation::default();
    for result in latest {
        let present = previous.contains(&result.topic);
        match (result.status == TopicStatus::Ng, present) {
            (true, true) => changes.to_update.push(result.clone()),
            (true, false) => changes.to_add.push(result.clone()),
            (false, true) => changes.to_remove.push(result.topic.clone()),
            (false, false) => {}
        }
    }
    changes
}

/// Failing topics in the order they started failing.
#[derive(Debug, Clone, Default)]
pub struct WatchList {
    topics: Vec<WatchedTopic>,
}

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t.topic() == topic)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchedTopic> {
        self.topics.iter()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Apply a reconciliation computed against this list.
    pub fn apply(&mut self, changes: Reconciliation, now: Instant) {
        self.topics.retain(|t| !changes.to_remove.iter().any(|r| r == t.topic()));

        for result in changes.to_update {
            if let Some(watched) = self.topics.iter_mut().find(|t| t.topic() == result.topic) {
                watched.result = result;
                watched.last_seen = now;
            }
        }

        for result in changes.to_add {
            self.topics.push(WatchedTopic {
                result,
                since: now,
                last_seen: now,
            });
        }
    }

    /// Reconcile against `results` and apply the changes.
    pub fn update(&mut self, results: &[ValidationResult], now: Instant) -> Reconciliation {
        let changes = reconcile(self, results);
        self.apply(changes.clone(), now);
        changes
    }

    /// Forget every watched topic.
    pub fn clear(&mut self) {
        self.topics.clear();
    }
}
