//! The single entry point from raw record text to classified results.

use serde::Serialize;
use tracing::{error, info, warn};

use super::extract::StatisticsExtractor;
use super::validate::{validate, TopicStatus, ValidationResult};
use crate::rules::RuleStore;

/// Extracts statistics from a record and validates each one.
///
/// Holds no state besides compiled patterns, so one pipeline can serve any
/// number of records, rule stores and threads.
#[derive(Debug, Clone, Default)]
pub struct ValidationPipeline {
    extractor: StatisticsExtractor,
}

impl ValidationPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify every topic reported in `record`, in the order reported.
    pub fn process(&self, record: &str, store: &RuleStore) -> Vec<ValidationResult> {
        self.extractor
            .extract(record)
            .iter()
            .map(|stat| validate(stat, store))
            .collect()
    }
}

/// Counts of results by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub total: usize,
    pub ok: usize,
    pub ng: usize,
    pub not_found: usize,
}

impl ResultSummary {
    pub fn from_results(results: &[ValidationResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.status {
                TopicStatus::Ok => summary.ok += 1,
                TopicStatus::Ng => summary.ng += 1,
                TopicStatus::ConfigNotFound => summary.not_found += 1,
            }
        }
        summary
    }

    /// The most severe status present, if any.
    pub fn worst(&self) -> Option<TopicStatus> {
        if self.ng > 0 {
            Some(TopicStatus::Ng)
        } else if self.not_found > 0 {
            Some(TopicStatus::ConfigNotFound)
        } else if self.ok > 0 {
            Some(TopicStatus::Ok)
        } else {
            None
        }
    }
}

/// Log each result at a level matching its status.
pub fn log_results(results: &[ValidationResult]) {
    info!("--- Topic frequency validation results ---");
    for result in results {
        let message = format!(
            "Topic: {}\n  Frequency: {}\n  Expected Range: {}\n  Status: {}\n  Config Source: {}",
            result.topic,
            result.frequency,
            result.expected_range_label(),
            result.status,
            result.config_source_label(),
        );
        match result.status {
            TopicStatus::Ng => error!("{}", message),
            TopicStatus::ConfigNotFound => warn!("{}", message),
            TopicStatus::Ok => info!("{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ConfigSource;

    const RULES: &str = r#"
topics:
  - name: /odom
    hz_range: [10, 30]
  - name: /camera\d+/image_raw
    hz_range: [25, 35]
"#;

    const RECORD: &str = "\x1b[0m[INFO] [rosbag_checker_live]:\n\
                          Statistics for topic /odom\n\
                          Message count = 600, Message frequency = 20.0\n\
                          Statistics for topic /camera0/image_raw\n\
                          Message count = 10, Message frequency = nan\n\
                          Statistics for topic /unknown\n\
                          Message count = 3, Message frequency = 1.5\n";

    #[test]
    fn test_process_preserves_order_and_classifies() {
        let report = RuleStore::load(&[ConfigSource::inline("rules", RULES)]);
        let pipeline = ValidationPipeline::new();

        let results = pipeline.process(RECORD, &report.store);
        let statuses: Vec<(&str, TopicStatus)> =
            results.iter().map(|r| (r.topic.as_str(), r.status)).collect();

        assert_eq!(
            statuses,
            vec![
                ("/odom", TopicStatus::Ok),
                ("/camera0/image_raw", TopicStatus::Ng),
                ("/unknown", TopicStatus::ConfigNotFound),
            ]
        );
    }

    #[test]
    fn test_process_without_statistics() {
        let pipeline = ValidationPipeline::new();
        assert!(pipeline.process("[INFO] idle", &RuleStore::new()).is_empty());
    }

    #[test]
    fn test_pipeline_is_shareable_across_threads() {
        let report = RuleStore::load(&[ConfigSource::inline("rules", RULES)]);
        let store = std::sync::Arc::new(report.store);
        let pipeline = std::sync::Arc::new(ValidationPipeline::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let pipeline = pipeline.clone();
                std::thread::spawn(move || pipeline.process(RECORD, &store).len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 3);
        }
    }

    #[test]
    fn test_summary_counts() {
        let report = RuleStore::load(&[ConfigSource::inline("rules", RULES)]);
        let results = ValidationPipeline::new().process(RECORD, &report.store);

        let summary = ResultSummary::from_results(&results);
        assert_eq!(
            summary,
            ResultSummary {
                total: 3,
                ok: 1,
                ng: 1,
                not_found: 1
            }
        );
        assert_eq!(summary.worst(), Some(TopicStatus::Ng));
        assert_eq!(ResultSummary::default().worst(), None);
    }
}
