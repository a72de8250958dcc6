//! Extraction of per-topic statistics from diagnostic log text.
//!
//! The monitor node prints blocks like:
//!
//! ```text
//! Statistics for topic /odom
//! Message count = 600, Message frequency = 20.01
//! ```
//!
//! often wrapped in terminal color codes. [`StatisticsExtractor`] strips the
//! codes and pulls out every block in order.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// How much of an unmatched record to include in debug logs.
const SAMPLE_CHARS: usize = 200;

/// CSI escape sequence: `ESC [`, parameter bytes, intermediate bytes, final byte.
const ANSI_CSI: &str = r"\x1b\[[0-?]*[ -/]*[@-~]";

const STATISTICS_BLOCK: &str = concat!(
    r"Statistics for topic (.+?)\n",
    r"Message count = ([0-9]+), Message frequency = ([0-9.]+|nan)",
);

static DEFAULT_EXTRACTOR: LazyLock<StatisticsExtractor> = LazyLock::new(StatisticsExtractor::new);

/// One topic's statistics as reported in a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservedStat {
    pub topic: String,
    pub message_count: u64,
    /// Observed frequency in Hz. NaN when the monitor reported `nan`.
    pub frequency: f64,
}

impl ObservedStat {
    pub fn new(topic: &str, message_count: u64, frequency: f64) -> Self {
        Self {
            topic: topic.to_string(),
            message_count,
            frequency,
        }
    }
}

/// Compiled patterns for pulling statistics out of raw records.
///
/// Create once and reuse across records.
#[derive(Debug, Clone)]
pub struct StatisticsExtractor {
    ansi: Regex,
    block: Regex,
}

impl Default for StatisticsExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsExtractor {
    pub fn new() -> Self {
        Self {
            ansi: Regex::new(ANSI_CSI).expect("ANSI pattern is valid"),
            block: Regex::new(STATISTICS_BLOCK).expect("statistics pattern is valid"),
        }
    }

    /// Remove terminal escape sequences, leaving all other text untouched.
    pub fn strip_escapes(&self, text: &str) -> String {
        self.ansi.replace_all(text, "").into_owned()
    }

    /// Extract every statistics block from `record`, in text order.
    ///
    /// Blocks whose numbers don't parse are skipped. An empty result is not
    /// an error.
    pub fn extract(&self, record: &str) -> Vec<ObservedStat> {
        let cleaned = self.strip_escapes(record);

        let stats: Vec<ObservedStat> = self
            .block
            .captures_iter(&cleaned)
            .filter_map(|caps| {
                let topic = caps[1].trim();
                if topic.is_empty() {
                    return None;
                }
                let message_count = caps[2].parse().ok()?;
                let frequency = parse_frequency(&caps[3])?;
                debug!(
                    "Found topic: {}, count: {}, freq: {}",
                    topic, message_count, frequency
                );
                Some(ObservedStat::new(topic, message_count, frequency))
            })
            .collect();

        if stats.is_empty() {
            debug!("No statistics found. Pattern: {}", self.block.as_str());
            if cleaned.chars().count() > SAMPLE_CHARS {
                let sample: String = cleaned.chars().take(SAMPLE_CHARS).collect();
                debug!("Record sample: {}...", sample);
            } else {
                debug!("Record: {}", cleaned);
            }
        }

        stats
    }
}

/// Extract statistics using a shared default extractor.
pub fn extract_statistics(record: &str) -> Vec<ObservedStat> {
    DEFAULT_EXTRACTOR.extract(record)
}

fn parse_frequency(token: &str) -> Option<f64> {
    if token == "nan" {
        Some(f64::NAN)
    } else {
        token.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = "Statistics for topic /odom\n\
                          Message count = 600, Message frequency = 20.01\n";

    #[test]
    fn test_extract_single_block() {
        let stats = extract_statistics(RECORD);
        assert_eq!(stats, vec![ObservedStat::new("/odom", 600, 20.01)]);
    }

    #[test]
    fn test_extract_nan_frequency() {
        let stats = extract_statistics(
            "Statistics for topic /gps/fix\nMessage count = 0, Message frequency = nan",
        );
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].topic, "/gps/fix");
        assert_eq!(stats[0].message_count, 0);
        assert!(stats[0].frequency.is_nan());
    }

    #[test]
    fn test_extract_multiple_blocks_in_order() {
        let record = "[INFO] [rosbag_checker_live]: report\n\
                      Statistics for topic /a\n\
                      Message count = 1, Message frequency = 1.0\n\
                      Statistics for topic /b\n\
                      Message count = 2, Message frequency = 2.0\n\
                      Statistics for topic /c\n\
                      Message count = 3, Message frequency = 3.0\n";

        let topics: Vec<String> = extract_statistics(record).into_iter().map(|s| s.topic).collect();
        assert_eq!(topics, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_escape_sequences_are_transparent() {
        let colored = "\x1b[32mStatistics for topic /odom\x1b[0m\n\
                       Message count = \x1b[1;33m600\x1b[0m, Message frequency = 20.01\x1b[K\n";

        assert_eq!(extract_statistics(colored), extract_statistics(RECORD));
    }

    #[test]
    fn test_strip_is_idempotent_and_lossless() {
        let extractor = StatisticsExtractor::new();
        let text = "plain [brackets] and ~tilde~ \x1b[31mred\x1b[0m";

        let once = extractor.strip_escapes(text);
        assert_eq!(once, "plain [brackets] and ~tilde~ red");
        assert_eq!(extractor.strip_escapes(&once), once);
        assert_eq!(extractor.strip_escapes(RECORD), RECORD);
    }

    #[test]
    fn test_topic_name_is_trimmed() {
        let stats = extract_statistics(
            "Statistics for topic   /imu/data  \r\nMessage count = 10, Message frequency = 99.5",
        );
        assert_eq!(stats[0].topic, "/imu/data");
    }

    #[test]
    fn test_malformed_blocks_are_skipped() {
        let record = "Statistics for topic /split\n\n\
                      Message count = 1, Message frequency = 1.0\n\
                      Statistics for topic /negative\n\
                      Message count = -1, Message frequency = 1.0\n\
                      Statistics for topic /dotted\n\
                      Message count = 5, Message frequency = 1.2.3\n\
                      Statistics for topic /good\n\
                      Message count = 5, Message frequency = 12\n";

        let stats = extract_statistics(record);
        assert_eq!(stats, vec![ObservedStat::new("/good", 5, 12.0)]);
    }

    #[test]
    fn test_no_statistics_yields_empty() {
        assert!(extract_statistics("").is_empty());
        assert!(extract_statistics("[WARN] nothing to see here").is_empty());
    }
}
