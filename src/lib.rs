// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # hzwatch
//!
//! A diagnostic TUI and library for validating topic publish frequencies
//! against configured ranges.
//!
//! A recording monitor periodically logs per-topic statistics blocks:
//!
//! ```text
//! Statistics for topic /odom
//! Message count = 600, Message frequency = 20.0
//! ```
//!
//! This crate extracts those blocks from raw log records, looks each topic up
//! in a set of YAML-configured frequency ranges (exact names or regular
//! expressions), and classifies it as `OK`, `NG` or `Config Not Found`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │(validate)│    │(render) │    │         │ │
//! │  └────┬────┘    └────┬─────┘    └─────────┘    └─────────┘ │
//! │       │              │                                      │
//! │       ▼              ▼                                      │
//! │  ┌─────────┐    ┌─────────┐                                 │
//! │  │ source  │    │  rules  │◀── YAML rule files              │
//! │  │ (input) │    │ (store) │                                 │
//! │  └─────────┘    └─────────┘                                 │
//! │       ▲                                                     │
//! │       └── FileSource | StreamSource | ChannelSource         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`rules`]**: Loading rule files into a [`RuleStore`] and resolving a
//!   topic to its rule (exact match first, then patterns in load order)
//! - **[`data`]**: Statistics extraction, validation, the
//!   [`ValidationPipeline`] and the watch list of failing topics
//! - **[`source`]**: Record source abstraction ([`RecordSource`] trait) with
//!   implementations for file polling, TCP streams, and channel-based input
//! - **[`app`]**: Application state, view navigation, and user interaction logic
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`settings`]**: Layered settings (defaults, file, environment)
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a dump file, validating against two rule files
//! hzwatch --file statistics.log --rules ecu0.yaml --rules ecu1.yaml
//!
//! # Follow JSON log records over TCP, logging only
//! hzwatch --connect localhost:9090 --headless
//! ```
//!
//! ### As a library
//!
//! ```
//! use hzwatch::{ConfigSource, RuleStore, TopicStatus, ValidationPipeline};
//!
//! let yaml = "topics:\n  - name: /odom\n    hz_range: [10, 30]\n";
//! let report = RuleStore::load(&[ConfigSource::inline("rules", yaml)]);
//!
//! let record = "Statistics for topic /odom\nMessage count = 600, Message frequency = 5.0\n";
//! let results = ValidationPipeline::new().process(record, &report.store);
//!
//! assert_eq!(results[0].status, TopicStatus::Ng);
//! assert_eq!(results[0].config_source_label(), "exact match: /odom");
//! ```
//!
//! ### As a library with channel source (for message bus integration)
//!
//! ```
//! use hzwatch::{App, ChannelSource, LogRecord};
//!
//! let (tx, source) = ChannelSource::create("rosout");
//! let mut app = App::new(Box::new(source), Vec::new(), "rosbag_checker_live");
//!
//! tx.try_send(LogRecord::from_node(
//!     "rosbag_checker_live",
//!     "Statistics for topic /odom\nMessage count = 1, Message frequency = 1.0",
//! ))
//! .unwrap();
//! assert_eq!(app.process_pending(), 1);
//! ```
//!
//! ### Bridging from a byte stream
//!
//! ```no_run
//! use hzwatch::StreamSource;
//! use tokio::sync::mpsc;
//!
//! # tokio_test::block_on(async {
//! let (tx, rx) = mpsc::channel::<Vec<u8>>(16);
//! let source = StreamSource::from_bytes_channel(rx, "bridge");
//! # });
//! ```

pub mod app;
pub mod data;
pub mod error;
pub mod events;
pub mod rules;
pub mod settings;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, ExportReport, View};
pub use data::{
    extract_statistics, ObservedStat, ResultSummary, StatisticsExtractor, TopicStatus,
    ValidationPipeline, ValidationResult, WatchList,
};
pub use error::RuleLoadError;
pub use rules::{ConfigSource, FrequencyRange, LoadReport, MatchSource, RuleStore, SharedRules};
pub use source::{ChannelSource, FileSource, LogRecord, RecordSource, StreamSource};
