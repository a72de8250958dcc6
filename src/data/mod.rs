//! Turning raw diagnostic records into classified topic results.
//!
//! ## Submodules
//!
//! - [`extract`]: Stripping terminal escapes and pulling out per-topic
//!   statistics ([`ObservedStat`])
//! - [`validate`]: Classifying a statistic against the rule store
//!   ([`ValidationResult`], [`TopicStatus`])
//! - [`pipeline`]: [`ValidationPipeline`], the record-to-results entry point
//! - [`watchlist`]: Tracking which topics are currently failing across records
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "1s", "500ms")
//!
//! ## Data Flow
//!
//! ```text
//! raw record text
//!        │
//!        ▼
//! StatisticsExtractor::extract()  ──▶ Vec<ObservedStat>
//!        │
//!        ▼
//! validate(stat, &RuleStore)      ──▶ Vec<ValidationResult>
//!        │
//!        └──▶ WatchList::update() (NG topics only)
//! ```

pub mod duration;
pub mod extract;
pub mod pipeline;
pub mod validate;
pub mod watchlist;

pub use extract::{extract_statistics, ObservedStat, StatisticsExtractor};
pub use pipeline::{log_results, ResultSummary, ValidationPipeline};
pub use validate::{validate, TopicStatus, ValidationResult};
pub use watchlist::{reconcile, Reconciliation, WatchList, WatchedTopic};
