//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::data::{
    log_results, ResultSummary, TopicStatus, ValidationPipeline, ValidationResult, WatchList,
    WatchedTopic,
};
use crate::error::RuleLoadError;
use crate::rules::{ConfigSource, FrequencyRange, RuleStore, SharedRules};
use crate::source::RecordSource;
use crate::ui::Theme;

/// Records handled per call to [`App::process_pending`], so a flooded
/// source cannot stall the UI.
const MAX_RECORDS_PER_TICK: usize = 64;

/// How long a status message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Topics currently failing (the watch list).
    Issues,
    /// Every result from the latest record.
    Topics,
    /// Loaded rules in resolution order.
    Rules,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Issues => View::Topics,
            View::Topics => View::Rules,
            View::Rules => View::Issues,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Issues => View::Rules,
            View::Topics => View::Issues,
            View::Rules => View::Topics,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Issues => "Issues",
            View::Topics => "Topics",
            View::Rules => "Rules",
        }
    }
}

/// One row of the Rules view.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRow {
    pub kind: &'static str,
    pub name: String,
    pub range: FrequencyRange,
    pub origin: String,
}

/// List exact rules (by name) followed by pattern rules (in resolution order).
pub fn rule_rows(store: &RuleStore) -> Vec<RuleRow> {
    let exact = store.exact_rules().map(|r| RuleRow {
        kind: "exact",
        name: r.name.clone(),
        range: r.range,
        origin: r.origin.clone(),
    });
    let patterns = store.pattern_rules().iter().map(|r| RuleRow {
        kind: "pattern",
        name: r.pattern.clone(),
        range: r.range,
        origin: r.origin.clone(),
    });
    exact.chain(patterns).collect()
}

/// JSON report written by `--export` and the `e` key.
#[derive(Debug, Serialize)]
pub struct ExportReport<'a> {
    pub summary: ResultSummary,
    pub target_node: &'a str,
    pub rules_loaded: usize,
    /// Topics on the watch list.
    pub failing: Vec<&'a ValidationResult>,
    pub results: &'a [ValidationResult],
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    // Record source and validation
    source: Box<dyn RecordSource>,
    pipeline: ValidationPipeline,
    rules: SharedRules,
    rule_sources: Vec<ConfigSource>,
    pub rule_issues: Vec<RuleLoadError>,
    pub target_node: String,

    // Results
    pub watch: WatchList,
    pub latest_results: Vec<ValidationResult>,
    pub last_record_at: Option<Instant>,
    pub records_processed: u64,
    pub load_error: Option<String>,

    // Navigation state
    pub selected_index: usize,

    // Sorting (Topics view): worst status first when set
    pub sort_by_status: bool,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App, loading rules from `rule_sources`.
    ///
    /// Only records whose emitter name contains `target_node` are validated;
    /// an empty target accepts every record.
    pub fn new(
        source: Box<dyn RecordSource>,
        rule_sources: Vec<ConfigSource>,
        target_node: impl Into<String>,
    ) -> Self {
        let report = RuleStore::load(&rule_sources);
        report.store.log_summary();

        Self {
            running: true,
            current_view: View::Issues,
            show_help: false,
            source,
            pipeline: ValidationPipeline::new(),
            rules: SharedRules::new(report.store),
            rule_sources,
            rule_issues: report.issues,
            target_node: target_node.into(),
            watch: WatchList::new(),
            latest_results: Vec::new(),
            last_record_at: None,
            records_processed: 0,
            load_error: None,
            selected_index: 0,
            sort_by_status: false,
            filter_text: String::new(),
            filter_active: false,
            theme: Theme::dark(),
            status_message: None,
        }
    }

    /// Use the terminal's background to pick the theme.
    pub fn with_detected_theme(mut self) -> Self {
        self.theme = Theme::auto_detect();
        self
    }

    /// Returns a description of the current record source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Snapshot of the rules in use.
    pub fn rules(&self) -> std::sync::Arc<RuleStore> {
        self.rules.current()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    /// Validate every record waiting in the source.
    ///
    /// Returns the number of records that produced results.
    pub fn process_pending(&mut self) -> usize {
        let store = self.rules.current();
        let mut processed = 0;

        for _ in 0..MAX_RECORDS_PER_TICK {
            let Some(record) = self.source.poll() else {
                break;
            };

            if !record.is_from(&self.target_node) {
                debug!(
                    "Ignoring record from {:?} (target '{}')",
                    record.name, self.target_node
                );
                continue;
            }

            let results = self.pipeline.process(&record.msg, &store);
            if results.is_empty() {
                continue;
            }

            log_results(&results);
            let now = Instant::now();
            self.watch.update(&results, now);
            self.latest_results = results;
            self.last_record_at = Some(now);
            self.records_processed += 1;
            processed += 1;
        }

        self.load_error = self.source.error();
        if processed > 0 {
            self.clamp_selection();
        }
        processed
    }

    /// Re-read every rule source and swap in the new store.
    pub fn reload_rules(&mut self) {
        let report = RuleStore::load(&self.rule_sources);
        report.store.log_summary();

        let count = report.store.len();
        let issues = report.issues.len();
        info!("Reloaded {} rules ({} issues)", count, issues);

        self.rules.replace(report.store);
        self.rule_issues = report.issues;
        self.clamp_selection();
        self.set_status_message(format!("Reloaded {} rules ({} issues)", count, issues));
    }

    /// Forget every topic on the watch list.
    pub fn clear_watch(&mut self) {
        self.watch.clear();
        self.clamp_selection();
        self.set_status_message("Cleared issue list".to_string());
    }

    /// Counts for the latest record's results.
    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_results(&self.latest_results)
    }

    /// Watch list entries passing the filter.
    pub fn visible_issues(&self) -> Vec<&WatchedTopic> {
        self.watch.iter().filter(|t| self.matches_filter(t.topic())).collect()
    }

    /// Latest results passing the filter, in display order.
    pub fn visible_results(&self) -> Vec<&ValidationResult> {
        let mut results: Vec<&ValidationResult> = self
            .latest_results
            .iter()
            .filter(|r| self.matches_filter(&r.topic))
            .collect();
        if self.sort_by_status {
            // Stable sort keeps record order within a status
            results.sort_by_key(|r| std::cmp::Reverse(r.status));
        }
        results
    }

    /// Rules passing the filter, in resolution order.
    pub fn visible_rules(&self) -> Vec<RuleRow> {
        rule_rows(&self.rules.current())
            .into_iter()
            .filter(|r| self.matches_filter(&r.name))
            .collect()
    }

    fn visible_count(&self) -> usize {
        match self.current_view {
            View::Issues => self.visible_issues().len(),
            View::Topics => self.visible_results().len(),
            View::Rules => self.visible_rules().len(),
        }
    }

    fn clamp_selection(&mut self) {
        let max = self.visible_count().saturating_sub(1);
        self.selected_index = self.selected_index.min(max);
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.set_view(self.current_view.prev());
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
        self.selected_index = 0;
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.visible_count().saturating_sub(1);
        self.selected_index = (self.selected_index + n).min(max);
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_index = self.selected_index.saturating_sub(n);
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        self.selected_index = self.visible_count().saturating_sub(1);
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Toggle worst-first ordering in the Topics view.
    pub fn toggle_sort(&mut self) {
        self.sort_by_status = !self.sort_by_status;
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.clamp_selection();
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Check if a topic or rule name matches the current filter.
    pub fn matches_filter(&self, name: &str) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        name.to_lowercase().contains(&self.filter_text.to_lowercase())
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Build the export report for the latest results.
    pub fn export_report(&self) -> ExportReport<'_> {
        ExportReport {
            summary: self.summary(),
            target_node: &self.target_node,
            rules_loaded: self.rules.current().len(),
            failing: self.watch.iter().map(|t| &t.result).collect(),
            results: &self.latest_results,
        }
    }

    /// Export the latest results to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        if self.last_record_at.is_none() {
            anyhow::bail!("No results to export");
        }

        let json = serde_json::to_string_pretty(&self.export_report())?;
        std::fs::write(path, json)?;
        info!("Exported {} results to {}", self.latest_results.len(), path.display());
        Ok(())
    }

    /// True if any topic in the latest record failed validation.
    pub fn has_failures(&self) -> bool {
        self.latest_results.iter().any(|r| r.status == TopicStatus::Ng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ChannelSource, LogRecord};
    use tokio::sync::mpsc::Sender;

    const RULES: &str = r#"
topics:
  - name: /odom
    hz_range: [10, 30]
  - name: /camera\d+/image_raw
    hz_range: [25, 35]
"#;

    fn stats(entries: &[(&str, &str)]) -> String {
        entries
            .iter()
            .map(|(topic, freq)| {
                format!(
                    "Statistics for topic {}\nMessage count = 10, Message frequency = {}\n",
                    topic, freq
                )
            })
            .collect()
    }

    fn test_app() -> (Sender<LogRecord>, App) {
        let (tx, source) = ChannelSource::create("test");
        let app = App::new(
            Box::new(source),
            vec![ConfigSource::inline("rules", RULES)],
            "rosbag_checker_live",
        );
        (tx, app)
    }

    #[test]
    fn test_view_cycle() {
        assert_eq!(View::Issues.next(), View::Topics);
        assert_eq!(View::Rules.next(), View::Issues);
        assert_eq!(View::Issues.prev(), View::Rules);
        assert_eq!(View::Topics.label(), "Topics");
    }

    #[test]
    fn test_process_pending_updates_watch_list() {
        let (tx, mut app) = test_app();

        let msg = stats(&[("/odom", "5.0"), ("/camera0/image_raw", "30.0"), ("/x", "1.0")]);
        tx.try_send(LogRecord::from_node("rosbag_checker_live", msg)).unwrap();

        assert_eq!(app.process_pending(), 1);
        assert_eq!(app.latest_results.len(), 3);
        assert_eq!(app.watch.len(), 1);
        assert!(app.watch.contains("/odom"));
        assert!(app.has_failures());
        assert_eq!(
            app.summary(),
            ResultSummary {
                total: 3,
                ok: 1,
                ng: 1,
                not_found: 1
            }
        );

        // Recovery removes the topic
        tx.try_send(LogRecord::from_node("rosbag_checker_live", stats(&[("/odom", "20")])))
            .unwrap();
        app.process_pending();
        assert!(app.watch.is_empty());
        assert!(!app.has_failures());
    }

    #[test]
    fn test_process_pending_applies_target_filter() {
        let (tx, mut app) = test_app();

        tx.try_send(LogRecord::from_node("other_node", stats(&[("/odom", "1.0")]))).unwrap();
        assert_eq!(app.process_pending(), 0);
        assert!(app.watch.is_empty());

        // Records without a name always pass
        tx.try_send(LogRecord::anonymous(stats(&[("/odom", "1.0")]))).unwrap();
        assert_eq!(app.process_pending(), 1);
        assert_eq!(app.watch.len(), 1);
    }

    #[test]
    fn test_records_without_statistics_keep_previous_results() {
        let (tx, mut app) = test_app();

        tx.try_send(LogRecord::anonymous(stats(&[("/odom", "1.0")]))).unwrap();
        app.process_pending();
        tx.try_send(LogRecord::anonymous("[INFO] nothing to report")).unwrap();
        assert_eq!(app.process_pending(), 0);
        assert_eq!(app.latest_results.len(), 1);
        assert_eq!(app.records_processed, 1);
    }

    #[test]
    fn test_source_error_is_reported() {
        let (tx, mut app) = test_app();
        drop(tx);
        app.process_pending();
        assert_eq!(app.load_error.as_deref(), Some("Channel closed"));
    }

    #[test]
    fn test_reload_rules_picks_up_changes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, RULES.as_bytes()).unwrap();

        let (tx, source) = ChannelSource::create("test");
        let mut app = App::new(Box::new(source), vec![ConfigSource::file(file.path())], "");
        assert_eq!(app.rules().len(), 2);

        std::fs::write(file.path(), "topics:\n  - name: /odom\n    hz_range: [1, 2]\n").unwrap();
        app.reload_rules();
        assert_eq!(app.rules().len(), 1);
        assert!(app.rule_issues.is_empty());
        assert!(app.get_status_message().unwrap().starts_with("Reloaded 1 rules"));

        tx.try_send(LogRecord::anonymous(stats(&[("/odom", "1.5")]))).unwrap();
        app.process_pending();
        assert_eq!(app.latest_results[0].status, TopicStatus::Ok);
    }

    #[test]
    fn test_rule_rows_order() {
        let (_tx, app) = test_app();
        let rows = app.visible_rules();
        let names: Vec<(&str, &str)> = rows.iter().map(|r| (r.kind, r.name.as_str())).collect();
        assert_eq!(
            names,
            vec![("exact", "/odom"), ("pattern", "/camera\\d+/image_raw")]
        );
    }

    #[test]
    fn test_filter_and_selection() {
        let (tx, mut app) = test_app();
        let msg = stats(&[("/odom", "1"), ("/camera0/image_raw", "1"), ("/camera1/image_raw", "1")]);
        tx.try_send(LogRecord::anonymous(msg)).unwrap();
        app.process_pending();

        app.select_last();
        assert_eq!(app.selected_index, 2);
        app.select_next();
        assert_eq!(app.selected_index, 2);

        for c in "CAMERA".chars() {
            app.filter_push(c);
        }
        assert_eq!(app.visible_issues().len(), 2);
        assert_eq!(app.selected_index, 1);

        app.clear_filter();
        app.select_first();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_sort_by_status_puts_failures_first() {
        let (tx, mut app) = test_app();
        let msg = stats(&[("/x", "1"), ("/odom", "20"), ("/camera0/image_raw", "nan")]);
        tx.try_send(LogRecord::anonymous(msg)).unwrap();
        app.process_pending();
        app.set_view(View::Topics);

        app.toggle_sort();
        let order: Vec<&str> = app.visible_results().iter().map(|r| r.topic.as_str()).collect();
        assert_eq!(order, vec!["/camera0/image_raw", "/x", "/odom"]);
    }

    #[test]
    fn test_clear_watch() {
        let (tx, mut app) = test_app();
        tx.try_send(LogRecord::anonymous(stats(&[("/odom", "1")]))).unwrap();
        app.process_pending();
        app.clear_watch();
        assert!(app.watch.is_empty());
    }

    #[test]
    fn test_export_state() {
        let (tx, mut app) = test_app();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        assert!(app.export_state(&path).is_err());

        tx.try_send(LogRecord::anonymous(stats(&[("/odom", "1"), ("/x", "1")]))).unwrap();
        app.process_pending();
        app.export_state(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["summary"]["ng"], 1);
        assert_eq!(json["summary"]["not_found"], 1);
        assert_eq!(json["rules_loaded"], 2);
        assert_eq!(json["failing"][0]["topic"], "/odom");
        assert_eq!(json["results"][1]["config_source"], "N/A");
    }
}
