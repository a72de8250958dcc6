//! Issues view: the topics currently failing validation.

use std::time::Instant;

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::common::{filter_info, position_info, view_block};
use crate::app::App;
use crate::data::duration::format_duration;
use crate::data::TopicStatus;

/// Time since the topic was last reported, as shown in the "Last seen" column.
fn last_seen_label(now: Instant, last_seen: Instant) -> String {
    let elapsed = now.saturating_duration_since(last_seen);
    if elapsed.as_secs() == 0 {
        "now".to_string()
    } else {
        format!("{} ago", format_duration(elapsed))
    }
}

/// Render the watch list as a table.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if app.watch.is_empty() {
        render_healthy_message(frame, app, area);
        return;
    }

    let issues = app.visible_issues();
    let now = Instant::now();

    let header = Row::new(vec![
        Cell::from("Status"),
        Cell::from("Topic"),
        Cell::from("Frequency"),
        Cell::from("Expected"),
        Cell::from("Failing for"),
        Cell::from("Last seen"),
        Cell::from("Matched by"),
    ])
    .height(1)
    .style(app.theme.header());

    let ng_style = app.theme.status_style(TopicStatus::Ng);
    let rows: Vec<Row> = issues
        .iter()
        .map(|watched| {
            let result = &watched.result;
            Row::new(vec![
                Cell::from(app.theme.badge(result.status)),
                Cell::from(result.topic.clone())
                    .style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(result.frequency_label()).style(ng_style),
                Cell::from(result.expected_range_label()),
                Cell::from(format_duration(now.saturating_duration_since(watched.since))),
                Cell::from(last_seen_label(now, watched.last_seen)),
                Cell::from(result.config_source_label())
                    .style(Style::default().add_modifier(Modifier::DIM)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(6),  // Status
        Constraint::Fill(3),    // Topic
        Constraint::Length(10), // Frequency
        Constraint::Length(14), // Expected
        Constraint::Length(12), // Failing for
        Constraint::Length(10), // Last seen
        Constraint::Fill(2),    // Matched by
    ];

    let title = format!(
        " Issues ({} NG){}{} ",
        app.watch.len(),
        filter_info(app),
        position_info(app.selected_index, issues.len())
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(view_block(app, title, app.theme.status.ng))
        .row_highlight_style(app.theme.selected())
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_index.min(issues.len().saturating_sub(1))));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_healthy_message(frame: &mut Frame, app: &App, area: Rect) {
    let detail = if app.last_record_at.is_some() {
        "      Every reported topic is within its expected range."
    } else {
        "      No statistics received yet."
    };

    let lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(vec![
            Span::styled("    ✓ ", Style::default().fg(app.theme.status.ok)),
            Span::styled(
                "No failing topics",
                Style::default().fg(app.theme.status.ok).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            detail,
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let paragraph = Paragraph::new(lines).block(view_block(app, " Issues ".to_string(), app.theme.status.ok));
    frame.render_widget(paragraph, area);
}
