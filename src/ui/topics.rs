//! Topics view rendering.
//!
//! Displays every result from the latest record, in the order the monitor
//! reported them (or failures first when sorted).

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Cell, Row, Table, TableState},
    Frame,
};

use super::common::{filter_info, position_info, view_block};
use crate::app::App;

/// Render the latest results table.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let results = app.visible_results();
    let summary = app.summary();

    let header = Row::new(vec![
        Cell::from(if app.sort_by_status { "Status↓" } else { "Status" }),
        Cell::from("Topic"),
        Cell::from("Count"),
        Cell::from("Frequency"),
        Cell::from("Expected"),
        Cell::from("Config Source"),
    ])
    .height(1)
    .style(app.theme.header());

    let rows: Vec<Row> = results
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(app.theme.badge(r.status)),
                Cell::from(r.topic.clone()),
                Cell::from(r.message_count.to_string()),
                Cell::from(r.frequency_label()).style(app.theme.status_style(r.status)),
                Cell::from(r.expected_range_label()),
                Cell::from(r.config_source_label())
                    .style(Style::default().add_modifier(Modifier::DIM)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(7),  // Status
        Constraint::Fill(3),    // Topic
        Constraint::Length(8),  // Count
        Constraint::Length(10), // Frequency
        Constraint::Length(14), // Expected
        Constraint::Fill(2),    // Config Source
    ];

    let title = format!(
        " Topics ({} ok, {} ng, {} not found){}{} ",
        summary.ok,
        summary.ng,
        summary.not_found,
        filter_info(app),
        position_info(app.selected_index, results.len())
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(view_block(app, title, app.theme.border_for(summary.worst())))
        .row_highlight_style(app.theme.selected())
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_index.min(results.len().saturating_sub(1))));

    frame.render_stateful_widget(table, area, &mut state);
}
