//! Rules view: loaded rules in the order they are consulted.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use super::common::{filter_info, position_info, view_block};
use crate::app::App;

/// Render the rule table, with load issues underneath when there are any.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (table_area, issues_area) = if app.rule_issues.is_empty() {
        (area, None)
    } else {
        let height = (app.rule_issues.len() as u16 + 2).min(area.height / 3);
        let [top, bottom] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(height)]).areas(area);
        (top, Some(bottom))
    };

    let rules = app.visible_rules();

    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("Kind"),
        Cell::from("Name / Pattern"),
        Cell::from("Range"),
        Cell::from("Origin"),
    ])
    .height(1)
    .style(app.theme.header());

    let rows: Vec<Row> = rules
        .iter()
        .enumerate()
        .map(|(i, rule)| {
            Row::new(vec![
                Cell::from((i + 1).to_string()),
                Cell::from(rule.kind).style(Style::default().add_modifier(Modifier::DIM)),
                Cell::from(rule.name.clone()),
                Cell::from(rule.range.to_string()),
                Cell::from(rule.origin.clone()).style(Style::default().add_modifier(Modifier::DIM)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(4),  // #
        Constraint::Length(8),  // Kind
        Constraint::Fill(3),    // Name
        Constraint::Length(14), // Range
        Constraint::Fill(2),    // Origin
    ];

    let title = format!(
        " Rules ({} loaded){}{} ",
        app.rules().len(),
        filter_info(app),
        position_info(app.selected_index, rules.len())
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(view_block(app, title, app.theme.border))
        .row_highlight_style(app.theme.selected())
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_index.min(rules.len().saturating_sub(1))));
    frame.render_stateful_widget(table, table_area, &mut state);

    if let Some(issues_area) = issues_area {
        let lines: Vec<Line> = app.rule_issues.iter().map(|e| Line::from(e.to_string())).collect();
        let title = format!(" Load issues ({}) ", app.rule_issues.len());
        let paragraph = Paragraph::new(lines)
            .style(Style::default().fg(app.theme.status.not_found))
            .wrap(Wrap { trim: true })
            .block(view_block(app, title, app.theme.status.not_found));
        frame.render_widget(paragraph, issues_area);
    }
}
