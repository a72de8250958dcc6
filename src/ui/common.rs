//! Pieces shared by every view: header, tab bar, status line, help overlay
//! and the block/title helpers the tables use.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::duration::format_duration;
use crate::data::TopicStatus;

/// Key bindings shown in the help overlay, by section.
const HELP_SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("←/→ h/l", "Switch views"),
            ("1/2/3", "Issues/Topics/Rules"),
            ("↑/↓ j/k", "Navigate list"),
            ("PgUp/PgDn", "Jump 10 items"),
            ("Home/End", "Jump to first/last"),
        ],
    ),
    (
        "Lists",
        &[
            ("/", "Start filter/search"),
            ("Esc", "Clear filter"),
            ("s", "Failures first (Topics)"),
            ("c", "Clear issue list"),
        ],
    ),
    (
        "General",
        &[
            ("r", "Reload rules"),
            ("e", "Export to JSON"),
            ("q", "Quit"),
        ],
    ),
];

/// Render the header: overall indicator, per-status counts and rule count.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Span::styled(" HZWATCH ", Style::default().add_modifier(Modifier::BOLD));

    if app.last_record_at.is_none() {
        let line = Line::from(vec![
            title,
            Span::raw(format!("| Waiting for statistics from {}...", app.source_description())),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let summary = app.summary();
    let count = |n: usize, status: TopicStatus| {
        if n > 0 {
            Span::styled(n.to_string(), app.theme.status_style(status))
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        }
    };

    let line = Line::from(vec![
        Span::styled(
            " ● ",
            app.theme.status_style(summary.worst().unwrap_or(TopicStatus::Ok)),
        ),
        title,
        Span::raw("│ "),
        count(summary.ok, TopicStatus::Ok),
        Span::raw(" ok "),
        count(summary.ng, TopicStatus::Ng),
        Span::raw(" ng "),
        count(summary.not_found, TopicStatus::ConfigNotFound),
        Span::raw(" not found │ "),
        Span::styled(
            summary.total.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" topics │ {} rules", app.rules().len())),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let views = [View::Issues, View::Topics, View::Rules];
    let titles: Vec<Line> = views
        .iter()
        .enumerate()
        .map(|(i, view)| match view {
            View::Issues => Line::from(format!(" {}:{} ({}) ", i + 1, view.label(), app.watch.len())),
            _ => Line::from(format!(" {}:{} ", i + 1, view.label())),
        })
        .collect();
    let selected = views.iter().position(|v| *v == app.current_view);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab(false))
        .highlight_style(app.theme.tab(true))
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Text of the status line when no temporary message is showing.
pub fn status_line(app: &App) -> String {
    let controls = if app.filter_active {
        "Type to search | Enter:apply Esc:cancel"
    } else {
        match app.current_view {
            View::Issues => "/:search c:clear r:reload e:export ?:help q:quit",
            View::Topics => "/:search s:sort r:reload e:export ?:help q:quit",
            View::Rules => "/:search r:reload ?:help q:quit",
        }
    };

    match (&app.load_error, app.last_record_at) {
        (Some(err), _) => format!(" Error: {} | {}", err, controls),
        (None, Some(at)) => format!(
            " {} issues | last record {} ago | {}",
            app.watch.len(),
            format_duration(at.elapsed()),
            controls,
        ),
        (None, None) => format!(" Waiting... | {}", controls),
    }
}

pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let paragraph = match app.get_status_message() {
        Some(msg) => Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.accent)),
        None => Paragraph::new(status_line(app)).style(Style::default().add_modifier(Modifier::DIM)),
    };
    frame.render_widget(paragraph, area);
}

/// Render the key bindings as a centered modal.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(Span::styled("Keyboard Shortcuts", app.theme.header())),
        Line::from(""),
    ];
    for (section, keys) in HELP_SECTIONS {
        lines.push(Line::from(Span::styled(format!(" {}", section), bold)));
        lines.extend(
            keys.iter()
                .map(|(key, action)| Line::from(format!("  {:<11} {}", key, action))),
        );
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().add_modifier(Modifier::DIM),
    )));

    let height = lines.len() as u16 + 2;
    let help_area = centered(area, 42, height);
    let paragraph = Paragraph::new(lines).block(view_block(app, " Help ".to_string(), app.theme.accent));

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// A `width` x `height` rectangle centered in `area`, shrunk to leave a
/// margin when `area` is too small.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Title suffix describing the filter state.
pub fn filter_info(app: &App) -> String {
    if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [Esc:clear]", app.filter_text)
    } else {
        String::new()
    }
}

/// Title suffix showing the selected position.
pub fn position_info(selected: usize, len: usize) -> String {
    if len == 0 {
        String::new()
    } else {
        format!(" [{}/{}]", selected.min(len - 1) + 1, len)
    }
}

/// Bordered block with the theme's look.
pub fn view_block<'a>(app: &App, title: String, border: Color) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(border))
}
