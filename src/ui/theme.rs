//! Colors and styles for the TUI.
//!
//! Everything a table shows is keyed by [`TopicStatus`]; the rest of the
//! palette is chrome (accent, borders, selection). Light and dark variants
//! are picked from the terminal background.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::block::BorderType;

use crate::data::TopicStatus;

/// One color per topic status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusColors {
    pub ok: Color,
    pub ng: Color,
    pub not_found: Color,
}

impl StatusColors {
    pub fn get(&self, status: TopicStatus) -> Color {
        match status {
            TopicStatus::Ok => self.ok,
            TopicStatus::Ng => self.ng,
            TopicStatus::ConfigNotFound => self.not_found,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub status: StatusColors,
    /// Active tab, headers, help border and status messages.
    pub accent: Color,
    pub border: Color,
    /// Background of the selected row.
    pub selection: Color,
    pub muted: Color,
    pub border_type: BorderType,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            status: StatusColors {
                ok: Color::Green,
                ng: Color::Red,
                not_found: Color::Yellow,
            },
            accent: Color::Cyan,
            border: Color::Gray,
            selection: Color::DarkGray,
            muted: Color::Gray,
            border_type: BorderType::Rounded,
        }
    }

    /// "Not found" is amber rather than yellow.
    pub fn light() -> Self {
        Self {
            status: StatusColors {
                ok: Color::Green,
                ng: Color::Red,
                not_found: Color::Rgb(176, 120, 0),
            },
            accent: Color::Blue,
            border: Color::DarkGray,
            selection: Color::LightBlue,
            muted: Color::DarkGray,
            border_type: BorderType::Rounded,
        }
    }

    /// Pick light or dark from the terminal's background luminance.
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Text style for a status. Failures are bold.
    pub fn status_style(&self, status: TopicStatus) -> Style {
        let style = Style::default().fg(self.status.get(status));
        match status {
            TopicStatus::Ng => style.add_modifier(Modifier::BOLD),
            TopicStatus::Ok | TopicStatus::ConfigNotFound => style,
        }
    }

    /// The short status label as it appears in the first table column.
    pub fn badge(&self, status: TopicStatus) -> Span<'static> {
        Span::styled(status.symbol(), self.status_style(status))
    }

    pub fn header(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn selected(&self) -> Style {
        Style::default().bg(self.selection).add_modifier(Modifier::BOLD)
    }

    pub fn tab(&self, active: bool) -> Style {
        if active {
            self.header()
        } else {
            Style::default().fg(self.muted)
        }
    }

    /// Border color for a view whose worst status is `worst`.
    pub fn border_for(&self, worst: Option<TopicStatus>) -> Color {
        match worst {
            Some(TopicStatus::Ok) | None => self.border,
            Some(status) => self.status.get(status),
        }
    }
}
