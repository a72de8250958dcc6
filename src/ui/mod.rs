//! Terminal UI rendering using ratatui.
//!
//! Each view is implemented in its own submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`issues`]: Topics currently failing validation (the watch list)
//! - [`topics`]: Every result from the latest record
//! - [`rules`]: Loaded rules in resolution order, plus load issues
//! - [`common`]: Shared components (header, tabs, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ View Content                         │
//! │ (issues/topics/rules::render)        │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlay rendered on top:
//!    - common::render_help
//! ```

pub mod common;
pub mod issues;
pub mod rules;
pub mod theme;
pub mod topics;

use ratatui::{
    layout::{Constraint, Layout},
    Frame,
};

use crate::app::{App, View};

pub use theme::Theme;

/// Draw the whole screen for the current state.
pub fn draw(frame: &mut Frame, app: &App) {
    let [header, tabs, content, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    common::render_header(frame, app, header);
    common::render_tabs(frame, app, tabs);

    match app.current_view {
        View::Issues => issues::render(frame, app, content),
        View::Topics => topics::render(frame, app, content),
        View::Rules => rules::render(frame, app, content),
    }

    common::render_status_bar(frame, app, status);

    if app.show_help {
        common::render_help(frame, app, frame.area());
    }
}
