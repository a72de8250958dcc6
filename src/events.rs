use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, View};

/// File written by the `e` key.
const EXPORT_FILE: &str = "hzwatch_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // If filter input is active, handle text input
    if app.filter_active {
        handle_filter_input(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char('1') => app.set_view(View::Issues),
        KeyCode::Char('2') => app.set_view(View::Topics),
        KeyCode::Char('3') => app.set_view(View::Rules),

        // Navigation (up/down for items, left/right for tabs)
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        // Esc drops a leftover filter
        KeyCode::Esc => {
            if !app.filter_text.is_empty() {
                app.clear_filter();
            }
        }

        KeyCode::Char('r') => app.reload_rules(),
        KeyCode::Char('c') => app.clear_watch(),
        KeyCode::Char('s') => {
            if app.current_view == View::Topics {
                app.toggle_sort();
            }
        }
        KeyCode::Char('/') => app.start_filter(),
        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_FILE);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while filter is active
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Confirm filter
        KeyCode::Enter => {
            app.filter_active = false;
        }

        // Cancel filter (keep text but exit input mode)
        KeyCode::Esc => {
            app.cancel_filter();
        }

        // Clear and exit
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.clear_filter();
        }

        KeyCode::Backspace => {
            app.filter_pop();
            if app.filter_text.is_empty() {
                app.filter_active = false;
            }
        }

        KeyCode::Char(c) => {
            app.filter_push(c);
        }

        _ => {}
    }
}

/// Handle mouse events.
///
/// The wheel moves the selection and a click on the tab bar switches views.
/// Clicks inside the tables are ignored: once a table scrolls, the screen
/// row no longer maps to a list index.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        MouseEventKind::Down(MouseButton::Left) => {
            // Tab bar is row 1, just under the header
            if mouse.row == 1 {
                // Approximate tab positions: Issues (0-11), Topics (12-23), Rules (24-34)
                let col = mouse.column;
                if col < 12 {
                    app.set_view(View::Issues);
                } else if col < 24 {
                    app.set_view(View::Topics);
                } else if col < 35 {
                    app.set_view(View::Rules);
                }
            }
        }

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ConfigSource;
    use crate::source::ChannelSource;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn test_app() -> App {
        let (_tx, source) = ChannelSource::create("test");
        App::new(
            Box::new(source),
            vec![ConfigSource::inline("rules", "topics:\n  - name: /odom\n    hz_range: [1, 2]\n")],
            "",
        )
    }

    #[test]
    fn test_view_keys() {
        let mut app = test_app();
        handle_key_event(&mut app, key(KeyCode::Char('3')));
        assert_eq!(app.current_view, View::Rules);
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.current_view, View::Issues);
        handle_key_event(&mut app, key(KeyCode::BackTab));
        assert_eq!(app.current_view, View::Rules);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = test_app();
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[test]
    fn test_filter_input_mode() {
        let mut app = test_app();
        handle_key_event(&mut app, key(KeyCode::Char('/')));
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert_eq!(app.filter_text, "q");
        assert!(app.running);

        handle_key_event(&mut app, key(KeyCode::Backspace));
        assert!(!app.filter_active);
        assert!(app.filter_text.is_empty());
    }

    #[test]
    fn test_reload_and_quit_keys() {
        let mut app = test_app();
        handle_key_event(&mut app, key(KeyCode::Char('r')));
        assert!(app.get_status_message().is_some());

        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn test_mouse_wheel_and_tab_clicks() {
        let mut app = test_app();
        app.set_view(View::Rules);
        handle_mouse_event(&mut app, mouse(MouseEventKind::ScrollDown, 5, 10));
        assert_eq!(app.selected_index, 0);

        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 14, 1));
        assert_eq!(app.current_view, View::Topics);
    }

    #[test]
    fn test_click_inside_table_keeps_selection() {
        let (_tx, source) = ChannelSource::create("test");
        let rules = "topics:\n  - name: /a\n    hz_range: [1, 2]\n  - name: /b\n    hz_range: [1, 2]\n  - name: /c\n    hz_range: [1, 2]\n";
        let mut app = App::new(Box::new(source), vec![ConfigSource::inline("rules", rules)], "");
        app.set_view(View::Rules);

        handle_mouse_event(&mut app, mouse(MouseEventKind::ScrollDown, 5, 10));
        handle_mouse_event(&mut app, mouse(MouseEventKind::ScrollDown, 5, 10));
        assert_eq!(app.selected_index, 2);

        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 4));
        assert_eq!(app.selected_index, 2);
        assert_eq!(app.current_view, View::Rules);

        handle_mouse_event(&mut app, mouse(MouseEventKind::ScrollUp, 5, 10));
        assert_eq!(app.selected_index, 1);
    }
}
