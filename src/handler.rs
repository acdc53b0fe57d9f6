use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, FocusPane, InputMode};
use crate::command::Command;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_pending().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // A blocking notice swallows everything until dismissed
    if app.notice.take().is_some() {
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Command tab selection
        KeyCode::Char('1') => app.select_command(Command::Ask),
        KeyCode::Char('2') => app.select_command(Command::RiskCheck),
        KeyCode::Char('3') => app.select_command(Command::UpdateIssue),
        KeyCode::Char('l') | KeyCode::Right => app.next_command(),
        KeyCode::Char('h') | KeyCode::Left => app.prev_command(),

        // Tab toggles focus between the form and the response pane
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Form => FocusPane::Response,
                FocusPane::Response => FocusPane::Form,
            };
        }

        // Navigation / scrolling based on focus
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Form => {
                if app.command == Command::UpdateIssue {
                    app.issue_field_down();
                }
            }
            FocusPane::Response => app.scroll_response_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Form => {
                if app.command == Command::UpdateIssue {
                    app.issue_field_up();
                }
            }
            FocusPane::Response => app.scroll_response_up(),
        },

        // Enter edits the focused field; Risk Check has none, so it runs
        KeyCode::Enter | KeyCode::Char('i') => {
            if app.focus == FocusPane::Form {
                match app.command {
                    Command::RiskCheck => app.submit(),
                    Command::Ask | Command::UpdateIssue => app.start_editing(),
                }
            }
        }

        // Submit the active form
        KeyCode::Char('s') => app.submit(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => match app.command {
            // Ask sends directly; the issue form advances to the next field
            Command::Ask => app.submit(),
            Command::UpdateIssue => app.issue_field_next_wrapping(),
            Command::RiskCheck => {}
        },
        KeyCode::Backspace => {
            if app.cursor > 0 {
                let cursor = app.cursor - 1;
                if let Some(input) = app.active_input_mut() {
                    let byte_pos = char_to_byte_index(input, cursor);
                    input.remove(byte_pos);
                }
                app.cursor = cursor;
            }
        }
        KeyCode::Delete => {
            let cursor = app.cursor;
            if let Some(input) = app.active_input_mut() {
                if cursor < input.chars().count() {
                    let byte_pos = char_to_byte_index(input, cursor);
                    input.remove(byte_pos);
                }
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app
                .active_input()
                .map(|s| s.chars().count())
                .unwrap_or(0);
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app
                .active_input()
                .map(|s| s.chars().count())
                .unwrap_or(0);
        }
        KeyCode::Char(c) => {
            let cursor = app.cursor;
            if let Some(input) = app.active_input_mut() {
                let byte_pos = char_to_byte_index(input, cursor);
                input.insert(byte_pos, c);
                app.cursor = cursor + 1;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ResponseView;
    use crate::client::AgentClient;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app() -> App {
        App::new(AgentClient::new("http://127.0.0.1:9/"))
    }

    #[test]
    fn number_keys_select_command_tabs() {
        let mut app = test_app();
        handle_key(&mut app, key(KeyCode::Char('3')));
        assert_eq!(app.command, Command::UpdateIssue);
        handle_key(&mut app, key(KeyCode::Char('1')));
        assert_eq!(app.command, Command::Ask);
    }

    #[test]
    fn switching_tabs_twice_restores_form_and_hides_response() {
        let mut app = test_app();
        app.response = ResponseView::Reply("previous".to_string());
        handle_key(&mut app, key(KeyCode::Char('2')));
        handle_key(&mut app, key(KeyCode::Char('1')));
        assert_eq!(app.command, Command::Ask);
        assert_eq!(app.response, ResponseView::Hidden);
    }

    #[test]
    fn notice_swallows_one_key_then_normal_handling_resumes() {
        let mut app = test_app();
        app.notice = Some("Required fields missing: vendor".to_string());
        handle_key(&mut app, key(KeyCode::Char('2')));
        assert!(app.notice.is_none());
        assert_eq!(app.command, Command::Ask, "dismissal key must not act");

        handle_key(&mut app, key(KeyCode::Char('2')));
        assert_eq!(app.command, Command::RiskCheck);
    }

    #[test]
    fn editing_inserts_at_cursor_with_multibyte_text() {
        let mut app = test_app();
        handle_key(&mut app, key(KeyCode::Enter)); // start editing the query
        assert_eq!(app.input_mode, InputMode::Editing);

        for c in "期限は".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Left));
        handle_key(&mut app, key(KeyCode::Char('今')));
        assert_eq!(app.query_input, "期限今は");

        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.query_input, "期限は");
    }

    #[test]
    fn issue_form_enter_advances_and_wraps_fields() {
        let mut app = test_app();
        handle_key(&mut app, key(KeyCode::Char('3')));
        handle_key(&mut app, key(KeyCode::Enter)); // edit category
        assert_eq!(app.input_mode, InputMode::Editing);

        for _ in 0..7 {
            handle_key(&mut app, key(KeyCode::Enter));
        }
        assert_eq!(app.issue_field, 0, "field focus should wrap around");
    }

    #[test]
    fn submitting_blank_query_shows_notice_and_sends_nothing() {
        let mut app = test_app();
        handle_key(&mut app, key(KeyCode::Char('s')));
        assert!(app.notice.is_some());
        assert!(app.pending.is_empty());
    }
}
