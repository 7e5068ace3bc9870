use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use sqlagent_core::{Effect, Event, SqlAgent};

use crate::app::{App, BackendHealth};
use crate::tui::{AppEvent, EventSender};

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent, tx: &EventSender) {
    match event {
        AppEvent::Key(key) => handle_key(app, key, tx),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        // The main loop redraws after every event
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::TurnResolved(outcome) => {
            tracing::info!(outcome = outcome.kind(), "turn finished");
            app.dispatch(Event::Resolved(outcome));
        }
        AppEvent::HealthChecked(result) => {
            app.health = match result {
                Ok(status) => BackendHealth::from_status(status),
                Err(e) => {
                    tracing::warn!(error = %e, "health check failed");
                    BackendHealth::Down(e.to_string())
                }
            };
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent, tx: &EventSender) {
    // Global keys
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => submit(app, tx),

        // Transcript scrolling works even while waiting
        KeyCode::PageUp => app.scroll_page_up(),
        KeyCode::PageDown => app.scroll_page_down(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::End if key.modifiers.contains(KeyModifiers::CONTROL) => app.scroll_to_bottom(),

        // The input line is disabled while a turn is in flight
        _ if !app.can_edit() => {}
        code => edit_input(app, code),
    }
}

/// Starts a turn if the input is non-blank and nothing is in flight.
fn submit(app: &mut App, tx: &EventSender) {
    for effect in app.dispatch(Event::Submit) {
        match effect {
            Effect::SendMessage(question) => {
                tracing::debug!(question = %question, "turn started");
                let client = app.client.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let outcome = client.ask(&question).await;
                    let _ = tx.send(AppEvent::TurnResolved(outcome));
                });
            }
        }
    }
}

fn edit_input(app: &mut App, code: KeyCode) {
    let mut input = app.input().to_string();
    let char_count = input.chars().count();
    let cursor = app.input_cursor.min(char_count);

    let cursor = match code {
        KeyCode::Backspace if cursor > 0 => {
            input.remove(char_to_byte_index(&input, cursor - 1));
            cursor - 1
        }
        KeyCode::Delete if cursor < char_count => {
            input.remove(char_to_byte_index(&input, cursor));
            cursor
        }
        KeyCode::Left => cursor.saturating_sub(1),
        KeyCode::Right => (cursor + 1).min(char_count),
        KeyCode::Home => 0,
        KeyCode::End => char_count,
        KeyCode::Char(c) => {
            input.insert(char_to_byte_index(&input, cursor), c);
            cursor + 1
        }
        _ => return,
    };

    if input != app.input() {
        app.dispatch(Event::InputChanged(input));
    }
    app.input_cursor = cursor;
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}
