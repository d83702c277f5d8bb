use anyhow::Result;
use chatbox_core::{EditKey, KeyOutcome};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::App;
use crate::tui::AppEvent;

const WHEEL_ROWS: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

/// Translate a terminal key into an input-box edit, if it is one.
///
/// Enter with Shift (or Alt, for terminals that never report Shift on Enter)
/// asks for a line break rather than a send.
pub fn edit_key(key: KeyEvent) -> Option<EditKey> {
    let edit = match key.code {
        KeyCode::Enter => EditKey::Enter {
            newline: key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT),
        },
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => EditKey::Char(c),
        KeyCode::Backspace => EditKey::Backspace,
        KeyCode::Delete => EditKey::Delete,
        KeyCode::Left => EditKey::Left,
        KeyCode::Right => EditKey::Right,
        KeyCode::Home => EditKey::Home,
        KeyCode::End => EditKey::End,
        _ => return None,
    };
    Some(edit)
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => app.should_quit = true,
        KeyCode::Esc => app.should_quit = true,

        // Same as clicking Send
        KeyCode::Char('s') if ctrl => app.submit(),

        // Transcript scrolling
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),

        _ => {
            if let Some(edit) = edit_key(key) {
                if app.chat.handle_key(edit) == KeyOutcome::Submit {
                    app.submit();
                }
            }
        }
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (x, y) = (mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.send_area.is_some_and(|area| point_in_rect(x, y, area)) {
                app.submit();
            }
        }
        MouseEventKind::ScrollUp => {
            if app.chat_area.is_some_and(|area| point_in_rect(x, y, area)) {
                app.scroll_up(WHEEL_ROWS);
            }
        }
        MouseEventKind::ScrollDown => {
            if app.chat_area.is_some_and(|area| point_in_rect(x, y, area)) {
                app.scroll_down(WHEEL_ROWS);
            }
        }
        _ => {}
    }
}
