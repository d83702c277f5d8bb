use chatbox_core::{ChatController, HttpResponder, KeyValueStore, ResponderError, StoreError};
use ratatui::layout::Rect;
use tokio::task::{JoinError, JoinSet};

use crate::surface::TuiSurface;

pub type Chat = ChatController<HttpResponder, Box<dyn KeyValueStore>, TuiSurface>;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub chat: Chat,
    pub endpoint: String,

    // Responder calls currently running, one per submitted turn
    pub turns: JoinSet<Result<String, ResponderError>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub send_area: Option<Rect>,
}

impl App {
    pub fn new(chat: Chat, endpoint: String) -> Self {
        Self {
            should_quit: false,
            chat,
            endpoint,
            turns: JoinSet::new(),
            animation_frame: 0,
            chat_area: None,
            send_area: None,
        }
    }

    /// Start a turn from the input box and hand the responder call to a task.
    pub fn submit(&mut self) {
        if let Some(pending) = self.chat.begin_input_turn() {
            let responder = self.chat.responder();
            self.turns.spawn(async move { pending.run(responder.as_ref()).await });
        }
    }

    /// Apply a finished responder task to the conversation.
    pub fn complete_turn(
        &mut self,
        joined: Result<Result<String, ResponderError>, JoinError>,
    ) -> Result<(), StoreError> {
        let result = joined.unwrap_or_else(|err| Err(ResponderError::Interrupted(err.to_string())));
        self.chat.finish_turn(result)?;
        Ok(())
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.is_typing() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    fn page_rows(&self) -> u16 {
        self.chat_area
            .map(|area| area.height.saturating_sub(2) / 2)
            .unwrap_or(10)
            .max(1)
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.chat.view_mut().scroll_up(rows);
    }

    pub fn scroll_down(&mut self, rows: u16) {
        self.chat.view_mut().scroll_down(rows);
    }

    pub fn scroll_half_page_up(&mut self) {
        let rows = self.page_rows();
        self.scroll_up(rows);
    }

    pub fn scroll_half_page_down(&mut self) {
        let rows = self.page_rows();
        self.scroll_down(rows);
    }
}

/// An app whose responder points at the discard port, so any real call fails fast.
#[cfg(test)]
pub(crate) fn offline_app() -> App {
    use chatbox_core::{MarkupPolicy, MemoryStore};

    let endpoint = "http://127.0.0.1:9".to_string();
    let chat = ChatController::new(
        HttpResponder::new(&endpoint),
        Box::new(MemoryStore::new()) as Box<dyn KeyValueStore>,
        TuiSurface::new(),
        MarkupPolicy::Escaped,
    )
    .unwrap();
    App::new(chat, endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbox_core::Sender;

    fn app() -> App {
        offline_app()
    }

    #[tokio::test]
    async fn test_blank_submit_spawns_nothing() {
        let mut app = app();
        app.chat.input_mut().set_text("   ");
        app.submit();
        assert!(app.turns.is_empty());
        assert!(app.chat.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_submit_then_failed_call_shows_apology() {
        let mut app = app();
        app.chat.input_mut().set_text("hello");
        app.submit();

        assert_eq!(app.turns.len(), 1);
        assert!(app.chat.view().is_typing());
        assert_eq!(app.chat.input().text(), "");

        let joined = app.turns.join_next().await.unwrap();
        app.complete_turn(joined).unwrap();

        let last = app.chat.transcript().last().unwrap();
        assert_eq!(last.sender(), Sender::Bot);
        assert_eq!(last.text(), chatbox_core::APOLOGY);
        assert!(!app.chat.view().is_typing());
    }

    #[tokio::test]
    async fn test_animation_only_runs_while_typing() {
        let mut app = app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
    }
}
