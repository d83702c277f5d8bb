//! UI-agnostic conversation entries
//!
//! A [`Message`] is immutable once built. Its `text` is already markup: user
//! text is escaped on the way in, bot text comes out of [`crate::markup`].

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Shown as a bot entry whenever the responder call fails, whatever the cause.
pub const APOLOGY: &str = "Извините, произошла ошибка. Попробуйте еще раз.";

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

/// A single transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    text: String,
    sender: Sender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sent_at: Option<DateTime<Local>>,
}

impl Message {
    /// A user entry stamped with the given wall-clock time.
    pub fn user(text: impl Into<String>, sent_at: DateTime<Local>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            sent_at: Some(sent_at),
        }
    }

    /// A bot entry. Bot entries never carry a timestamp.
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
            sent_at: None,
        }
    }

    pub fn apology() -> Self {
        Self::bot(APOLOGY)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn sent_at(&self) -> Option<DateTime<Local>> {
        self.sent_at
    }

    /// Hour and minute, both zero-padded, 24-hour clock.
    pub fn time_label(&self) -> Option<String> {
        self.sent_at.map(|t| t.format("%H:%M").to_string())
    }

    /// Render this entry as the HTML fragment stored in the transcript.
    pub fn render(&self) -> String {
        let time = match self.time_label() {
            Some(label) => format!("<div class=\"message-time\">{}</div>", label),
            None => String::new(),
        };

        format!(
            "<div class=\"message {}\"><div class=\"message-content\">{}{}</div></div>",
            self.sender.as_str(),
            self.text,
            time
        )
    }
}
