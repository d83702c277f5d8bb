use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Ordered, append-only conversation record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Concatenated markup of every entry, in insertion order.
    pub fn render(&self) -> String {
        self.messages.iter().map(Message::render).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    #[test]
    fn test_render_concatenates_in_order() {
        let mut transcript = Transcript::new();
        transcript.push(Message::bot("one"));
        transcript.push(Message::bot("two"));

        let rendered = transcript.render();
        let one = rendered.find("one").unwrap();
        let two = rendered.find("two").unwrap();
        assert!(one < two);
        assert_eq!(rendered, format!("{}{}", Message::bot("one").render(), Message::bot("two").render()));
    }

    #[test]
    fn test_empty_transcript_renders_nothing() {
        assert_eq!(Transcript::new().render(), "");
        assert!(Transcript::new().is_empty());
    }

    #[test]
    fn test_last_returns_latest_entry() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("q", Local::now()));
        transcript.push(Message::bot("a"));
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.last().map(Message::text), Some("a"));
    }
}
