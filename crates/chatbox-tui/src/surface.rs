//! Display surfaces for the chat controller
//!
//! [`TuiSurface`] keeps the styled lines for each transcript entry plus the
//! scroll state of the chat pane. [`PrintSurface`] writes entries to stdout
//! for the headless subcommands.

use chatbox_core::markup::segments;
use chatbox_core::{ChatSurface, Message, Segment, Sender, Transcript};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

fn segment_style(segment: &Segment) -> Style {
    let mut style = Style::default();
    if segment.strong {
        style = style.add_modifier(Modifier::BOLD);
    }
    if segment.code {
        style = style.fg(Color::Green).bg(Color::Black);
    }
    style
}

/// Entry markup as styled terminal lines, split on embedded newlines.
pub fn markup_lines(markup: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();

    for segment in segments(markup) {
        let style = segment_style(&segment);
        let mut parts = segment.text.split('\n');

        if let Some(first) = parts.next() {
            if !first.is_empty() {
                current.push(Span::styled(first.to_string(), style));
            }
        }
        for part in parts {
            lines.push(Line::from(std::mem::take(&mut current)));
            if !part.is_empty() {
                current.push(Span::styled(part.to_string(), style));
            }
        }
    }

    lines.push(Line::from(current));
    lines
}

/// Plain text of an entry, styling dropped.
pub fn plain_text(message: &Message) -> String {
    segments(message.text()).into_iter().map(|s| s.text).collect()
}

fn entry_lines(message: &Message) -> Vec<Line<'static>> {
    let header = match message.sender() {
        Sender::User => {
            let mut spans = vec![Span::styled(
                "You",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )];
            if let Some(time) = message.time_label() {
                spans.push(Span::styled(format!("  {}", time), Style::default().fg(Color::DarkGray)));
            }
            Line::from(spans)
        }
        Sender::Bot => Line::from(Span::styled(
            "Bot",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    };

    let mut lines = vec![header];
    lines.extend(markup_lines(message.text()));
    lines.push(Line::default());
    lines
}

#[derive(Debug, Default)]
pub struct TuiSurface {
    entries: Vec<Vec<Line<'static>>>,
    typing: bool,
    scroll: u16,
    stick_to_bottom: bool,
}

impl TuiSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line<'static>> {
        self.entries.iter().flatten()
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.scroll = self.scroll.saturating_sub(rows);
        self.stick_to_bottom = false;
    }

    pub fn scroll_down(&mut self, rows: u16) {
        self.scroll = self.scroll.saturating_add(rows);
    }

    /// Settle the scroll offset once the pane's content and size are known.
    ///
    /// Reaching the bottom, by request or by scrolling, keeps the view pinned
    /// there as new entries arrive.
    pub fn fit(&mut self, content_rows: u16, viewport_rows: u16) {
        let max_scroll = content_rows.saturating_sub(viewport_rows);
        if self.stick_to_bottom || self.scroll >= max_scroll {
            self.scroll = max_scroll;
            self.stick_to_bottom = true;
        }
    }
}

impl ChatSurface for TuiSurface {
    fn show_transcript(&mut self, transcript: &Transcript) {
        self.entries = transcript.messages().iter().map(entry_lines).collect();
    }

    fn append(&mut self, message: &Message) {
        self.entries.push(entry_lines(message));
    }

    fn set_typing(&mut self, active: bool) {
        self.typing = active;
    }

    fn scroll_to_bottom(&mut self) {
        self.stick_to_bottom = true;
    }
}

/// Prints entries to stdout. Used by `send` and `history`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintSurface {
    /// Print restored history on startup.
    pub history: bool,
    /// Print raw markup instead of plain text.
    pub markup: bool,
}

impl PrintSurface {
    fn print(&self, message: &Message) {
        if self.markup {
            println!("{}", message.render());
            return;
        }

        match (message.sender(), message.time_label()) {
            (Sender::User, Some(time)) => println!("[{}] you: {}", time, plain_text(message)),
            (Sender::User, None) => println!("you: {}", plain_text(message)),
            (Sender::Bot, _) => println!("bot: {}", plain_text(message)),
        }
    }
}

impl ChatSurface for PrintSurface {
    fn show_transcript(&mut self, transcript: &Transcript) {
        if self.history {
            for message in transcript.messages() {
                self.print(message);
            }
        }
    }

    fn append(&mut self, message: &Message) {
        // The user already knows what they sent.
        if message.sender() == Sender::Bot {
            self.print(message);
        }
    }

    fn set_typing(&mut self, _active: bool) {}

    fn scroll_to_bottom(&mut self) {}
}
