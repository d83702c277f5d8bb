//! The chat controller
//!
//! One controller drives one conversation. It owns the transcript and the
//! input buffer and talks to three injected collaborators: a [`Responder`]
//! for replies, a [`KeyValueStore`] for history, and a [`ChatSurface`] that
//! mirrors state changes onto whatever is displaying them.
//!
//! A turn is split in two so an event loop can keep drawing while the
//! responder works: [`ChatController::begin_turn`] does everything up to the
//! network call and hands back a [`PendingTurn`]; the caller runs it wherever
//! it likes and feeds the result to [`ChatController::finish_turn`].
//! [`ChatController::submit`] does all three in one go. Turns may overlap;
//! entries land in completion order.

use chrono::Local;
use std::sync::Arc;

use crate::input::{EditKey, InputBuffer, KeyOutcome};
use crate::markup::{format_reply, format_user_text, MarkupPolicy};
use crate::message::Message;
use crate::responder::{Responder, ResponderError};
use crate::store::{load_transcript, save_transcript, KeyValueStore, StoreError};
use crate::transcript::Transcript;

/// Whatever shows the conversation to the user
pub trait ChatSurface {
    /// Replace everything shown with `transcript` (used for restored history).
    fn show_transcript(&mut self, transcript: &Transcript);
    fn append(&mut self, message: &Message);
    fn set_typing(&mut self, active: bool);
    fn scroll_to_bottom(&mut self);
}

/// How a finished turn went, from the user's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Replied,
    Failed,
}

/// A submitted message waiting on the responder
#[derive(Debug, Clone)]
pub struct PendingTurn {
    message: String,
    policy: MarkupPolicy,
}

impl PendingTurn {
    /// The trimmed text that will be sent.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Ask the responder and format its reply into entry markup.
    pub async fn run<R: Responder + ?Sized>(self, responder: &R) -> Result<String, ResponderError> {
        let raw = responder.reply(&self.message).await?;
        Ok(format_reply(&raw, self.policy))
    }
}

pub struct ChatController<R, S, V> {
    responder: Arc<R>,
    store: S,
    view: V,
    transcript: Transcript,
    input: InputBuffer,
    policy: MarkupPolicy,
    in_flight: usize,
}

impl<R, S, V> ChatController<R, S, V>
where
    R: Responder,
    S: KeyValueStore,
    V: ChatSurface,
{
    /// Build a controller and restore any stored history onto the surface.
    pub fn new(responder: R, store: S, mut view: V, policy: MarkupPolicy) -> Result<Self, StoreError> {
        let transcript = match load_transcript(&store)? {
            Some(transcript) => {
                tracing::info!(entries = transcript.len(), "restored chat history");
                view.show_transcript(&transcript);
                view.scroll_to_bottom();
                transcript
            }
            None => Transcript::new(),
        };

        Ok(Self {
            responder: Arc::new(responder),
            store,
            view,
            transcript,
            input: InputBuffer::new(),
            policy,
            in_flight: 0,
        })
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputBuffer {
        &mut self.input
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn responder(&self) -> Arc<R> {
        Arc::clone(&self.responder)
    }

    pub fn is_typing(&self) -> bool {
        self.in_flight > 0
    }

    pub fn turns_in_flight(&self) -> usize {
        self.in_flight
    }

    /// Route a key to the input buffer.
    ///
    /// Returns [`KeyOutcome::Submit`] for a bare Enter; the caller decides how
    /// to run the turn (see [`begin_input_turn`](Self::begin_input_turn)).
    pub fn handle_key(&mut self, key: EditKey) -> KeyOutcome {
        self.input.handle_key(key)
    }

    /// Start a turn from whatever is in the input buffer.
    pub fn begin_input_turn(&mut self) -> Option<PendingTurn> {
        if self.input.is_blank() {
            return None;
        }
        let raw = self.input.text().to_string();
        self.begin_turn(&raw)
    }

    /// Everything up to the network call.
    ///
    /// Returns `None`, touching nothing, when `raw` is blank after trimming.
    pub fn begin_turn(&mut self, raw: &str) -> Option<PendingTurn> {
        let message = raw.trim();
        if message.is_empty() {
            return None;
        }

        let entry = Message::user(format_user_text(message, self.policy), Local::now());
        self.push(entry);

        self.in_flight += 1;
        self.view.set_typing(true);
        self.view.scroll_to_bottom();

        self.input.clear();

        tracing::debug!(chars = message.chars().count(), in_flight = self.in_flight, "turn started");
        Some(PendingTurn {
            message: message.to_string(),
            policy: self.policy,
        })
    }

    /// Everything after the network call.
    ///
    /// A reply is appended and the transcript saved; a failure of any kind
    /// becomes the apology entry. The typing indicator is updated either way.
    /// Only a storage failure is returned as an error.
    pub fn finish_turn(&mut self, result: Result<String, ResponderError>) -> Result<TurnOutcome, StoreError> {
        let outcome = match result {
            Ok(markup) => {
                self.push(Message::bot(markup));
                save_transcript(&mut self.store, &self.transcript).map(|_| TurnOutcome::Replied)
            }
            Err(err) => {
                tracing::warn!(error = %err, "responder call failed");
                self.push(Message::apology());
                Ok(TurnOutcome::Failed)
            }
        };

        self.in_flight = self.in_flight.saturating_sub(1);
        self.view.set_typing(self.is_typing());

        outcome
    }

    /// Run a whole turn for `raw`. `Ok(None)` means the text was blank.
    pub async fn submit(&mut self, raw: &str) -> Result<Option<TurnOutcome>, StoreError> {
        let Some(pending) = self.begin_turn(raw) else {
            return Ok(None);
        };

        let responder = Arc::clone(&self.responder);
        let result = pending.run(responder.as_ref()).await;
        self.finish_turn(result).map(Some)
    }

    /// Run a whole turn from the input buffer. This is the external submit hook.
    pub async fn submit_input(&mut self) -> Result<Option<TurnOutcome>, StoreError> {
        let raw = self.input.text().to_string();
        self.submit(&raw).await
    }

    fn push(&mut self, message: Message) {
        self.view.append(&message);
        self.transcript.push(message);
        self.view.scroll_to_bottom();
    }
}
