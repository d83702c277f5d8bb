pub mod config;
pub mod controller;
pub mod input;
pub mod markup;
pub mod message;
pub mod responder;
pub mod store;
pub mod transcript;

// Re-export main types for convenience
pub use config::{Config, ConfigError};
pub use controller::{ChatController, ChatSurface, PendingTurn, TurnOutcome};
pub use input::{EditKey, InputBuffer, KeyOutcome};
pub use markup::{format_reply, MarkupPolicy, Segment};
pub use message::{Message, Sender, APOLOGY};
pub use responder::{HttpResponder, Responder, ResponderError};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use transcript::Transcript;
