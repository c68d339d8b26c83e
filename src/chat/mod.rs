//! Chat assistant — keyword intents, scripted replies, follow-up effects.

pub mod engine;
pub mod intent;
pub mod replies;

pub use engine::{ChatEngine, ChatEvent, ChatMessage, Role, SendOutcome};
pub use intent::{Intent, IntentClassifier, UserMode};
