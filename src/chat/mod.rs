//! Chat widget: conversation state, streaming answers and message rendering.
//!
//! - Session modes (welcome screen / conversation)
//! - Append-only history and the context window sent with each question
//! - Incremental decoding and inline markdown of streamed answers
//! - Input sizing, capability shortcuts and the greeting

pub mod decode;
pub mod format;
pub mod history;
pub mod input;
pub mod prompts;
pub mod session;
pub mod turn;

pub use format::MessageFormatter;
pub use history::{CONTEXT_WINDOW_TURNS, SessionHistory};
pub use input::{InputSlot, InputState, Key, KeyPress};
pub use prompts::Capability;
pub use session::{ChatSession, ChatView, PlaceholderId, SendOutcome};
pub use turn::{ChatTurn, ContextMessage, Role, Sender, SessionId, SessionMode};
