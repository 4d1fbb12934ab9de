//! Append-only conversation history and the context window derived from it.

use super::turn::{ChatTurn, ContextMessage};

/// Number of recent turns sent along with each question.
pub const CONTEXT_WINDOW_TURNS: usize = 6;

/// Ordered record of the user and assistant turns of one session.
#[derive(Clone, Debug, Default)]
pub struct SessionHistory {
    turns: Vec<ChatTurn>,
}

impl SessionHistory {
    /// Create an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Append a turn. Returns `false` (and drops the turn) for senders that are never recorded.
    pub fn push(&mut self, turn: ChatTurn) -> bool {
        if !turn.sender.is_recorded() {
            return false;
        }
        self.turns.push(turn);
        true
    }

    /// Recorded turns in chronological order.
    #[must_use]
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Number of recorded turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// The last `limit` user/assistant turns as wire messages, oldest first.
    #[must_use]
    pub fn context_window(&self, limit: usize) -> Vec<ContextMessage> {
        let messages: Vec<ContextMessage> =
            self.turns.iter().filter_map(ChatTurn::to_context).collect();
        let skip = messages.len().saturating_sub(limit);
        messages.into_iter().skip(skip).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::turn::{Role, Sender};

    fn alternating(n: usize) -> SessionHistory {
        let mut history = SessionHistory::new();
        for i in 0..n {
            let sender = if i % 2 == 0 { Sender::User } else { Sender::Ai };
            history.push(ChatTurn::new(format!("m{i}"), sender));
        }
        history
    }

    #[test]
    fn test_window_keeps_last_six_in_order() {
        let history = alternating(9);
        let window = history.context_window(CONTEXT_WINDOW_TURNS);

        assert_eq!(window.len(), 6);
        let contents: Vec<&str> = window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m4", "m5", "m6", "m7", "m8"]);
        assert_eq!(window[0].role, Role::Assistant);
        assert_eq!(window[1].role, Role::User);
        assert_eq!(window[5].role, Role::User);
    }

    #[test]
    fn test_short_history_is_sent_whole() {
        let history = alternating(2);
        let window = history.context_window(CONTEXT_WINDOW_TURNS);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].content, "m0");
    }

    #[test]
    fn test_context_turns_are_not_recorded() {
        let mut history = SessionHistory::new();
        assert!(!history.push(ChatTurn::new("tip", Sender::AiContext)));
        assert!(history.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut history = alternating(4);
        history.clear();
        assert!(history.is_empty());
        assert!(history.context_window(CONTEXT_WINDOW_TURNS).is_empty());
    }
}
