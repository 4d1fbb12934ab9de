//! State of the two chat text inputs (welcome screen and bottom bar).

/// Pixel height of one text line in the input.
pub const LINE_HEIGHT: u32 = 24;

/// Which of the two inputs an event came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputSlot {
    /// Input on the welcome screen.
    Main,
    /// Input bar below the message list.
    Bottom,
}

/// A key event delivered to an input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress {
    /// Key that was pressed.
    pub key: Key,
    /// Whether Shift was held.
    pub shift: bool,
}

impl KeyPress {
    /// Plain Enter, no modifier.
    #[must_use]
    pub const fn enter() -> Self {
        Self {
            key: Key::Enter,
            shift: false,
        }
    }

    /// Whether this key press submits the message.
    #[must_use]
    pub const fn submits(&self) -> bool {
        matches!(self.key, Key::Enter) && !self.shift
    }
}

/// Keys the chat input distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    /// Return / Enter.
    Enter,
    /// A printable character.
    Char(char),
    /// Anything else.
    Other,
}

/// Text, sizing and availability of one input together with its send button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputState {
    /// Current text.
    pub text: String,
    /// Disabled while the knowledge base is unavailable.
    pub disabled: bool,
    /// Rendered height in pixels, capped by the configured maximum.
    pub height: u32,
    /// Whether the send button is clickable.
    pub send_enabled: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            text: String::new(),
            disabled: false,
            height: LINE_HEIGHT,
            send_enabled: false,
        }
    }
}

impl InputState {
    /// Replace the text and recompute height and send availability.
    pub fn set_text(&mut self, text: impl Into<String>, max_height: u32) {
        self.text = text.into();
        self.refresh(max_height);
    }

    /// Enable or disable the input.
    pub fn set_disabled(&mut self, disabled: bool, max_height: u32) {
        self.disabled = disabled;
        self.refresh(max_height);
    }

    /// Trimmed text, if there is any to send.
    #[must_use]
    pub fn submission(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty() && !self.disabled).then_some(text)
    }

    fn refresh(&mut self, max_height: u32) {
        self.send_enabled = !self.text.trim().is_empty() && !self.disabled;
        self.height = content_height(&self.text).min(max_height);
    }
}

/// Natural height of `text`: one line per newline-separated row, at least one.
#[must_use]
pub fn content_height(text: &str) -> u32 {
    let lines = u32::try_from(text.split('\n').count()).unwrap_or(u32::MAX);
    lines.max(1).saturating_mul(LINE_HEIGHT)
}
