//! Plain-text rendering of both controllers' views to a terminal.

use std::io::Write;

use parking_lot::Mutex;
use tracing::debug;

use crate::admin::listing::{DOWNLOAD_LABEL, NO_DOCUMENTS_LABEL, USED_DOCUMENTS_HEADING};
use crate::admin::{AdminView, DocumentTable, ProgressState, ProgressTarget, SelectionEntry};
use crate::api::ClientError;
use crate::chat::{
    ChatTurn, ChatView, InputSlot, InputState, MessageFormatter, PlaceholderId, Sender, SessionMode,
};
use crate::ui::{BannerSink, Tone};

#[derive(Default)]
struct Screen {
    greeting: String,
    /// Text already printed for the live placeholder.
    streamed: Option<(PlaceholderId, String)>,
    /// Answer printed while streaming, so it is not printed twice when recorded.
    last_streamed: Option<String>,
    last_progress: Option<String>,
}

/// Writes chat and admin output as plain lines.
///
/// Streamed answers are printed incrementally: each update prints only the
/// text that was not already on screen, or redraws the answer when formatting
/// changed what was printed.
pub struct TerminalView<W: Write + Send> {
    out: Mutex<W>,
    formatter: MessageFormatter,
    screen: Mutex<Screen>,
}

impl<W: Write + Send> TerminalView<W> {
    /// Render into `out`.
    ///
    /// # Errors
    /// Returns an error if the message formatter cannot be built.
    pub fn new(out: W) -> Result<Self, ClientError> {
        Ok(Self {
            out: Mutex::new(out),
            formatter: MessageFormatter::new()?,
            screen: Mutex::new(Screen::default()),
        })
    }

    /// Consume the view and return the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write(&self, text: &str) {
        let mut out = self.out.lock();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            debug!("Terminal write failed: {e}");
        }
    }

    fn line(&self, text: &str) {
        self.write(&format!("{text}\n"));
    }
}

impl<W: Write + Send> BannerSink for TerminalView<W> {
    fn show_banner(&self, message: &str, tone: Tone) {
        match tone {
            Tone::Info => self.line(&format!("[info] {message}")),
            Tone::Error => self.line(&format!("[error] {message}")),
        }
    }

    // Printed lines cannot be taken back.
    fn hide_banner(&self) {}
}

impl<W: Write + Send> ChatView for TerminalView<W> {
    fn show_greeting(&self, greeting: &str) {
        self.screen.lock().greeting = greeting.to_string();
    }

    fn enter_mode(&self, mode: SessionMode) {
        if mode == SessionMode::Welcome {
            let greeting = self.screen.lock().greeting.clone();
            self.line(&greeting);
        }
    }

    fn clear_messages(&self) {
        {
            let mut screen = self.screen.lock();
            screen.streamed = None;
            screen.last_streamed = None;
        }
        self.line("--- new chat ---");
    }

    fn append_message(&self, _index: usize, turn: &ChatTurn, html: &str, _with_actions: bool) {
        let text = self.formatter.plain_text(html);
        match turn.sender {
            // The operator typed it; it is already on screen.
            Sender::User => {}
            Sender::Ai => {
                let already_shown = self.screen.lock().last_streamed.take();
                if already_shown.as_deref() != Some(text.as_str()) {
                    self.line(&format!("{} {text}", turn.sender.avatar()));
                }
            }
            Sender::AiContext => self.line(&format!("{} {text}", turn.sender.avatar())),
        }
    }

    fn show_typing(&self, id: PlaceholderId) {
        self.screen.lock().streamed = Some((id, String::new()));
        self.write(&format!("{} ", Sender::Ai.avatar()));
    }

    fn update_placeholder(&self, id: PlaceholderId, html: &str) {
        let text = self.formatter.plain_text(html);
        let output = {
            let mut screen = self.screen.lock();
            let Some((live, shown)) = screen.streamed.as_mut() else {
                return;
            };
            if *live != id {
                return;
            }
            let output = if text.starts_with(shown.as_str()) {
                text[shown.len()..].to_string()
            } else {
                // A closing marker rewrote text already on screen: redraw the answer.
                redraw(shown, &text)
            };
            *shown = text;
            output
        };
        if !output.is_empty() {
            self.write(&output);
        }
    }

    fn remove_placeholder(&self, id: PlaceholderId) {
        let shown = {
            let mut screen = self.screen.lock();
            match screen.streamed.take() {
                Some((live, shown)) if live == id => {
                    screen.last_streamed = (!shown.is_empty()).then(|| shown.clone());
                    Some(shown)
                }
                other => {
                    screen.streamed = other;
                    None
                }
            }
        };
        if shown.is_some() {
            self.write("\n");
        }
    }

    fn render_input(&self, slot: InputSlot, state: &InputState) {
        debug!(
            ?slot,
            disabled = state.disabled,
            height = state.height,
            "Input updated"
        );
    }

    fn set_title(&self, title: &str) {
        self.line(&format!("# {title}"));
    }

    fn show_copied(&self, _index: usize, copied: bool) {
        if copied {
            self.line("(copied)");
        }
    }
}

/// Escape sequence that erases the partial answer `shown` and prints `text` in its place.
fn redraw(shown: &str, text: &str) -> String {
    let rows_up = shown.matches('\n').count();
    let home = if rows_up == 0 {
        "\r".to_string()
    } else {
        format!("\x1b[{rows_up}F")
    };
    format!("{home}\x1b[J{} {text}", Sender::Ai.avatar())
}

impl<W: Write + Send> AdminView for TerminalView<W> {
    fn render_selection(&self, entries: &[SelectionEntry]) {
        for entry in entries {
            self.line(&format!("  {}", entry.label()));
        }
    }

    fn show_progress(&self, target: ProgressTarget, state: &ProgressState) {
        let text = state.text();
        {
            let mut screen = self.screen.lock();
            if screen.last_progress.as_deref() == Some(text.as_str()) {
                return;
            }
            screen.last_progress = Some(text.clone());
        }
        debug!(?target, "Progress");
        self.line(&text);
    }

    fn hide_progress(&self, _target: ProgressTarget) {
        self.screen.lock().last_progress = None;
    }

    fn alert(&self, message: &str) {
        self.line(&format!("! {message}"));
    }

    fn render_used_documents(&self, names: &[String]) {
        self.line(USED_DOCUMENTS_HEADING);
        for name in names {
            self.line(&format!("  [{name}]"));
        }
    }

    fn clear_used_documents(&self) {}

    fn render_table(&self, table: &DocumentTable) {
        match table {
            DocumentTable::Empty => self.line(NO_DOCUMENTS_LABEL),
            DocumentTable::Rows(rows) => {
                let width = rows.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
                for row in rows {
                    self.line(&format!(
                        "{:<width$}  {DOWNLOAD_LABEL}: {}",
                        row.name, row.download_url
                    ));
                }
            }
        }
    }
}
