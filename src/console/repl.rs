//! Line-oriented chat loop.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::api::{ChatApi, ClientError};
use crate::chat::{Capability, ChatSession, ChatView, Key, KeyPress, SendOutcome};

/// Help text shown at startup and on `/help`.
pub const HELP: &str = "Commands: /new starts a new chat, /copy copies the last answer, \
/cap <tag> asks a capability prompt, /help shows this text, /quit (or /exit) leaves. \
End a line with \\ to continue on the next one.";

/// What a line of input asks for.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Quit,
    NewChat,
    Copy,
    Help,
    Capability(&'a str),
    /// Text that continues on the next line.
    Continued(&'a str),
    Message(&'a str),
}

fn parse_line(line: &str) -> Line<'_> {
    match line.trim() {
        "/quit" | "/exit" => Line::Quit,
        "/new" => Line::NewChat,
        "/copy" => Line::Copy,
        "/help" => Line::Help,
        trimmed => {
            if let Some(tag) = trimmed.strip_prefix("/cap ") {
                Line::Capability(tag.trim())
            } else if let Some(text) = line.strip_suffix('\\') {
                Line::Continued(text)
            } else {
                Line::Message(line)
            }
        }
    }
}

/// Read lines from `input` and drive `session` until `/quit` or end of input.
///
/// # Errors
/// Returns an error if reading the input fails.
pub async fn run<C, V, R>(session: &ChatSession<C, V>, input: R) -> Result<(), ClientError>
where
    C: ChatApi + 'static,
    V: ChatView + 'static,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut draft = String::new();

    while let Some(line) = lines.next_line().await? {
        let slot = session.active_slot();
        match parse_line(&line) {
            Line::Quit => break,
            Line::NewChat => {
                draft.clear();
                session.new_chat();
            }
            Line::Copy => copy_last_answer(session),
            Line::Help => session.show_notice(HELP),
            Line::Capability(tag) => {
                if session.apply_capability(tag).is_some() {
                    report(session.send(slot).await);
                } else {
                    let tags: Vec<&str> = Capability::ALL.iter().map(|c| c.tag()).collect();
                    session.show_notice(&format!("Unknown capability. Try: {}", tags.join(", ")));
                }
            }
            Line::Continued(text) => {
                draft.push_str(text);
                draft.push('\n');
                session.set_input(slot, &draft);
                let shift_enter = KeyPress {
                    key: Key::Enter,
                    shift: true,
                };
                session.handle_key(slot, shift_enter).await;
            }
            Line::Message(text) => {
                draft.push_str(text);
                session.set_input(slot, &draft);
                draft.clear();
                if let Some(outcome) = session.handle_key(slot, KeyPress::enter()).await {
                    report(outcome);
                }
            }
        }
    }

    Ok(())
}

fn copy_last_answer<C, V>(session: &ChatSession<C, V>)
where
    C: ChatApi + 'static,
    V: ChatView + 'static,
{
    match session.last_answer_index() {
        Some(index) => {
            if let Err(e) = session.copy_message(index) {
                warn!("Copy failed: {e}");
            }
        }
        None => session.show_notice("Nothing to copy yet."),
    }
}

fn report(outcome: SendOutcome) {
    match outcome {
        SendOutcome::Answered(answer) => debug!("Answered with {} chars", answer.len()),
        other => debug!("Send finished: {other:?}"),
    }
}
