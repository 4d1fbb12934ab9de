//! Chat session controller: conversation state and the send, stream, render cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use tracing::{Instrument, debug, info, info_span, warn};

use super::decode::Utf8StreamDecoder;
use super::format::MessageFormatter;
use super::history::SessionHistory;
use super::input::{InputSlot, InputState, KeyPress};
use super::prompts::{Capability, current_greeting};
use super::turn::{ChatTurn, ContextMessage, Sender, SessionId, SessionMode};
use crate::api::{ChatApi, ClientError};
use crate::config::ClientConfig;
use crate::ui::{BannerSink, Clipboard, StatusBanner, Tone};

/// Banner shown when the knowledge base has not been built.
pub const KB_MISSING_STATUS: &str = "Knowledge base not found. Please create it in Admin panel first!";
/// Banner shown when the readiness check cannot reach the backend.
pub const KB_NETWORK_STATUS: &str = "Network error. Please try again!";
/// Banner shown when an answer could not be obtained.
pub const ANSWER_FAILED_STATUS: &str = "Error: Could not get answer. Try again!";

/// Longest session title derived from the first message.
const TITLE_MAX_CHARS: usize = 40;

/// Handle of the transient "typing" placeholder of one request.
pub type PlaceholderId = u64;

/// Rendering surface of the chat.
pub trait ChatView: BannerSink {
    /// Show the greeting on the welcome screen.
    fn show_greeting(&self, greeting: &str);
    /// Switch between the welcome screen and the message list.
    fn enter_mode(&self, mode: SessionMode);
    /// Remove every rendered message.
    fn clear_messages(&self);
    /// Append a finished message; `html` is the formatted text.
    fn append_message(&self, index: usize, turn: &ChatTurn, html: &str, with_actions: bool);
    /// Show the "typing" placeholder.
    fn show_typing(&self, id: PlaceholderId);
    /// Overwrite the placeholder content with the partial answer.
    fn update_placeholder(&self, id: PlaceholderId, html: &str);
    /// Remove the placeholder.
    fn remove_placeholder(&self, id: PlaceholderId);
    /// Reflect the text, height and availability of an input.
    fn render_input(&self, slot: InputSlot, state: &InputState);
    /// Set the title of the current session.
    fn set_title(&self, title: &str);
    /// Toggle the copied confirmation on a message.
    fn show_copied(&self, index: usize, copied: bool);
}

/// Result of a send attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send, or input disabled; nothing happened.
    Rejected,
    /// The full answer was received and recorded.
    Answered(String),
    /// A newer send or a new chat took over; the answer was discarded.
    Superseded,
    /// The request or stream failed; no answer was recorded.
    Failed,
}

#[derive(Clone, Debug)]
struct RenderedMessage {
    sender: Sender,
    html: String,
}

struct ChatState {
    session_id: SessionId,
    mode: SessionMode,
    history: SessionHistory,
    main: InputState,
    bottom: InputState,
    rendered: Vec<RenderedMessage>,
}

impl ChatState {
    fn new() -> Self {
        Self {
            session_id: SessionId::new(),
            mode: SessionMode::Welcome,
            history: SessionHistory::new(),
            main: InputState::default(),
            bottom: InputState::default(),
            rendered: Vec::new(),
        }
    }

    const fn input(&self, slot: InputSlot) -> &InputState {
        match slot {
            InputSlot::Main => &self.main,
            InputSlot::Bottom => &self.bottom,
        }
    }

    fn input_mut(&mut self, slot: InputSlot) -> &mut InputState {
        match slot {
            InputSlot::Main => &mut self.main,
            InputSlot::Bottom => &mut self.bottom,
        }
    }

    const fn active_slot(&self) -> InputSlot {
        match self.mode {
            SessionMode::Welcome => InputSlot::Main,
            SessionMode::Conversation => InputSlot::Bottom,
        }
    }
}

/// Owns one conversation and drives it against a [`ChatApi`].
pub struct ChatSession<C, V> {
    api: Arc<C>,
    view: Arc<V>,
    clipboard: Arc<dyn Clipboard>,
    banner: StatusBanner,
    formatter: MessageFormatter,
    state: Mutex<ChatState>,
    generation: AtomicU64,
    greeting: String,
    context_turns: usize,
    max_input_height: u32,
    copy_confirm: Duration,
}

impl<C, V> ChatSession<C, V>
where
    C: ChatApi + 'static,
    V: ChatView + 'static,
{
    /// Create a session in welcome mode and render the greeting.
    ///
    /// # Errors
    /// Returns an error if the message formatter cannot be built.
    pub fn new(
        api: Arc<C>,
        view: Arc<V>,
        clipboard: Arc<dyn Clipboard>,
        config: &ClientConfig,
    ) -> Result<Self, ClientError> {
        let sink: Arc<dyn BannerSink> = view.clone();
        let session = Self {
            api,
            view,
            clipboard,
            banner: StatusBanner::new(sink, config.banner_timeout),
            formatter: MessageFormatter::new()?,
            state: Mutex::new(ChatState::new()),
            generation: AtomicU64::new(0),
            greeting: current_greeting(),
            context_turns: config.context_window_turns,
            max_input_height: config.max_input_height,
            copy_confirm: config.copy_confirm,
        };

        session.view.show_greeting(&session.greeting);
        session.view.enter_mode(SessionMode::Welcome);
        Ok(session)
    }

    /// Greeting computed at construction.
    #[must_use]
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Current screen.
    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.state.lock().mode
    }

    /// Id of the current session.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.state.lock().session_id
    }

    /// Snapshot of the recorded turns.
    #[must_use]
    pub fn history(&self) -> Vec<ChatTurn> {
        self.state.lock().history.turns().to_vec()
    }

    /// Snapshot of an input.
    #[must_use]
    pub fn input(&self, slot: InputSlot) -> InputState {
        self.state.lock().input(slot).clone()
    }

    /// Input that is visible in the current mode.
    #[must_use]
    pub fn active_slot(&self) -> InputSlot {
        self.state.lock().active_slot()
    }

    /// Ask the backend whether the knowledge base exists and enable or disable input accordingly.
    pub async fn check_knowledge_base(&self) -> bool {
        match self.api.knowledge_base_status().await {
            Ok(status) if status.exists => {
                self.set_disabled(false);
                true
            }
            Ok(_) => {
                warn!("Knowledge base missing; chat disabled");
                self.banner.show(KB_MISSING_STATUS, Tone::Error);
                self.set_disabled(true);
                false
            }
            Err(e) => {
                warn!("Knowledge base check failed: {e}");
                self.banner.show(KB_NETWORK_STATUS, Tone::Error);
                self.set_disabled(true);
                false
            }
        }
    }

    /// Disable or enable both inputs and their send buttons.
    pub fn set_disabled(&self, disabled: bool) {
        let mut state = self.state.lock();
        for slot in [InputSlot::Main, InputSlot::Bottom] {
            let input = state.input_mut(slot);
            input.set_disabled(disabled, self.max_input_height);
            self.view.render_input(slot, input);
        }
    }

    /// Replace the text of an input.
    pub fn set_input(&self, slot: InputSlot, text: &str) {
        let mut state = self.state.lock();
        let input = state.input_mut(slot);
        input.set_text(text, self.max_input_height);
        self.view.render_input(slot, input);
    }

    /// Handle a key press; Enter without Shift sends.
    pub async fn handle_key(&self, slot: InputSlot, key: KeyPress) -> Option<SendOutcome> {
        if key.submits() {
            Some(self.send(slot).await)
        } else {
            None
        }
    }

    /// Fill the active input with the prompt of a capability tag. Unknown tags are ignored.
    pub fn apply_capability(&self, tag: &str) -> Option<Capability> {
        let capability = Capability::from_tag(tag)?;
        let slot = self.active_slot();
        self.set_input(slot, capability.prompt());
        Some(capability)
    }

    /// Show an assistant-side notice that is not part of the conversation history.
    pub fn show_notice(&self, text: &str) {
        let turn = ChatTurn::new(text, Sender::AiContext);
        let mut state = self.state.lock();
        self.render(&mut state, &turn, false);
    }

    /// Send the text of `slot` and stream the answer into the message list.
    pub async fn send(&self, slot: InputSlot) -> SendOutcome {
        let (generation, session_id, window) = {
            let mut state = self.state.lock();
            let Some(text) = state.input(slot).submission().map(str::to_owned) else {
                return SendOutcome::Rejected;
            };

            if state.mode == SessionMode::Welcome {
                state.mode = SessionMode::Conversation;
                self.view.enter_mode(SessionMode::Conversation);
            }

            let turn = ChatTurn::new(text, Sender::User);
            self.record(&mut state, turn, false);

            let input = state.input_mut(slot);
            input.set_text("", self.max_input_height);
            self.view.render_input(slot, input);

            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            self.view.show_typing(generation);
            let window = state.history.context_window(self.context_turns);
            (generation, state.session_id, window)
        };

        let span = info_span!("chat_send", session = %session_id, generation);
        self.stream_answer(generation, &window)
            .instrument(span)
            .await
    }

    async fn stream_answer(
        &self,
        generation: u64,
        window: &[ContextMessage],
    ) -> SendOutcome {
        debug!("Sending {} context turn(s)", window.len());

        let mut stream = match self.api.chat_stream(window).await {
            Ok(stream) => stream,
            Err(e) => return self.fail(generation, &e),
        };

        let mut decoder = Utf8StreamDecoder::new();
        let mut answer = String::new();

        while let Some(chunk) = stream.next().await {
            if self.is_stale(generation) {
                return self.supersede(generation);
            }
            match chunk {
                Ok(bytes) => {
                    answer.push_str(&decoder.push(&bytes));
                    debug!("Received {} byte(s)", bytes.len());
                    self.view
                        .update_placeholder(generation, &self.formatter.format(&answer));
                }
                Err(e) => return self.fail(generation, &e),
            }
        }
        answer.push_str(&decoder.finish());

        // Checked under the state lock; `new_chat` bumps the generation while holding it.
        let recorded = {
            let mut state = self.state.lock();
            if self.is_stale(generation) {
                false
            } else {
                self.view.remove_placeholder(generation);
                self.record(&mut state, ChatTurn::new(answer.clone(), Sender::Ai), true);
                true
            }
        };
        if !recorded {
            return self.supersede(generation);
        }
        info!("Answer received ({} chars)", answer.chars().count());
        SendOutcome::Answered(answer)
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    fn supersede(&self, generation: u64) -> SendOutcome {
        debug!("Discarding superseded answer");
        self.view.remove_placeholder(generation);
        SendOutcome::Superseded
    }

    fn fail(&self, generation: u64, error: &ClientError) -> SendOutcome {
        warn!("Chat request failed: {error}");
        self.view.remove_placeholder(generation);
        if !self.is_stale(generation) {
            self.banner.show(ANSWER_FAILED_STATUS, Tone::Error);
        }
        SendOutcome::Failed
    }

    /// Render a turn and record it in history; the first recorded turn names the session.
    fn record(&self, state: &mut ChatState, turn: ChatTurn, with_actions: bool) {
        self.render(state, &turn, with_actions);

        if turn.sender.is_recorded() && state.history.is_empty() {
            let title: String = turn.text.chars().take(TITLE_MAX_CHARS).collect();
            self.view.set_title(&title);
        }
        state.history.push(turn);
    }

    fn render(&self, state: &mut ChatState, turn: &ChatTurn, with_actions: bool) {
        let html = self.formatter.format(&turn.text);
        let index = state.rendered.len();
        self.view.append_message(index, turn, &html, with_actions);
        state.rendered.push(RenderedMessage {
            sender: turn.sender,
            html,
        });
    }

    /// Reset to the welcome screen with an empty history, whatever the current mode.
    pub fn new_chat(&self) {
        let mut state = self.state.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        state.mode = SessionMode::Welcome;
        state.history.clear();
        state.rendered.clear();
        state.session_id = SessionId::new();

        self.view.clear_messages();
        self.view.enter_mode(SessionMode::Welcome);
        for slot in [InputSlot::Main, InputSlot::Bottom] {
            let input = state.input_mut(slot);
            input.set_text("", self.max_input_height);
            self.view.render_input(slot, input);
        }
        info!(session = %state.session_id, "Started new chat");
    }

    /// Index of the most recent assistant answer in the message list, if any.
    #[must_use]
    pub fn last_answer_index(&self) -> Option<usize> {
        self.state
            .lock()
            .rendered
            .iter()
            .rposition(|m| m.sender == Sender::Ai)
    }

    /// Copy the plain text of rendered message `index` and flash a confirmation.
    ///
    /// # Errors
    /// Returns an error if there is no such message or the clipboard fails.
    pub fn copy_message(&self, index: usize) -> Result<String, ClientError> {
        let html = self
            .state
            .lock()
            .rendered
            .get(index)
            .map(|m| m.html.clone())
            .ok_or_else(|| ClientError::Validation(format!("no message at index {index}")))?;

        let text = self.formatter.plain_text(&html);
        if let Err(e) = self.clipboard.write_text(&text) {
            warn!("Failed to copy: {e}");
            return Err(e);
        }

        self.view.show_copied(index, true);
        let view = Arc::clone(&self.view);
        let delay = self.copy_confirm;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            view.show_copied(index, false);
        });
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ChunkStream, KnowledgeBaseStatus};
    use crate::chat::input::Key;
    use crate::chat::turn::{ContextMessage, Role};
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::channel::mpsc;
    use std::sync::mpsc as std_mpsc;
    use tokio::sync::oneshot;

    enum Reply {
        Chunks(Vec<&'static str>),
        Status(u16),
        Manual(mpsc::UnboundedReceiver<Result<Bytes, ClientError>>),
    }

    #[derive(Default)]
    struct FakeChat {
        exists: Option<bool>,
        replies: Mutex<Vec<Reply>>,
        requests: Mutex<Vec<Vec<ContextMessage>>>,
        started: Mutex<Option<oneshot::Sender<()>>>,
    }

    impl FakeChat {
        fn with_replies(replies: Vec<Reply>) -> Self {
            Self {
                exists: Some(true),
                replies: Mutex::new(replies),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ChatApi for FakeChat {
        async fn knowledge_base_status(&self) -> Result<KnowledgeBaseStatus, ClientError> {
            self.exists
                .map(|exists| KnowledgeBaseStatus { exists })
                .ok_or_else(|| ClientError::Protocol("unreachable".to_string()))
        }

        async fn chat_stream(&self, history: &[ContextMessage]) -> Result<ChunkStream, ClientError> {
            self.requests.lock().push(history.to_vec());
            if let Some(started) = self.started.lock().take() {
                let _ = started.send(());
            }
            let reply = self.replies.lock().remove(0);
            match reply {
                Reply::Chunks(chunks) => Ok(futures::stream::iter(
                    chunks
                        .into_iter()
                        .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                        .collect::<Vec<_>>(),
                )
                .boxed()),
                Reply::Status(status) => Err(ClientError::Server {
                    status,
                    body: String::new(),
                }),
                Reply::Manual(rx) => Ok(rx.boxed()),
            }
        }
    }

    #[derive(Default)]
    struct RecordingView {
        events: Mutex<Vec<String>>,
        placeholders: Mutex<Vec<PlaceholderId>>,
        banners: Mutex<Vec<String>>,
        copied: Mutex<Vec<(usize, bool)>>,
        titles: Mutex<Vec<String>>,
        /// When set, the first `remove_placeholder` signals the sender and waits for the receiver.
        hold_removal: Mutex<Option<(std_mpsc::Sender<()>, std_mpsc::Receiver<()>)>>,
    }

    impl BannerSink for RecordingView {
        fn show_banner(&self, message: &str, _tone: Tone) {
            self.banners.lock().push(message.to_string());
        }

        fn hide_banner(&self) {}
    }

    impl ChatView for RecordingView {
        fn show_greeting(&self, _greeting: &str) {}

        fn enter_mode(&self, mode: SessionMode) {
            self.events.lock().push(format!("mode:{mode:?}"));
        }

        fn clear_messages(&self) {
            self.events.lock().push("clear".to_string());
        }

        fn append_message(&self, _index: usize, turn: &ChatTurn, html: &str, _with_actions: bool) {
            self.events.lock().push(format!("{:?}:{html}", turn.sender));
        }

        fn show_typing(&self, id: PlaceholderId) {
            self.placeholders.lock().push(id);
        }

        fn update_placeholder(&self, _id: PlaceholderId, html: &str) {
            self.events.lock().push(format!("partial:{html}"));
        }

        fn remove_placeholder(&self, id: PlaceholderId) {
            let hold = self.hold_removal.lock().take();
            if let Some((entered, release)) = hold {
                let _ = entered.send(());
                let _ = release.recv();
            }
            self.placeholders.lock().retain(|p| *p != id);
        }

        fn render_input(&self, _slot: InputSlot, _state: &InputState) {}

        fn set_title(&self, title: &str) {
            self.titles.lock().push(title.to_string());
        }

        fn show_copied(&self, index: usize, copied: bool) {
            self.copied.lock().push((index, copied));
        }
    }

    #[derive(Default)]
    struct MemoryClipboard {
        text: Mutex<Option<String>>,
    }

    impl Clipboard for MemoryClipboard {
        fn write_text(&self, text: &str) -> Result<(), ClientError> {
            *self.text.lock() = Some(text.to_string());
            Ok(())
        }
    }

    struct Harness {
        api: Arc<FakeChat>,
        view: Arc<RecordingView>,
        clipboard: Arc<MemoryClipboard>,
        session: ChatSession<FakeChat, RecordingView>,
    }

    fn harness(api: FakeChat) -> Harness {
        let api = Arc::new(api);
        let view = Arc::new(RecordingView::default());
        let clipboard = Arc::new(MemoryClipboard::default());
        let session = ChatSession::new(
            api.clone(),
            view.clone(),
            clipboard.clone(),
            &ClientConfig::default(),
        )
        .unwrap();
        Harness {
            api,
            view,
            clipboard,
            session,
        }
    }

    #[tokio::test]
    async fn test_send_hello_records_both_turns() {
        let h = harness(FakeChat::with_replies(vec![
            Reply::Chunks(vec!["Hi", " there"]),
            Reply::Chunks(vec!["ok"]),
        ]));

        h.session.set_input(InputSlot::Main, "Hello");
        let outcome = h.session.send(InputSlot::Main).await;

        assert_eq!(outcome, SendOutcome::Answered("Hi there".to_string()));
        assert_eq!(h.session.mode(), SessionMode::Conversation);
        let history = h.session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sender, Sender::User);
        assert_eq!(history[0].text, "Hello");
        assert_eq!(history[1].sender, Sender::Ai);
        assert_eq!(history[1].text, "Hi there");
        assert!(h.view.placeholders.lock().is_empty());
        assert_eq!(h.session.input(InputSlot::Main).text, "");
        assert_eq!(*h.view.titles.lock(), vec!["Hello".to_string()]);

        // First request carried only the question.
        assert_eq!(h.api.requests.lock()[0].len(), 1);

        h.session.set_input(InputSlot::Bottom, "And?");
        h.session.send(InputSlot::Bottom).await;
        let second = h.api.requests.lock()[1].clone();
        assert_eq!(second.len(), 3);
        assert_eq!(second[0].content, "Hello");
        assert_eq!(second[1].role, Role::Assistant);
        assert_eq!(second[1].content, "Hi there");
        assert_eq!(second[2].content, "And?");
    }

    #[tokio::test]
    async fn test_progressive_rendering() {
        let h = harness(FakeChat::with_replies(vec![Reply::Chunks(vec!["Hi", " **there**\nbye"])]));
        h.session.set_input(InputSlot::Main, "Hello");
        h.session.send(InputSlot::Main).await;

        let events = h.view.events.lock();
        assert!(events.contains(&"partial:Hi".to_string()));
        assert!(events.contains(&"partial:Hi <strong>there</strong><br>bye".to_string()));
        assert_eq!(
            events.last().map(String::as_str),
            Some("Ai:Hi <strong>there</strong><br>bye")
        );
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected() {
        let h = harness(FakeChat::with_replies(vec![]));
        h.session.set_input(InputSlot::Main, "   \n ");
        assert_eq!(h.session.send(InputSlot::Main).await, SendOutcome::Rejected);
        assert!(h.session.history().is_empty());
        assert!(h.api.requests.lock().is_empty());
        assert_eq!(h.session.mode(), SessionMode::Welcome);
    }

    #[tokio::test]
    async fn test_missing_knowledge_base_disables_input() {
        let h = harness(FakeChat {
            exists: Some(false),
            ..FakeChat::default()
        });

        assert!(!h.session.check_knowledge_base().await);
        assert_eq!(*h.view.banners.lock(), vec![KB_MISSING_STATUS.to_string()]);
        assert!(h.session.input(InputSlot::Main).disabled);
        assert!(h.session.input(InputSlot::Bottom).disabled);

        h.session.set_input(InputSlot::Main, "Hello");
        assert!(!h.session.input(InputSlot::Main).send_enabled);
        assert_eq!(h.session.send(InputSlot::Main).await, SendOutcome::Rejected);
        assert!(h.session.history().is_empty());
        assert!(h.api.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_status_disables_input() {
        let h = harness(FakeChat::default());
        assert!(!h.session.check_knowledge_base().await);
        assert_eq!(*h.view.banners.lock(), vec![KB_NETWORK_STATUS.to_string()]);
        assert!(h.session.input(InputSlot::Main).disabled);
    }

    #[tokio::test]
    async fn test_server_error_records_no_answer() {
        let h = harness(FakeChat::with_replies(vec![Reply::Status(500)]));
        h.session.set_input(InputSlot::Main, "Hello");

        assert_eq!(h.session.send(InputSlot::Main).await, SendOutcome::Failed);
        assert_eq!(h.session.history().len(), 1);
        assert!(h.view.placeholders.lock().is_empty());
        assert_eq!(*h.view.banners.lock(), vec![ANSWER_FAILED_STATUS.to_string()]);
    }

    #[tokio::test]
    async fn test_stream_error_mid_answer_discards_partial() {
        let (tx, rx) = mpsc::unbounded();
        let h = harness(FakeChat::with_replies(vec![Reply::Manual(rx)]));
        tx.unbounded_send(Ok(Bytes::from_static(b"partial"))).unwrap();
        tx.unbounded_send(Err(ClientError::Protocol("connection reset".to_string())))
            .unwrap();
        drop(tx);

        h.session.set_input(InputSlot::Main, "Hello");
        assert_eq!(h.session.send(InputSlot::Main).await, SendOutcome::Failed);
        assert_eq!(h.session.history().len(), 1);
        assert!(h.view.placeholders.lock().is_empty());
    }

    #[tokio::test]
    async fn test_enter_with_shift_does_not_send() {
        let h = harness(FakeChat::with_replies(vec![Reply::Chunks(vec!["ok"])]));
        h.session.set_input(InputSlot::Main, "Hello");

        let shifted = KeyPress {
            key: Key::Enter,
            shift: true,
        };
        assert_eq!(h.session.handle_key(InputSlot::Main, shifted).await, None);
        assert!(h.session.history().is_empty());

        assert_eq!(
            h.session.handle_key(InputSlot::Main, KeyPress::enter()).await,
            Some(SendOutcome::Answered("ok".to_string()))
        );
    }

    #[tokio::test]
    async fn test_new_chat_resets_from_any_mode() {
        let h = harness(FakeChat::with_replies(vec![Reply::Chunks(vec!["ok"])]));
        let first_id = h.session.session_id();

        h.session.new_chat();
        assert_eq!(h.session.mode(), SessionMode::Welcome);

        h.session.set_input(InputSlot::Main, "Hello");
        h.session.send(InputSlot::Main).await;
        assert_eq!(h.session.mode(), SessionMode::Conversation);

        h.session.set_input(InputSlot::Bottom, "draft");
        h.session.new_chat();
        assert_eq!(h.session.mode(), SessionMode::Welcome);
        assert!(h.session.history().is_empty());
        assert_eq!(h.session.input(InputSlot::Bottom).text, "");
        assert_ne!(h.session.session_id(), first_id);
        assert!(h.view.events.lock().contains(&"clear".to_string()));
    }

    #[tokio::test]
    async fn test_new_chat_discards_in_flight_answer() {
        let (tx, rx) = mpsc::unbounded();
        let (started_tx, started_rx) = oneshot::channel();
        let api = FakeChat::with_replies(vec![Reply::Manual(rx)]);
        *api.started.lock() = Some(started_tx);
        let h = Arc::new(harness(api));

        h.session.set_input(InputSlot::Main, "Hello");
        let sender = Arc::clone(&h);
        let pending = tokio::spawn(async move { sender.session.send(InputSlot::Main).await });

        started_rx.await.unwrap();
        h.session.new_chat();
        tx.unbounded_send(Ok(Bytes::from_static(b"late"))).unwrap();
        drop(tx);

        assert_eq!(pending.await.unwrap(), SendOutcome::Superseded);
        assert!(h.session.history().is_empty());
        assert!(h.view.placeholders.lock().is_empty());
        assert!(h.view.banners.lock().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_new_chat_while_answer_completes() {
        let h = Arc::new(harness(FakeChat::with_replies(vec![Reply::Chunks(vec![
            "late answer",
        ])])));
        let (entered_tx, entered_rx) = std_mpsc::channel();
        let (release_tx, release_rx) = std_mpsc::channel();
        *h.view.hold_removal.lock() = Some((entered_tx, release_rx));

        h.session.set_input(InputSlot::Main, "Hello");
        let sender = Arc::clone(&h);
        let pending = tokio::spawn(async move { sender.session.send(InputSlot::Main).await });

        tokio::task::spawn_blocking(move || entered_rx.recv())
            .await
            .unwrap()
            .unwrap();
        let resetter = Arc::clone(&h);
        let reset = tokio::task::spawn_blocking(move || resetter.session.new_chat());
        tokio::time::sleep(Duration::from_millis(50)).await;
        release_tx.send(()).unwrap();

        reset.await.unwrap();
        pending.await.unwrap();

        assert_eq!(h.session.mode(), SessionMode::Welcome);
        assert!(h.session.history().is_empty());
        assert_eq!(*h.view.titles.lock(), vec!["Hello".to_string()]);
    }

    #[tokio::test]
    async fn test_second_send_supersedes_first() {
        let (tx, rx) = mpsc::unbounded();
        let (started_tx, started_rx) = oneshot::channel();
        let api = FakeChat::with_replies(vec![Reply::Manual(rx), Reply::Chunks(vec!["answer B"])]);
        *api.started.lock() = Some(started_tx);
        let h = Arc::new(harness(api));

        h.session.set_input(InputSlot::Main, "question A");
        let sender = Arc::clone(&h);
        let first = tokio::spawn(async move { sender.session.send(InputSlot::Main).await });
        started_rx.await.unwrap();

        h.session.set_input(InputSlot::Bottom, "question B");
        assert_eq!(
            h.session.send(InputSlot::Bottom).await,
            SendOutcome::Answered("answer B".to_string())
        );

        tx.unbounded_send(Ok(Bytes::from_static(b"late A"))).unwrap();
        drop(tx);
        assert_eq!(first.await.unwrap(), SendOutcome::Superseded);

        let history: Vec<(Sender, String)> = h
            .session
            .history()
            .into_iter()
            .map(|t| (t.sender, t.text))
            .collect();
        assert_eq!(
            history,
            vec![
                (Sender::User, "question A".to_string()),
                (Sender::User, "question B".to_string()),
                (Sender::Ai, "answer B".to_string()),
            ]
        );
        assert!(h.view.banners.lock().is_empty());
        assert!(h.view.placeholders.lock().is_empty());
    }

    #[tokio::test]
    async fn test_capability_fills_active_input() {
        let h = harness(FakeChat::with_replies(vec![]));
        assert_eq!(h.session.apply_capability("Deep Research"), Some(Capability::DeepResearch));
        assert_eq!(
            h.session.input(InputSlot::Main).text,
            "I need help with research on artificial intelligence"
        );
        assert!(h.session.input(InputSlot::Main).send_enabled);
        assert_eq!(h.session.apply_capability("Unknown"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_answer_plain_text() {
        let h = harness(FakeChat::with_replies(vec![Reply::Chunks(vec!["**Yes**\nbecause"])]));
        h.session.set_input(InputSlot::Main, "Hello");
        h.session.send(InputSlot::Main).await;

        let index = h.session.last_answer_index().unwrap();
        let copied = h.session.copy_message(index).unwrap();
        assert_eq!(copied, "Yes\nbecause");
        assert_eq!(h.clipboard.text.lock().as_deref(), Some("Yes\nbecause"));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(*h.view.copied.lock(), vec![(index, true), (index, false)]);
    }

    #[tokio::test]
    async fn test_notice_is_not_recorded() {
        let h = harness(FakeChat::with_replies(vec![]));
        h.session.show_notice("Type /help for commands");
        assert!(h.session.history().is_empty());
        assert!(h.view.titles.lock().is_empty());
        assert!(
            h.view
                .events
                .lock()
                .contains(&"AiContext:Type /help for commands".to_string())
        );
    }
}
