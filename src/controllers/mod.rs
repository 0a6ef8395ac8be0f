//! Toolkit-independent view controllers. Each one owns the state a page
//! would render and is driven by awaited calls instead of DOM events.

pub mod auth;
pub mod stats;
pub mod upload;
pub mod weather;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Messages shown on the upload and stats pages disappear after this long.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);
/// A "Copied!" label reverts after this long.
pub const COPY_FEEDBACK_TTL: Duration = Duration::from_secs(2);

pub const COPY_LABEL: &str = "Copy link";
pub const COPIED_LABEL: &str = "Copied!";

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            ViewState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Idle
    }
}

/// Busy flag a renderer can hold on to while the owning controller is
/// awaiting a request.
#[derive(Debug, Clone)]
pub struct BusyFlag {
    tx: Arc<watch::Sender<bool>>,
}

impl BusyFlag {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_busy(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    fn set(&self, busy: bool) {
        self.tx.send_replace(busy);
    }
}

impl Default for BusyFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// A request in flight. Puts the view into `Loading` and raises the busy
/// flag; `finish` stores the outcome. Dropped unfinished (the request future
/// was cancelled), it puts the previous state back. The flag is lowered on
/// every path.
pub(crate) struct Pending<'a, T> {
    state: &'a mut ViewState<T>,
    busy: Option<&'a BusyFlag>,
    previous: Option<ViewState<T>>,
}

impl<'a, T> Pending<'a, T> {
    pub(crate) fn begin(state: &'a mut ViewState<T>, busy: Option<&'a BusyFlag>) -> Self {
        let previous = std::mem::replace(state, ViewState::Loading);
        if let Some(flag) = busy {
            flag.set(true);
        }
        Self {
            state,
            busy,
            previous: Some(previous),
        }
    }

    pub(crate) fn finish(mut self, next: ViewState<T>) {
        self.previous = None;
        *self.state = next;
    }
}

impl<T> Drop for Pending<'_, T> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *self.state = previous;
        }
        if let Some(flag) = self.busy {
            flag.set(false);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message banner, optionally auto-dismissed.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    posted_at: Instant,
    ttl: Option<Duration>,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text.into(), NoticeLevel::Info)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text.into(), NoticeLevel::Error)
    }

    fn new(text: String, level: NoticeLevel) -> Self {
        Self {
            text,
            level,
            posted_at: Instant::now(),
            ttl: None,
        }
    }

    pub fn dismiss_after(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn is_visible(&self) -> bool {
        self.ttl.map_or(true, |ttl| self.posted_at.elapsed() < ttl)
    }
}

/// Label state of a copy-to-clipboard button.
#[derive(Debug, Clone, Default)]
pub struct CopyFeedback {
    copied_at: Option<Instant>,
}

impl CopyFeedback {
    pub fn mark(&mut self) {
        self.copied_at = Some(Instant::now());
    }

    pub fn label(&self) -> &'static str {
        match self.copied_at {
            Some(at) if at.elapsed() < COPY_FEEDBACK_TTL => COPIED_LABEL,
            _ => COPY_LABEL,
        }
    }
}

pub trait Clipboard: Send + Sync {
    fn copy(&self, text: &str);
}

/// Clipboard that keeps the last copied text.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn copy(&self, text: &str) {
        *self.contents.lock() = Some(text.to_string());
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notice_auto_dismisses() {
        let notice = Notice::error("Upload failed").dismiss_after(NOTICE_TTL);
        assert!(notice.is_visible());

        tokio::time::advance(Duration::from_millis(4999)).await;
        assert!(notice.is_visible());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!notice.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sticky_notice_stays() {
        let notice = Notice::info("Registered");
        tokio::time::advance(Duration::from_secs(600)).await;
        assert!(notice.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_label_reverts() {
        let mut feedback = CopyFeedback::default();
        assert_eq!(feedback.label(), COPY_LABEL);

        feedback.mark();
        assert_eq!(feedback.label(), COPIED_LABEL);

        tokio::time::advance(COPY_FEEDBACK_TTL).await;
        assert_eq!(feedback.label(), COPY_LABEL);
    }

    #[test]
    fn test_pending_finish_stores_outcome() {
        let busy = BusyFlag::new();
        let mut state: ViewState<u32> = ViewState::Idle;

        let pending = Pending::begin(&mut state, Some(&busy));
        assert!(busy.is_busy());
        pending.finish(ViewState::Success(7));

        assert_eq!(state, ViewState::Success(7));
        assert!(!busy.is_busy());
    }

    #[test]
    fn test_dropped_pending_restores_previous_state() {
        let busy = BusyFlag::new();
        let mut rx = busy.subscribe();
        let mut state: ViewState<u32> = ViewState::Success(1);

        {
            let _pending = Pending::begin(&mut state, Some(&busy));
            assert!(*rx.borrow_and_update());
        }

        assert_eq!(state, ViewState::Success(1));
        assert!(!busy.is_busy());
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_view_state_accessors() {
        let state: ViewState<u32> = ViewState::Success(3);
        assert_eq!(state.success(), Some(&3));
        assert!(state.error().is_none());

        let state: ViewState<u32> = ViewState::Error("boom".to_string());
        assert_eq!(state.error(), Some("boom"));
        assert!(!state.is_loading());
        assert!(ViewState::<u32>::default() == ViewState::Idle);
    }
}
