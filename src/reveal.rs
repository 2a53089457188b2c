//! Progressive reveal of formatted tokens into a display buffer
//!
//! Each reveal runs as one task that appends token `i` at
//! `start + interval * i`. Deadlines are measured from the start of the
//! session, so scheduling jitter never accumulates.
//!
//! Only one session is live at a time. Starting a new one (or calling
//! [`RevealScheduler::reset`]) bumps the session counter and cancels the
//! previous token; an emission re-checks both under the buffer lock, so a
//! superseded session can never write after its successor has started.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default pause between consecutive tokens
pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(75);

/// Buffer shared between the scheduler and its emission tasks
#[derive(Debug, Default)]
struct DisplayState {
    /// Session allowed to write
    session: u64,
    text: String,
}

#[derive(Debug)]
struct ActiveReveal {
    session: u64,
    cancel: CancellationToken,
}

/// Schedules timed, cancellable disclosure of response tokens
#[derive(Debug)]
pub struct RevealScheduler {
    interval: Duration,
    state: Arc<Mutex<DisplayState>>,
    display: Arc<watch::Sender<String>>,
    active: Mutex<Option<ActiveReveal>>,
}

/// Handle to one reveal session
#[derive(Debug)]
pub struct RevealHandle {
    session: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RevealHandle {
    /// Session number of this reveal
    #[must_use]
    pub const fn session(&self) -> u64 {
        self.session
    }

    /// Stop appending tokens; already-appended text stays
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether this session was cancelled or superseded
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait until the session has emitted its last token or stopped
    pub async fn finished(self) {
        if let Err(e) = self.task.await {
            tracing::warn!(session = self.session, error = %e, "reveal task ended abnormally");
        }
    }
}

impl RevealScheduler {
    /// Create a scheduler with the given per-token interval
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        let (display, _) = watch::channel(String::new());
        Self {
            interval,
            state: Arc::new(Mutex::new(DisplayState::default())),
            display: Arc::new(display),
            active: Mutex::new(None),
        }
    }

    /// Per-token interval
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Start revealing `tokens`, superseding any running session
    ///
    /// The display buffer is cleared before the first token lands. Must be
    /// called from within a tokio runtime.
    pub fn reveal(&self, tokens: Vec<String>) -> RevealHandle {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = active.take() {
            previous.cancel.cancel();
            tracing::debug!(session = previous.session, "reveal superseded");
        }

        let session = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.session += 1;
            state.text.clear();
            self.display.send_replace(String::new());
            state.session
        };

        let cancel = CancellationToken::new();
        *active = Some(ActiveReveal {
            session,
            cancel: cancel.clone(),
        });
        drop(active);

        tracing::debug!(session, tokens = tokens.len(), "reveal started");

        let task = tokio::spawn(run_reveal(
            session,
            tokens,
            self.interval,
            Arc::clone(&self.state),
            Arc::clone(&self.display),
            cancel.clone(),
        ));

        RevealHandle {
            session,
            cancel,
            task,
        }
    }

    /// Cancel the running session, leaving the buffer as it is
    pub fn cancel(&self) {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = active.as_ref() {
            current.cancel.cancel();
        }
    }

    /// Cancel the running session and clear the display buffer
    pub fn reset(&self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = active.take() {
            current.cancel.cancel();
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.session += 1;
        state.text.clear();
        self.display.send_replace(String::new());
    }

    /// Whether a session is still emitting tokens
    #[must_use]
    pub fn is_revealing(&self) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active.as_ref().is_some_and(|a| !a.cancel.is_cancelled())
    }

    /// Current display buffer contents
    #[must_use]
    pub fn snapshot(&self) -> String {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .text
            .clone()
    }

    /// Watch the display buffer as tokens land
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.display.subscribe()
    }
}

impl Default for RevealScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_INTERVAL)
    }
}

async fn run_reveal(
    session: u64,
    tokens: Vec<String>,
    interval: Duration,
    state: Arc<Mutex<DisplayState>>,
    display: Arc<watch::Sender<String>>,
    cancel: CancellationToken,
) {
    let start = Instant::now();

    for (index, token) in tokens.into_iter().enumerate() {
        let offset = interval.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));

        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep_until(start + offset) => {}
        }

        let mut buffer = state.lock().unwrap_or_else(|e| e.into_inner());
        if buffer.session != session || cancel.is_cancelled() {
            break;
        }
        buffer.text.push_str(&token);
        buffer.text.push(' ');
        display.send_replace(buffer.text.clone());
    }

    // A finished session no longer counts as revealing
    cancel.cancel();
    tracing::trace!(session, "reveal finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn reveals_all_tokens_in_order() {
        let scheduler = RevealScheduler::new(Duration::from_millis(75));
        let handle = scheduler.reveal(words(&["one", "two", "three"]));
        handle.finished().await;

        assert_eq!(scheduler.snapshot(), "one two three ");
        assert!(!scheduler.is_revealing());
    }

    #[tokio::test(start_paused = true)]
    async fn tokens_land_on_absolute_schedule() {
        let scheduler = RevealScheduler::new(Duration::from_millis(100));
        let _handle = scheduler.reveal(words(&["a", "b", "c", "d"]));

        // Token 0 fires at t=0, token 1 at t=100, token 2 at t=200
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(scheduler.snapshot(), "a b ");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(scheduler.snapshot(), "a b c ");
    }

    #[tokio::test(start_paused = true)]
    async fn new_session_supersedes_previous() {
        let scheduler = RevealScheduler::new(Duration::from_millis(75));
        let first = scheduler.reveal(words(&["old", "old", "old", "old", "old"]));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(scheduler.snapshot(), "old old ");

        let second = scheduler.reveal(words(&["new", "turn"]));
        assert!(first.is_cancelled());

        first.finished().await;
        second.finished().await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(scheduler.snapshot(), "new turn ");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_further_tokens() {
        let scheduler = RevealScheduler::new(Duration::from_millis(50));
        let handle = scheduler.reveal(words(&["keep", "drop", "drop"]));

        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();
        handle.finished().await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(scheduler.snapshot(), "keep ");
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_buffer_and_blocks_late_writes() {
        let scheduler = RevealScheduler::new(Duration::from_millis(50));
        let handle = scheduler.reveal(words(&["a", "b", "c"]));

        tokio::time::sleep(Duration::from_millis(60)).await;
        scheduler.reset();
        handle.finished().await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(scheduler.snapshot(), "");
        assert!(!scheduler.is_revealing());
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_growing_prefixes() {
        let scheduler = RevealScheduler::new(Duration::from_millis(10));
        let mut rx = scheduler.subscribe();
        let handle = scheduler.reveal(words(&["x", "y"]));
        handle.finished().await;

        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(*rx.borrow_and_update(), "x y ");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_reveal_finishes_immediately() {
        let scheduler = RevealScheduler::default();
        scheduler.reveal(Vec::new()).finished().await;
        assert_eq!(scheduler.snapshot(), "");
    }
}
