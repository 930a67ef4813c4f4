//! Trailing-edge debounce for the search box.
//!
//! [`DebounceGate::push`] records the latest text and re-arms a deadline;
//! [`DebounceGate::settled`] resolves once that deadline passes without
//! another push. Text shorter than `min_length` (after trimming) clears the
//! gate synchronously so the UI can drop stale results without waiting.
//!
//! Every armed deadline owns a child of the gate's shutdown token. Re-arming
//! or resetting cancels the child; cancelling the shutdown token (or
//! dropping the gate) cancels whatever is pending and makes `settled`
//! return `None` from then on.

use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::config::DebounceConfig;

/// What a push did to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateSignal {
    /// Input fell below the minimum length; nothing is pending.
    Cleared,
    /// A settle deadline is armed.
    Armed { deadline: Instant },
}

struct Pending {
    value: String,
    deadline: Instant,
    token: CancellationToken,
}

pub struct DebounceGate {
    delay: Duration,
    min_length: usize,
    shutdown: CancellationToken,
    pending: Option<Pending>,
}

impl DebounceGate {
    pub fn new(delay: Duration, min_length: usize) -> Self {
        Self {
            delay,
            min_length,
            shutdown: CancellationToken::new(),
            pending: None,
        }
    }

    pub fn from_config(config: &DebounceConfig) -> Self {
        Self::new(config.delay(), config.min_length)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Token that tears the gate down when cancelled. Hand it to whatever
    /// owns the consumer's lifetime.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Whether `raw` is long enough to be debounced at all.
    pub fn accepts(&self, raw: &str) -> bool {
        raw.trim().chars().count() >= self.min_length
    }

    pub fn push(&mut self, raw: &str) -> GateSignal {
        self.cancel_pending();
        if !self.accepts(raw) || self.is_shut_down() {
            return GateSignal::Cleared;
        }

        let deadline = Instant::now() + self.delay;
        self.pending = Some(Pending {
            value: raw.to_string(),
            deadline,
            token: self.shutdown.child_token(),
        });
        GateSignal::Armed { deadline }
    }

    /// Drop any pending value without emitting it.
    pub fn reset(&mut self) {
        self.cancel_pending();
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| !p.token.is_cancelled())
    }

    pub fn latest(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.value.as_str())
    }

    /// Wait for the pending value to settle.
    ///
    /// Pends while nothing is armed and returns `None` once the gate is shut
    /// down. Cancel-safe: dropping the future leaves the pending value and
    /// its deadline in place.
    pub async fn settled(&mut self) -> Option<String> {
        let Some(pending) = self.pending.as_ref() else {
            self.shutdown.cancelled().await;
            return None;
        };

        let token = pending.token.clone();
        let deadline = pending.deadline;
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                self.pending = None;
                None
            }
            _ = sleep_until(deadline) => {
                let value = self.pending.take().map(|p| p.value);
                tracing::debug!(query = value.as_deref().unwrap_or(""), "debounce_settled");
                value
            }
        }
    }

    /// Cancel everything and refuse further emissions.
    pub fn shutdown(&mut self) {
        self.shutdown.cancel();
        self.pending = None;
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.token.cancel();
        }
    }
}

impl Drop for DebounceGate {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
