//! Operator control state for the zone runner.
//!
//! Shared between the runner task and whoever controls the process (signal
//! handlers, an admin surface). The operator can pause timed actions,
//! resume them and request a clean shutdown without stopping player
//! actions.
//!
//! # Architecture
//!
//! Flags are atomics so the runner can read them without locks; each flag
//! has a [`Notify`] so the runner wakes as soon as it changes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

/// Why the runner stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// An operator issued a stop command.
    OperatorStop,
    /// The process received a shutdown signal.
    Signal,
}

/// Shared operator control state.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether timed actions are held back.
    paused: AtomicBool,

    /// Wakes the runner when resumed.
    resume_notify: Notify,

    /// Stop reason, once one has been requested.
    stop_requested: AtomicBool,
    stop_notify: Notify,
    stop_reason: Mutex<Option<StopReason>>,

    /// Timed actions handled since start.
    actions_fired: AtomicU64,

    /// Wall-clock time when the runner started.
    started_at: DateTime<Utc>,
}

impl OperatorState {
    /// Fresh control state: running, no stop requested.
    pub fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            stop_reason: Mutex::new(None),
            actions_fired: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether timed actions are paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Hold back timed actions. Overdue actions fire after [`resume`](Self::resume).
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume timed actions and wake the runner.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the runner is no longer paused or a stop is requested.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop. The first reason wins.
    pub async fn request_stop(&self, reason: StopReason) {
        {
            let mut guard = self.stop_reason.lock().await;
            if guard.is_none() {
                *guard = Some(reason);
            }
        }
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
        self.resume_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Resolves once a stop has been requested. Any number of tasks may
    /// wait on this at once.
    pub async fn stopped(&self) {
        loop {
            let notified = self.stop_notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent stop is not missed.
            notified.as_mut().enable();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }

    /// Why the runner stopped, if it has been asked to.
    pub async fn stop_reason(&self) -> Option<StopReason> {
        *self.stop_reason.lock().await
    }

    // -----------------------------------------------------------------------
    // Counters
    // -----------------------------------------------------------------------

    /// Add to the count of handled timed actions.
    pub fn record_fired(&self, count: usize) {
        let count = u64::try_from(count).unwrap_or(u64::MAX);
        let _ = self
            .actions_fired
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_add(count))
            });
    }

    /// Timed actions handled since start.
    pub fn actions_fired(&self) -> u64 {
        self.actions_fired.load(Ordering::Acquire)
    }

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}

impl Default for OperatorState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_running() {
        let state = OperatorState::new();
        assert!(!state.is_paused());
        assert!(!state.is_stop_requested());
        assert_eq!(state.actions_fired(), 0);
    }

    #[test]
    fn pause_and_resume() {
        let state = OperatorState::new();
        state.pause();
        assert!(state.is_paused());
        state.resume();
        assert!(!state.is_paused());
    }

    #[tokio::test]
    async fn first_stop_reason_wins() {
        let state = OperatorState::new();
        state.request_stop(StopReason::Signal).await;
        state.request_stop(StopReason::OperatorStop).await;
        assert!(state.is_stop_requested());
        assert_eq!(state.stop_reason().await, Some(StopReason::Signal));
        state.stopped().await;
    }

    #[tokio::test]
    async fn stop_wakes_every_waiter() {
        let state = std::sync::Arc::new(OperatorState::new());
        let first = tokio::spawn({
            let state = std::sync::Arc::clone(&state);
            async move { state.stopped().await }
        });
        let second = tokio::spawn({
            let state = std::sync::Arc::clone(&state);
            async move { state.stopped().await }
        });
        tokio::task::yield_now().await;
        state.request_stop(StopReason::OperatorStop).await;
        first.await.unwrap();
        second.await.unwrap();
    }

    #[test]
    fn fired_counter_saturates() {
        let state = OperatorState::new();
        state.record_fired(3);
        state.record_fired(usize::MAX);
        assert_eq!(state.actions_fired(), u64::MAX);
    }
}
