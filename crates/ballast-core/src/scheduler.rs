//! The timed-action scheduler: one logical timeline for every delayed and
//! periodic effect in the zone.
//!
//! Actions are either one-shot ("run once after a delay unless cancelled")
//! or recurring ("run every period until cancelled"). The scheduler itself
//! never runs anything: the runner asks it for the earliest deadline,
//! sleeps until then, and drains the due actions with [`Scheduler::pop_due`]
//! so firing is strictly sequential.
//!
//! # Time
//!
//! Each action carries two deadlines:
//!
//! - a monotonic [`Instant`] that decides when it fires, and
//! - a wall-clock [`DateTime<Utc>`] that is written to snapshots.
//!
//! Recurring actions re-arm from their previous deadline rather than from
//! the moment they ran, so a slow handler does not make the period drift.
//! After a stall longer than a period the next deadline is `now + period`;
//! missed repetitions are skipped, never replayed in a burst.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;

use ballast_types::TimedPayload;

/// Errors from scheduling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// A recurring action needs a positive period.
    #[error("recurring action {payload:?} has a zero period")]
    ZeroPeriod {
        /// The rejected payload.
        payload: TimedPayload,
    },
}

/// Handle to a scheduled action, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionToken(u64);

/// An action whose deadline has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    /// The token it was scheduled under. Recurring actions keep theirs.
    pub token: ActionToken,
    /// What to do.
    pub payload: TimedPayload,
    /// Wall-clock deadline it fired for.
    pub due_at: DateTime<Utc>,
}

/// A scheduled action as written to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    /// Wall-clock deadline.
    pub due_at: DateTime<Utc>,
    /// What to do.
    pub payload: TimedPayload,
    /// Repeat period for recurring actions.
    pub period_secs: Option<u64>,
}

#[derive(Debug, Clone)]
struct Entry {
    due: Instant,
    due_at: DateTime<Utc>,
    payload: TimedPayload,
    period: Option<Duration>,
}

/// Deadline-ordered set of pending actions.
#[derive(Debug)]
pub struct Scheduler {
    next_token: u64,
    entries: HashMap<ActionToken, Entry>,
    queue: BTreeSet<(Instant, ActionToken)>,
    wake: Arc<Notify>,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            next_token: 0,
            entries: HashMap::new(),
            queue: BTreeSet::new(),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Notifier the runner waits on. Signalled whenever an action is added
    /// so the runner can shorten its sleep.
    pub fn waker(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    /// Run `payload` once after `delay`.
    pub fn schedule_once(&mut self, delay: Duration, payload: TimedPayload) -> ActionToken {
        self.insert(Instant::now(), Utc::now(), delay, payload, None)
    }

    /// Run `payload` every `period`, first after one period.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ZeroPeriod`] for a zero period, which would
    /// otherwise fire on every wake-up.
    pub fn schedule_recurring(
        &mut self,
        period: Duration,
        payload: TimedPayload,
    ) -> Result<ActionToken, SchedulerError> {
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod { payload });
        }
        Ok(self.insert(Instant::now(), Utc::now(), period, payload, Some(period)))
    }

    /// Cancel an action. Returns `false` if it already fired (one-shot) or
    /// was never scheduled; either way the call has no other effect.
    pub fn cancel(&mut self, token: ActionToken) -> bool {
        match self.entries.remove(&token) {
            Some(entry) => {
                self.queue.remove(&(entry.due, token));
                debug!(?token, payload = ?entry.payload, "Timed action cancelled");
                true
            }
            None => false,
        }
    }

    /// Token of the pending action carrying exactly `payload`, if any.
    pub fn find(&self, payload: &TimedPayload) -> Option<ActionToken> {
        self.queue
            .iter()
            .map(|(_, token)| *token)
            .find(|token| self.entries.get(token).is_some_and(|e| &e.payload == payload))
    }

    /// Whether an action carrying `payload` is pending.
    pub fn is_scheduled(&self, payload: &TimedPayload) -> bool {
        self.find(payload).is_some()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.first().map(|(due, _)| *due)
    }

    /// Number of pending actions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every action due at or before `now`, in deadline order.
    ///
    /// One-shot actions are dropped; recurring actions are re-armed under
    /// the same token.
    pub fn pop_due(&mut self, now: Instant) -> Vec<Fired> {
        let mut fired = Vec::new();
        while let Some(&(due, token)) = self.queue.first() {
            if due > now {
                break;
            }
            self.queue.pop_first();
            let Some(entry) = self.entries.remove(&token) else {
                continue;
            };
            fired.push(Fired {
                token,
                payload: entry.payload,
                due_at: entry.due_at,
            });
            if let Some(period) = entry.period {
                self.rearm(token, entry, period, now);
            }
        }
        fired
    }

    /// Every pending action, in deadline order, for a snapshot.
    pub fn pending(&self) -> Vec<PendingAction> {
        self.queue
            .iter()
            .filter_map(|(_, token)| self.entries.get(token))
            .map(|entry| PendingAction {
                due_at: entry.due_at,
                payload: entry.payload,
                period_secs: entry.period.map(|p| p.as_secs()),
            })
            .collect()
    }

    /// Re-arm actions from a snapshot taken at some earlier time.
    ///
    /// Deadlines already in the past become due immediately and fire once,
    /// in their original deadline order.
    pub fn restore(&mut self, actions: Vec<PendingAction>) {
        let mut actions = actions;
        actions.sort_by_key(|action| action.due_at);
        let now = Instant::now();
        let wall_now = Utc::now();
        for action in actions {
            let remaining = action
                .due_at
                .signed_duration_since(wall_now)
                .to_std()
                .unwrap_or(Duration::ZERO);
            let period = action
                .period_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs);
            let token = self.insert(now, wall_now, remaining, action.payload, period);
            debug!(?token, payload = ?action.payload, ?remaining, "Timed action restored");
        }
    }

    fn insert(
        &mut self,
        now: Instant,
        wall_now: DateTime<Utc>,
        delay: Duration,
        payload: TimedPayload,
        period: Option<Duration>,
    ) -> ActionToken {
        let token = ActionToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        let due = now.checked_add(delay).unwrap_or(now);
        let entry = Entry {
            due,
            due_at: add_wall(wall_now, delay),
            payload,
            period,
        };
        self.queue.insert((due, token));
        self.entries.insert(token, entry);
        self.wake.notify_one();
        debug!(?token, ?payload, ?delay, "Timed action scheduled");
        token
    }

    fn rearm(&mut self, token: ActionToken, entry: Entry, period: Duration, now: Instant) {
        let on_schedule = entry.due.checked_add(period).filter(|next| *next > now);
        let (due, due_at) = match on_schedule {
            Some(next) => (next, add_wall(entry.due_at, period)),
            None => (
                now.checked_add(period).unwrap_or(now),
                add_wall(Utc::now(), period),
            ),
        };
        self.queue.insert((due, token));
        self.entries.insert(
            token,
            Entry {
                due,
                due_at,
                ..entry
            },
        );
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn add_wall(at: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| at.checked_add_signed(d))
        .unwrap_or(at)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use ballast_types::{GiftId, PlayerId};

    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn gift() -> TimedPayload {
        TimedPayload::GiftOffer { gift: GiftId::new() }
    }

    #[tokio::test(start_paused = true)]
    async fn once_fires_exactly_once() {
        let mut sched = Scheduler::new();
        let payload = gift();
        sched.schedule_once(secs(60), payload);
        let start = Instant::now();

        assert!(sched.pop_due(start + secs(59)).is_empty());
        let fired = sched.pop_due(start + secs(60));
        assert_eq!(fired.len(), 1);
        assert!(fired.iter().all(|f| f.payload == payload));
        assert!(sched.pop_due(start + secs(600)).is_empty());
        assert!(sched.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_firing_is_a_no_op() {
        let mut sched = Scheduler::new();
        let token = sched.schedule_once(secs(1), gift());
        let fired = sched.pop_due(Instant::now() + secs(1));
        assert_eq!(fired.len(), 1);
        assert!(!sched.cancel(token));
        assert!(!sched.cancel(token));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_action_never_fires() {
        let mut sched = Scheduler::new();
        let payload = gift();
        let token = sched.schedule_once(secs(5), payload);
        assert_eq!(sched.find(&payload), Some(token));
        assert!(sched.cancel(token));
        assert!(sched.pop_due(Instant::now() + secs(10)).is_empty());
        assert_eq!(sched.find(&payload), None);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_in_deadline_order() {
        let mut sched = Scheduler::new();
        let late = gift();
        let early = gift();
        sched.schedule_once(secs(30), late);
        sched.schedule_once(secs(10), early);

        let order: Vec<_> = sched
            .pop_due(Instant::now() + secs(60))
            .into_iter()
            .map(|f| f.payload)
            .collect();
        assert_eq!(order, vec![early, late]);
    }

    #[tokio::test(start_paused = true)]
    async fn recurring_rearms_from_previous_deadline() {
        let mut sched = Scheduler::new();
        let start = Instant::now();
        sched
            .schedule_recurring(secs(180), TimedPayload::MonitorTick)
            .unwrap();

        // Handled a little late: the next deadline stays on the grid.
        assert_eq!(sched.pop_due(start + secs(185)).len(), 1);
        assert_eq!(sched.next_deadline(), Some(start + secs(360)));
    }

    #[tokio::test(start_paused = true)]
    async fn recurring_skips_missed_periods_after_a_stall() {
        let mut sched = Scheduler::new();
        let start = Instant::now();
        sched
            .schedule_recurring(secs(10), TimedPayload::MonitorTick)
            .unwrap();

        let fired = sched.pop_due(start + secs(95));
        assert_eq!(fired.len(), 1);
        assert_eq!(sched.next_deadline(), Some(start + secs(105)));
    }

    #[test]
    fn zero_period_is_rejected() {
        let mut sched = Scheduler::new();
        let result = sched.schedule_recurring(Duration::ZERO, TimedPayload::MonitorTick);
        assert!(matches!(result, Err(SchedulerError::ZeroPeriod { .. })));
        assert!(sched.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restore_fires_expired_actions_once_in_order() {
        let player = PlayerId::new();
        let now = Utc::now();
        let first = gift();
        let second = TimedPayload::CurseTick { player };
        let future = TimedPayload::MonitorTick;
        let snapshot = vec![
            PendingAction {
                due_at: now + chrono::Duration::seconds(120),
                payload: future,
                period_secs: Some(180),
            },
            PendingAction {
                due_at: now - chrono::Duration::seconds(10),
                payload: second,
                period_secs: None,
            },
            PendingAction {
                due_at: now - chrono::Duration::seconds(50),
                payload: first,
                period_secs: None,
            },
        ];

        let mut sched = Scheduler::new();
        sched.restore(snapshot);
        let due: Vec<_> = sched
            .pop_due(Instant::now())
            .into_iter()
            .map(|f| f.payload)
            .collect();
        assert_eq!(due, vec![first, second]);
        assert!(sched.pop_due(Instant::now()).is_empty());
        assert!(sched.is_scheduled(&future));
    }

    #[tokio::test(start_paused = true)]
    async fn pending_exports_payloads_and_periods() {
        let mut sched = Scheduler::new();
        sched
            .schedule_recurring(secs(180), TimedPayload::MonitorTick)
            .unwrap();
        sched.schedule_once(secs(60), gift());

        let pending = sched.pending();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().any(|p| p.period_secs == Some(180)));
        assert!(pending.iter().any(|p| p.period_secs.is_none()));
    }
}
