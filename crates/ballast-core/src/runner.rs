//! The zone runner: drives the timed-action timeline.
//!
//! [`run_zone`] sleeps until the earliest pending deadline, wakes early
//! when something new is scheduled, fires everything that is due and
//! repeats. Firing is strictly sequential; handlers never overlap.
//!
//! - **Pause/resume**: overdue actions wait and fire on resume.
//! - **Clean shutdown**: returns when the operator requests a stop, leaving
//!   pending actions in the scheduler so they can be snapshotted.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::operator::{OperatorState, StopReason};
use crate::zone::Zone;

/// What a runner did before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Why it stopped.
    pub stop_reason: Option<StopReason>,
    /// Timed actions handled.
    pub actions_fired: u64,
    /// Handlers that returned an error.
    pub actions_failed: u64,
    /// Actions still pending at shutdown.
    pub pending: usize,
}

/// Run the timeline until the operator requests a stop.
pub async fn run_zone(zone: Arc<Zone>, operator: Arc<OperatorState>) -> RunSummary {
    let waker = zone.waker().await;
    let mut fired: u64 = 0;
    let mut failed: u64 = 0;

    let pending = zone.pending_actions().await;
    info!(pending, "Zone runner starting");

    loop {
        if operator.is_stop_requested() {
            break;
        }

        if operator.is_paused() {
            info!("Zone runner paused, waiting for resume...");
            operator.wait_if_paused().await;
            info!("Zone runner resumed");
            continue;
        }

        let summary = zone.fire_due(Instant::now()).await;
        if summary.fired > 0 {
            operator.record_fired(summary.fired);
            fired = fired.saturating_add(u64::try_from(summary.fired).unwrap_or(u64::MAX));
            failed = failed.saturating_add(u64::try_from(summary.failed).unwrap_or(u64::MAX));
            debug!(fired = summary.fired, failed = summary.failed, "Timed actions fired");
        }

        let next = zone.next_deadline().await;
        let sleep = async {
            match next {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            () = sleep => {}
            () = waker.notified() => {}
            () = operator.stopped() => {}
        }
    }

    let summary = RunSummary {
        stop_reason: operator.stop_reason().await,
        actions_fired: fired,
        actions_failed: failed,
        pending: zone.pending_actions().await,
    };
    info!(
        reason = ?summary.stop_reason,
        fired = summary.actions_fired,
        failed = summary.actions_failed,
        pending = summary.pending,
        "Zone runner stopped"
    );
    summary
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use ballast_events::EventBus;
    use ballast_types::{Item, ItemCategory, ItemFlags, ItemId, Owner, PlayerId, WeightClass};
    use ballast_world::CatalogGenerator;
    use rust_decimal::Decimal;

    use super::*;
    use crate::config::ZoneConfig;
    use crate::topology::StaticTopology;

    fn zone() -> Arc<Zone> {
        Arc::new(Zone::new(
            ZoneConfig::default(),
            Arc::new(StaticTopology::new("Temple", "Hub")),
            Arc::new(CatalogGenerator::new()),
            Arc::new(EventBus::default()),
        ))
    }

    fn teapot() -> Item {
        Item {
            id: ItemId::new(),
            name: String::from("a chipped teapot"),
            description: String::from("Still pours."),
            category: ItemCategory::Artwork,
            weight_class: WeightClass::Regular,
            flags: ItemFlags::default(),
            material: None,
            provenance: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runner_fires_gifts_scheduled_while_idle() {
        let zone = zone();
        let operator = Arc::new(OperatorState::new());
        let handle = tokio::spawn(run_zone(Arc::clone(&zone), Arc::clone(&operator)));
        tokio::task::yield_now().await;

        let (giver, recipient) = (PlayerId::new(), PlayerId::new());
        let item = zone.spawn(teapot(), Owner::Player(giver)).await.unwrap();
        zone.gift(giver, item, recipient).await.unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(zone.owner_total(recipient).await, Decimal::ONE);

        operator.request_stop(StopReason::OperatorStop).await;
        let summary = handle.await.unwrap();
        assert_eq!(summary.actions_fired, 1);
        assert_eq!(summary.stop_reason, Some(StopReason::OperatorStop));
        assert_eq!(summary.pending, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_runner_holds_actions_until_resume() {
        let zone = zone();
        let operator = Arc::new(OperatorState::new());
        operator.pause();
        let handle = tokio::spawn(run_zone(Arc::clone(&zone), Arc::clone(&operator)));

        let (giver, recipient) = (PlayerId::new(), PlayerId::new());
        let item = zone.spawn(teapot(), Owner::Player(giver)).await.unwrap();
        zone.gift(giver, item, recipient).await.unwrap();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(zone.owner_total(recipient).await, Decimal::ZERO);

        operator.resume();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(zone.owner_total(recipient).await, Decimal::ONE);

        operator.request_stop(StopReason::Signal).await;
        assert_eq!(handle.await.unwrap().actions_fired, 1);
    }
}
