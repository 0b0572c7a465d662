//! Typed notifications for the Ballast zone engine.
//!
//! Everything the engine wants the world to hear about, whether a broadcast
//! to every connected player, a whisper to one, or a capacity level change,
//! is published as a [`ZoneEvent`] on the [`EventBus`]. The session layer,
//! the observer `WebSocket` and the tests all subscribe to the same stream.
//!
//! # Design
//!
//! The bus wraps a [`tokio::sync::broadcast`] channel. Publishing never
//! blocks and never fails: with no subscribers the event is dropped, and a
//! subscriber that falls behind skips ahead (see
//! [`broadcast::error::RecvError::Lagged`]). Delivery to players is the
//! session layer's job; the engine only says who should hear what.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use ballast_types::{
    Ambience, DangerLevel, EscortPhase, ItemCategory, ItemId, Owner, PlayerId, RoomId,
};

/// Default capacity of the broadcast channel.
pub const DEFAULT_BUS_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// Audience and events
// ---------------------------------------------------------------------------

/// Who should receive a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Audience {
    /// Every connected player.
    World,
    /// Everyone in one room.
    Room(RoomId),
    /// A single player.
    Player(PlayerId),
}

/// A notification raised by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneEvent {
    /// A text message for some audience.
    Message {
        /// Recipients.
        audience: Audience,
        /// Rendered text.
        text: String,
    },
    /// A tracked item was created, destroyed, moved or re-flagged.
    ItemChanged {
        /// The item.
        item: ItemId,
        /// Its category.
        category: ItemCategory,
        /// Holder before (`None` on create).
        before: Option<Owner>,
        /// Holder after (`None` on destroy).
        after: Option<Owner>,
        /// Signed change in global weight.
        delta: Decimal,
    },
    /// The capacity monitor observed a new danger level.
    DangerLevelChanged {
        /// Previous level.
        from: DangerLevel,
        /// New level.
        to: DangerLevel,
        /// Global total at the time of the tick.
        global_total: Decimal,
    },
    /// Ambient atmosphere line for the current intensity.
    Ambient {
        /// Intensity the line was drawn from.
        ambience: Ambience,
        /// Rendered text.
        text: String,
    },
    /// A masterpiece was crafted. Never names the crafter.
    Masterpiece {
        /// Item name.
        item_name: String,
        /// Where it was made.
        room: Option<RoomId>,
        /// Human-readable room name.
        location: String,
    },
    /// A hoarding fine was levied.
    Fined {
        /// The offender.
        target: PlayerId,
        /// Strike number.
        strike: u32,
        /// Fine amount.
        amount: u32,
        /// Whether the offender's balance covered it.
        paid: bool,
    },
    /// An escort phase executed.
    Escort {
        /// The offender.
        target: PlayerId,
        /// The phase that ran.
        phase: EscortPhase,
    },
    /// A gift offer was resolved.
    GiftResolved {
        /// The item.
        item: ItemId,
        /// The giver.
        giver: PlayerId,
        /// The recipient.
        recipient: PlayerId,
        /// Whether the recipient ended up with it.
        accepted: bool,
    },
}

impl ZoneEvent {
    /// Shorthand for a world-wide message.
    pub fn world(text: impl Into<String>) -> Self {
        Self::Message {
            audience: Audience::World,
            text: text.into(),
        }
    }

    /// Shorthand for a message to one player.
    pub fn player(player: PlayerId, text: impl Into<String>) -> Self {
        Self::Message {
            audience: Audience::Player(player),
            text: text.into(),
        }
    }

    /// Shorthand for a message to one room.
    pub fn room(room: RoomId, text: impl Into<String>) -> Self {
        Self::Message {
            audience: Audience::Room(room),
            text: text.into(),
        }
    }
}

/// A published event with its publication time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Monotonic sequence number assigned by the bus.
    pub seq: u64,
    /// Wall-clock publication time.
    pub published_at: DateTime<Utc>,
    /// The event.
    pub event: ZoneEvent,
}

// ---------------------------------------------------------------------------
// Bus
// ---------------------------------------------------------------------------

/// Broadcast fan-out of [`ZoneEvent`]s.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Envelope>,
    seq: std::sync::atomic::AtomicU64,
}

impl EventBus {
    /// Create a bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            seq: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Publish an event. Returns the number of subscribers that will see it.
    pub fn publish(&self, event: ZoneEvent) -> usize {
        let seq = self
            .seq
            .fetch_add(1, std::sync::atomic::Ordering::AcqRel);
        let envelope = Envelope {
            seq,
            published_at: Utc::now(),
            event,
        };
        match self.tx.send(envelope) {
            Ok(receivers) => receivers,
            Err(_unheard) => {
                trace!(seq, "zone event published with no subscribers");
                0
            }
        }
    }

    /// Subscribe to every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

/// Drain every event currently buffered in a receiver.
///
/// Lagged gaps are skipped. Intended for tests and batch consumers.
pub fn drain(rx: &mut broadcast::Receiver<Envelope>) -> Vec<ZoneEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(envelope) => events.push(envelope.event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(
                broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
            ) => return events,
        }
    }
}
