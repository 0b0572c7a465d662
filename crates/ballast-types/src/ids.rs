//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every tracked entity in the zone has a strongly-typed ID so a shelf can
//! never be passed where a player is expected. All IDs use UUID v7
//! (time-ordered) so snapshots list entities in creation order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a player character.
    PlayerId
}

define_id! {
    /// Unique identifier for a tracked item.
    ItemId
}

define_id! {
    /// Unique identifier for a claimable display shelf.
    ShelfId
}

define_id! {
    /// Unique identifier for a shop counter.
    ShopId
}

define_id! {
    /// Unique identifier for a room. Room content and topology live outside
    /// the engine; only the identity crosses the boundary.
    RoomId
}

define_id! {
    /// Unique identifier for a pending gift offer.
    GiftId
}
