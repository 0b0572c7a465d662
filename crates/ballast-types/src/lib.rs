//! Shared type definitions for the Ballast zone engine.
//!
//! This crate is the single source of truth for identifiers, enumerations
//! and records used across the workspace. Types flow downstream to
//! `TypeScript` via `ts-rs` for the counter-sign dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for every tracked entity
//! - [`enums`] -- Item classification, danger levels, stations, stages
//! - [`structs`] -- Items, ownership, enforcement records, timed payloads

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    Ambience, DangerLevel, EnforcementStage, EscortPhase, ItemCategory, ItemFlag, ShopKind,
    Station, WeightClass,
};
pub use ids::{GiftId, ItemId, PlayerId, RoomId, ShelfId, ShopId};
pub use structs::{
    AshStatement, EnforcementRecord, FineEntry, Holding, Item, ItemFlags, MaterialTag, Owner,
    PoolStatus, Standing, TimedPayload, ZoneStatus, effective_weight,
};
