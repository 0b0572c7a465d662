//! The zone economy and compliance engine.
//!
//! This crate wires the ledger, pool, fixtures and enforcement rules into
//! one [`Zone`](zone::Zone) aggregate and drives every delayed effect from a
//! single timeline.
//!
//! # Modules
//!
//! - [`zone`] -- The `Zone` aggregate, its queries and the lock order.
//! - [`actions`] -- Fixture actions: itemator, dispenser, combine, burn,
//!   eat, shelves.
//! - [`gifts`] -- Gift offers and their resolution.
//! - [`market`] -- Shop browse, buy, sell and restock.
//! - [`compliance`] -- Hoarding reports, fines and the escort sequence.
//! - [`timed`] -- Handlers for fired timed actions.
//! - [`scheduler`] -- One-shot and recurring timed actions.
//! - [`monitor`] -- Capacity monitor, danger levels and the generation gate.
//! - [`config`] -- Configuration loading from `ballast-config.yaml`.
//! - [`topology`] -- Rooms, presence and named places.
//! - [`persist`] -- JSON snapshots.
//! - [`operator`] -- Pause, resume and stop for the runner.
//! - [`runner`] -- The timeline loop.
//! - [`error`] -- [`ZoneError`](error::ZoneError).

pub mod actions;
pub mod compliance;
pub mod config;
pub mod error;
pub mod gifts;
pub mod market;
pub mod monitor;
pub mod operator;
pub mod persist;
pub mod runner;
pub mod scheduler;
pub mod timed;
pub mod topology;
pub mod zone;
