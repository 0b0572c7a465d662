//! Zone snapshots.
//!
//! A [`ZoneSnapshot`] captures everything that must survive a restart:
//! - tracked items with their flags and holders;
//! - shelf claims and contents;
//! - shop listings;
//! - the pool balance and wallets;
//! - the danger level last announced by the capacity monitor;
//! - enforcement records;
//! - pending gifts and timed actions.
//!
//! Snapshots are plain JSON written through a [`SnapshotStore`]. Timed
//! actions are stored with wall-clock deadlines; on restore, anything
//! already overdue fires once, in deadline order, on the runner's first
//! wake-up.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use ballast_ledger::{LedgerError, WeightLedger};
use ballast_players::{GiftBook, GiftOffer};
use ballast_types::{DangerLevel, EnforcementRecord, Holding, PlayerId, ShelfId};
use ballast_world::{DisplayShelf, Shop};

use crate::monitor::danger_level;
use crate::scheduler::PendingAction;
use crate::zone::Zone;

/// Current snapshot layout.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors from saving or loading snapshots.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The snapshot file could not be read or written.
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The snapshot is not valid JSON for this layout.
    #[error("snapshot JSON error: {source}")]
    Json {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },

    /// The snapshot was written by an incompatible version.
    #[error("snapshot version {found} is not supported (expected {expected})")]
    Version {
        /// Version in the file.
        found: u32,
        /// Version this build writes.
        expected: u32,
    },

    /// The stored holdings do not form a consistent ledger.
    #[error("snapshot ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },
}

/// Everything persisted across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    /// Layout version.
    pub version: u32,
    /// When the snapshot was taken.
    pub taken_at: DateTime<Utc>,
    /// Every tracked item and its holder.
    pub holdings: Vec<Holding>,
    /// Shelf claims.
    pub shelf_claims: Vec<(ShelfId, PlayerId)>,
    /// Shelf fixtures and their contents.
    pub shelves: Vec<DisplayShelf>,
    /// Shop counters and their listings.
    pub shops: Vec<Shop>,
    /// Feedstock pool balance.
    pub pool_balance: u64,
    /// Personal balances.
    pub wallets: Vec<(PlayerId, i64)>,
    /// Danger level last announced. Missing in older files, in which case
    /// it is recomputed from the restored total.
    #[serde(default)]
    pub danger_level: Option<DangerLevel>,
    /// Enforcement records.
    pub records: Vec<EnforcementRecord>,
    /// Unanswered gift offers.
    pub gifts: Vec<GiftOffer>,
    /// Pending timed actions.
    pub actions: Vec<PendingAction>,
}

/// Somewhere to keep a snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot, replacing the previous one.
    fn save(&self, snapshot: &ZoneSnapshot) -> Result<(), SnapshotError>;

    /// Load the last snapshot, or `None` if there is none yet.
    fn load(&self) -> Result<Option<ZoneSnapshot>, SnapshotError>;
}

/// Pretty-printed JSON in a single file, replaced atomically.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store snapshots at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(ToOwned::to_owned).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, snapshot: &ZoneSnapshot) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec_pretty(snapshot)?;
        let staging = self.staging_path();
        std::fs::write(&staging, json).map_err(|source| SnapshotError::Io {
            path: staging.clone(),
            source,
        })?;
        std::fs::rename(&staging, &self.path).map_err(|source| SnapshotError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), items = snapshot.holdings.len(), "Snapshot saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<ZoneSnapshot>, SnapshotError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No snapshot on disk");
                return Ok(None);
            }
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let snapshot: ZoneSnapshot = serde_json::from_slice(&bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(Some(snapshot))
    }
}

impl Zone {
    /// Capture the zone's persistent state.
    pub async fn snapshot(&self) -> ZoneSnapshot {
        let handles: Vec<Arc<Mutex<EnforcementRecord>>> =
            self.records.lock().await.values().cloned().collect();
        let mut records = Vec::with_capacity(handles.len());
        for handle in handles {
            records.push(handle.lock().await.clone());
        }

        let gifts: Vec<GiftOffer> = self.gifts.lock().await.iter().copied().collect();
        let shelves: Vec<DisplayShelf> = self.shelves.lock().await.values().cloned().collect();
        let (holdings, shelf_claims) = {
            let ledger = self.ledger.lock().await;
            (
                ledger.holdings().cloned().collect::<Vec<_>>(),
                ledger.shelf_claims().collect::<Vec<_>>(),
            )
        };
        let pool_balance = self.pool.lock().await.balance();
        let wallets: Vec<(PlayerId, i64)> = self.wallets.lock().await.iter().collect();
        let level = self.monitor.lock().await.level();
        let shops: Vec<Shop> = self.shops.lock().await.values().cloned().collect();
        let actions = self.scheduler.lock().await.pending();

        ZoneSnapshot {
            version: SNAPSHOT_VERSION,
            taken_at: Utc::now(),
            holdings,
            shelf_claims,
            shelves,
            shops,
            pool_balance,
            wallets,
            danger_level: Some(level),
            records,
            gifts,
            actions,
        }
    }

    /// Replace the zone's state with a snapshot. Call before
    /// [`start`](Self::start); restored recurring actions are kept and
    /// `start` only adds the ones that are missing.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Ledger`] if the holdings are inconsistent;
    /// the zone is left untouched in that case.
    pub async fn restore(&self, snapshot: ZoneSnapshot) -> Result<(), SnapshotError> {
        let ledger = WeightLedger::restore(snapshot.holdings, snapshot.shelf_claims)?;
        let items = ledger.tracked_count();
        let global_total = ledger.global_total();

        {
            let mut records = self.records.lock().await;
            records.clear();
            for record in snapshot.records {
                records.insert(record.player, Arc::new(Mutex::new(record)));
            }
        }
        *self.gifts.lock().await = GiftBook::restore(snapshot.gifts);
        *self.shelves.lock().await = snapshot
            .shelves
            .into_iter()
            .map(|shelf| (shelf.id, shelf))
            .collect::<BTreeMap<_, _>>();
        *self.ledger.lock().await = ledger;
        self.pool.lock().await.restore_balance(snapshot.pool_balance);
        {
            let mut wallets = self.wallets.lock().await;
            for (player, balance) in snapshot.wallets {
                wallets.set(player, balance);
            }
        }
        *self.shops.lock().await = snapshot
            .shops
            .into_iter()
            .map(|shop| (shop.id, shop))
            .collect::<BTreeMap<_, _>>();
        let level = snapshot.danger_level.unwrap_or_else(|| {
            danger_level(
                global_total,
                self.config.zone.item_limit,
                &self.config.zone.thresholds,
            )
        });
        self.monitor.lock().await.restore(level);
        let actions = snapshot.actions.len();
        self.scheduler.lock().await.restore(snapshot.actions);

        info!(
            taken_at = %snapshot.taken_at,
            items,
            global_total = %global_total,
            ?level,
            actions,
            "Zone restored from snapshot"
        );
        Ok(())
    }
}
