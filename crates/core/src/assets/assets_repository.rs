use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, error, info, warn};

use coinfeed_market_data::AssetRecord;

use super::assets_traits::AssetRepositoryTrait;
use super::snapshot::{load_snapshot, write_snapshot};
use crate::errors::Result;

/// In-memory asset store backed by a JSON snapshot file.
///
/// The map is guarded by an `RwLock` and is only held for the duration of
/// a copy or an in-place update; disk I/O never runs under it. Saves are
/// serialized through a separate writer lock and copy the map only after
/// acquiring it, so the file on disk is never older than the last save
/// that completed.
pub struct AssetRepository {
    storage_path: PathBuf,
    assets: RwLock<BTreeMap<String, AssetRecord>>,
    write_lock: Mutex<()>,
}

impl AssetRepository {
    /// Creates a repository, loading whatever the snapshot at `storage_path` holds.
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();
        let assets = load_snapshot(&storage_path);
        info!(
            "Loaded {} asset(s) from {}",
            assets.len(),
            storage_path.display()
        );

        Self {
            storage_path,
            assets: RwLock::new(assets),
            write_lock: Mutex::new(()),
        }
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    fn read_assets(&self) -> RwLockReadGuard<'_, BTreeMap<String, AssetRecord>> {
        self.assets.read().unwrap_or_else(|poisoned| {
            warn!("Asset repository lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_assets(&self) -> RwLockWriteGuard<'_, BTreeMap<String, AssetRecord>> {
        self.assets.write().unwrap_or_else(|poisoned| {
            warn!("Asset repository lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|poisoned| {
            warn!("Snapshot writer lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl AssetRepositoryTrait for AssetRepository {
    fn upsert(&self, records: Vec<AssetRecord>) -> Result<usize> {
        let mut applied = 0;
        let mut ignored = 0;

        {
            let mut assets = self.write_assets();
            for mut record in records {
                if !record.is_valid() {
                    ignored += 1;
                    continue;
                }
                record.symbol = record.symbol.trim().to_uppercase();
                assets.insert(record.symbol.clone(), record);
                applied += 1;
            }
        }

        if ignored > 0 {
            debug!("Ignored {} record(s) without an id or symbol", ignored);
        }
        debug!("Upserted {} asset(s)", applied);

        self.save()?;
        Ok(applied)
    }

    fn get_all(&self) -> Vec<AssetRecord> {
        self.read_assets().values().cloned().collect()
    }

    fn get_by_symbol(&self, symbol: &str) -> Option<AssetRecord> {
        let key = symbol.trim().to_uppercase();
        self.read_assets().get(&key).cloned()
    }

    fn get_top_by_volume(&self, limit: usize) -> Vec<AssetRecord> {
        let mut assets = self.get_all();
        assets.sort_by(|a, b| b.volume_or_zero().total_cmp(&a.volume_or_zero()));
        assets.truncate(limit);
        assets
    }

    fn save(&self) -> Result<()> {
        let _writer = self.lock_writer();
        let snapshot = self.get_all();

        write_snapshot(&self.storage_path, &snapshot).inspect_err(|e| {
            error!(
                "Failed to save snapshot to {}: {}",
                self.storage_path.display(),
                e
            )
        })?;

        debug!(
            "Saved {} asset(s) to {}",
            snapshot.len(),
            self.storage_path.display()
        );
        Ok(())
    }

    fn len(&self) -> usize {
        self.read_assets().len()
    }
}
