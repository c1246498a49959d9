//! JSON snapshot file for the asset repository.
//!
//! Reads are lenient: anything short of a readable JSON array or object
//! yields an empty map, and bad entries are dropped one by one. Writes are
//! atomic: the snapshot goes to `<file>.tmp` next to the target, is synced,
//! then renamed over the target.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use serde_json::Value;

use coinfeed_market_data::{normalize_item, normalize_item_with_symbol, AssetRecord};

use crate::errors::{Error, Result};

/// Load the snapshot at `path`, keyed by uppercase symbol.
///
/// Never fails: a missing, unreadable or malformed file is logged and
/// treated as empty.
pub fn load_snapshot(path: &Path) -> BTreeMap<String, AssetRecord> {
    match fs::read_to_string(path) {
        Ok(raw) => parse_snapshot(&raw, path),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(
                "No snapshot found at {}, starting with an empty repository",
                path.display()
            );
            BTreeMap::new()
        }
        Err(e) => {
            error!("Failed to read snapshot {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

/// Parse snapshot contents. Accepts a JSON array of records or an object
/// mapping symbol to record; `source` is only used in log messages.
pub fn parse_snapshot(raw: &str, source: &Path) -> BTreeMap<String, AssetRecord> {
    let mut assets = BTreeMap::new();
    if raw.trim().is_empty() {
        debug!("Snapshot {} is empty", source.display());
        return assets;
    }

    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            error!("Invalid JSON in snapshot {}: {}", source.display(), e);
            return assets;
        }
    };

    match value {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                match normalize_item(item) {
                    Ok(record) => {
                        assets.insert(record.symbol.clone(), record);
                    }
                    Err(reason) => warn!(
                        "Skipping snapshot entry {} in {}: {}",
                        index,
                        source.display(),
                        reason
                    ),
                }
            }
        }
        Value::Object(entries) => {
            for (key, item) in &entries {
                match normalize_item_with_symbol(item, Some(key)) {
                    Ok(record) => {
                        assets.insert(record.symbol.clone(), record);
                    }
                    Err(reason) => warn!(
                        "Skipping snapshot entry '{}' in {}: {}",
                        key,
                        source.display(),
                        reason
                    ),
                }
            }
        }
        _ => warn!(
            "Unexpected snapshot format in {} (expected an array or object), starting empty",
            source.display()
        ),
    }

    assets
}

/// Atomically replace the snapshot at `path` with `records`.
///
/// On failure the temporary file is removed and the previous snapshot is
/// left as it was.
pub fn write_snapshot(path: &Path, records: &[AssetRecord]) -> Result<()> {
    let tmp_path = tmp_path_for(path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let result = write_then_rename(path, &tmp_path, records);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Path of the temporary file used while writing `path`.
pub fn tmp_path_for(path: &Path) -> Result<PathBuf> {
    let mut name = path
        .file_name()
        .ok_or_else(|| {
            Error::Repository(format!("Invalid snapshot path: {}", path.display()))
        })?
        .to_os_string();
    name.push(".tmp");
    Ok(path.with_file_name(name))
}

fn write_then_rename(path: &Path, tmp_path: &Path, records: &[AssetRecord]) -> Result<()> {
    let json = serde_json::to_vec_pretty(records)?;

    let mut file = File::create(tmp_path)?;
    file.write_all(&json)?;
    file.flush()?;
    file.sync_all()?;
    drop(file);

    fs::rename(tmp_path, path)?;
    sync_parent_dir(path);
    Ok(())
}

/// Persist the rename itself. Best effort; not every platform supports it.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir,
        None => Path::new("."),
    };
    if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
        debug!("Could not sync directory {}: {}", dir.display(), e);
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}
