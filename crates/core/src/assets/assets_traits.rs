use coinfeed_market_data::AssetRecord;

use crate::errors::Result;

/// Trait defining the contract for the latest-record-per-asset store.
///
/// Records are keyed by uppercase symbol. Reads return owned copies and
/// never observe a partially applied `upsert`.
pub trait AssetRepositoryTrait: Send + Sync {
    /// Insert or replace records by symbol, then persist.
    /// Returns the number of records applied; records without an id or
    /// symbol are ignored.
    fn upsert(&self, records: Vec<AssetRecord>) -> Result<usize>;
    fn get_all(&self) -> Vec<AssetRecord>;
    /// Case-insensitive lookup.
    fn get_by_symbol(&self, symbol: &str) -> Option<AssetRecord>;
    /// Up to `limit` records ordered by descending volume; unknown volume ranks as zero.
    /// Equal volumes keep symbol order, not insertion order.
    fn get_top_by_volume(&self, limit: usize) -> Vec<AssetRecord>;
    fn save(&self) -> Result<()>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
