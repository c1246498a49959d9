use std::sync::Arc;
use std::time::Duration;

use log::debug;

use coinfeed_market_data::AssetRecord;

use super::assets_traits::AssetRepositoryTrait;
use crate::cache::TtlCache;

/// Read-side facade over the asset repository.
///
/// Derived queries are memoized in a [`TtlCache`] so repeated reads within
/// the TTL skip the copy-and-sort. Results may lag the repository by up to
/// one TTL unless [`invalidate`](Self::invalidate) is called after a write.
pub struct AssetQueryService {
    repository: Arc<dyn AssetRepositoryTrait>,
    cache: TtlCache<Vec<AssetRecord>>,
}

impl AssetQueryService {
    /// Creates a new AssetQueryService instance
    pub fn new(repository: Arc<dyn AssetRepositoryTrait>, cache_ttl: Duration) -> Self {
        Self {
            repository,
            cache: TtlCache::new(cache_ttl),
        }
    }

    pub fn top_by_volume(&self, limit: usize) -> Vec<AssetRecord> {
        let key = format!("top_by_volume:{limit}");
        if let Some(hit) = self.cache.get(&key) {
            debug!("Cache hit for {}", key);
            return hit;
        }

        let assets = self.repository.get_top_by_volume(limit);
        self.cache.set(key, assets.clone());
        assets
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<AssetRecord> {
        self.repository.get_by_symbol(symbol)
    }

    pub fn all(&self) -> Vec<AssetRecord> {
        self.repository.get_all()
    }

    /// Drops every memoized query.
    pub fn invalidate(&self) {
        self.cache.clear();
    }
}
