//! Epoch-keyed reward config cache.
//!
//! A config is resolved once per epoch and keyed by the epoch's start block:
//!
//! ```text
//! rem = n % epoch
//! key = n - epoch   if rem == 0
//!       n - rem     otherwise
//! ```
//!
//! so a block that is an exact multiple of the epoch length belongs to the
//! epoch that starts one epoch earlier. Rewards are computed near the chain
//! head, so only a handful of epochs are kept.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::config::RewardConfig;
use crate::sources::{GovernanceSource, SourceError};
use crate::{Result, RewardError};

/// Default number of cached epochs.
pub const DEFAULT_CACHE_CAPACITY: usize = 3;

/// Epoch-start key for `block_number`.
///
/// # Errors
///
/// - [`RewardError::ConfigInvariantViolation`] if `epoch` is zero
pub fn epoch_start(block_number: u64, epoch: u64) -> Result<u64> {
    if epoch == 0 {
        return Err(RewardError::ConfigInvariantViolation(
            "epoch length is zero".to_string(),
        ));
    }
    let remainder = block_number % epoch;
    if remainder == 0 {
        Ok(block_number.saturating_sub(epoch))
    } else {
        Ok(block_number - remainder)
    }
}

/// Hit/miss counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that fetched parameters from governance.
    pub misses: u64,
}

/// Bounded cache of resolved reward configs.
pub struct RewardConfigCache {
    entries: Mutex<LruCache<u64, Arc<RewardConfig>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RewardConfigCache {
    /// Create a cache holding up to `capacity` epochs (at least one).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Resolve the config for the epoch containing `block_number`.
    ///
    /// On a miss the full parameter set is fetched at the epoch-start key.
    /// The lock is not held during the fetch, so concurrent lookups of other
    /// epochs proceed; if two callers miss the same epoch, the first insert
    /// wins and both get that instance.
    ///
    /// # Errors
    ///
    /// - [`RewardError::ConfigUnavailable`] if governance cannot answer
    /// - [`RewardError::ConfigParse`] / [`RewardError::ConfigInvariantViolation`]
    ///   if the parameters do not decode into a valid config
    pub fn get(
        &self,
        block_number: u64,
        source: &dyn GovernanceSource,
    ) -> Result<Arc<RewardConfig>> {
        self.resolve(block_number, source, true)
    }

    /// Like [`RewardConfigCache::get`], but a miss is never inserted when
    /// `cacheable` is false.
    ///
    /// Used for lookups whose parameters were read at a height other than
    /// the epoch key (e.g. clamped to the chain head): the result is correct
    /// for the caller but must not be served to later blocks of the epoch.
    ///
    /// # Errors
    ///
    /// See [`RewardConfigCache::get`].
    pub fn resolve(
        &self,
        block_number: u64,
        source: &dyn GovernanceSource,
        cacheable: bool,
    ) -> Result<Arc<RewardConfig>> {
        let epoch = source.epoch_length_at(block_number).map_err(|e| {
            warn!(block_number, err = %e, "epoch length lookup failed");
            source_error(block_number, e)
        })?;
        let key = epoch_start(block_number, epoch)?;

        if let Some(config) = self.entries.lock().get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(block_number, key, "reward config cache hit");
            return Ok(config);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let params = source.params_at(key).map_err(|e| {
            warn!(block_number, key, err = %e, "governance params lookup failed");
            source_error(key, e)
        })?;
        let config = Arc::new(RewardConfig::from_params(key, &params)?);

        if !cacheable {
            debug!(block_number, key, "reward config resolved without caching");
            return Ok(config);
        }

        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(&key) {
            return Ok(Arc::clone(existing));
        }
        entries.put(key, Arc::clone(&config));
        drop(entries);

        info!(
            key,
            epoch,
            minting_amount = %config.minting_amount,
            ratio = %config.ratio_string(),
            stake_weighted = config.stake_split.is_some(),
            "resolved reward config"
        );

        Ok(config)
    }

    /// Insert a config directly.
    pub fn insert(&self, key: u64, config: Arc<RewardConfig>) {
        self.entries.lock().put(key, config);
    }

    /// Whether an epoch key is cached. Does not touch recency.
    pub fn contains(&self, key: u64) -> bool {
        self.entries.lock().contains(&key)
    }

    /// Number of cached epochs.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Hit/miss counters since creation.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

fn source_error(height: u64, err: SourceError) -> RewardError {
    match err {
        SourceError::Decode(e) => RewardError::from(e),
        SourceError::Unavailable(reason) => RewardError::ConfigUnavailable { height, reason },
    }
}

impl Default for RewardConfigCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
