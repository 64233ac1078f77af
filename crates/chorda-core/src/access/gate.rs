//! ============================================================================
//! Access Gate - Cached Gate Checking for the Request Path
//! ============================================================================
//! Wraps the evaluator with a bounded, TTL'd result cache so repeated track
//! plays don't hit RPC on every request. Capacity is fixed, expiry is
//! timestamp-based, and negative results caused by transient ledger
//! failures are never cached.
//! ============================================================================

use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::ledger::LedgerReader;

use super::evaluator::TokenGateEvaluator;
use super::types::{AccessTier, GateConfig, GateResult, DEFAULT_REQUIRED_AMOUNT};

/// Default cache duration in seconds (5 minutes)
pub const DEFAULT_CACHE_DURATION_SECS: i64 = 300;

/// Maximum number of entries in the result cache to prevent unbounded growth
const MAX_CACHE_SIZE: usize = 1000;

/// Cached evaluation outcome
#[derive(Debug, Clone)]
struct CachedResult {
    result: GateResult,
    cached_at: i64,
}

/// Gate checker with caching for efficient repeated lookups
pub struct AccessGate {
    ledger: Arc<dyn LedgerReader>,
    cache: Arc<RwLock<HashMap<String, CachedResult>>>,
    cache_duration_secs: i64,
}

impl AccessGate {
    /// Create a gate with the default cache duration.
    pub fn new(ledger: Arc<dyn LedgerReader>) -> Self {
        Self::with_cache_duration(ledger, DEFAULT_CACHE_DURATION_SECS)
    }

    pub fn with_cache_duration(ledger: Arc<dyn LedgerReader>, cache_duration_secs: i64) -> Self {
        Self {
            ledger,
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_duration_secs,
        }
    }

    /// Check a wallet against a gate, using the cache when possible.
    pub async fn check(&self, wallet: &Pubkey, config: &GateConfig) -> GateResult {
        let key = cache_key(wallet, config);
        let now = chrono::Utc::now().timestamp();

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&key) {
                if now - cached.cached_at < self.cache_duration_secs {
                    debug!(
                        "gate cache hit for {} (age: {}s)",
                        wallet,
                        now - cached.cached_at
                    );
                    return cached.result.clone();
                }
            }
        }

        debug!("gate cache miss for {}, evaluating", wallet);
        let result = TokenGateEvaluator::new(self.ledger.as_ref())
            .evaluate(Some(wallet), config)
            .await;

        // A transient failure should be retried on the next request, not
        // pinned into the cache for the full TTL
        if result.error.is_none() {
            let mut cache = self.cache.write().await;
            if cache.len() >= MAX_CACHE_SIZE {
                if let Some(oldest_key) = cache
                    .iter()
                    .min_by_key(|(_, v)| v.cached_at)
                    .map(|(k, _)| k.clone())
                {
                    cache.remove(&oldest_key);
                }
            }
            cache.insert(
                key,
                CachedResult {
                    result: result.clone(),
                    cached_at: now,
                },
            );
        }

        result
    }

    /// Check a gate and resolve the measured balance to a listener tier.
    pub async fn check_tier(&self, wallet: &Pubkey, config: &GateConfig) -> (AccessTier, GateResult) {
        let result = self.check(wallet, config).await;
        (AccessTier::from_balance(result.measured_balance), result)
    }

    /// Invalidate every cached result for a wallet (e.g. after a purchase
    /// or token transfer).
    pub async fn invalidate(&self, wallet: &Pubkey) {
        let prefix = format!("{wallet}:");
        let mut cache = self.cache.write().await;
        let before = cache.len();
        cache.retain(|key, _| !key.starts_with(&prefix));
        let removed = before - cache.len();
        if removed > 0 {
            info!("invalidated {} cached gate result(s) for {}", removed, wallet);
        }
    }

    /// Clear the entire cache
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        let count = cache.len();
        cache.clear();
        info!("cleared {} cached gate result(s)", count);
    }

    /// Get cache statistics: (total entries, unexpired entries)
    pub async fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.read().await;
        let now = chrono::Utc::now().timestamp();
        let total = cache.len();
        let valid = cache
            .values()
            .filter(|c| now - c.cached_at < self.cache_duration_secs)
            .count();
        (total, valid)
    }
}

/// One cache slot per (wallet, gate shape) pair.
fn cache_key(wallet: &Pubkey, config: &GateConfig) -> String {
    format!(
        "{}:{:?}:{}:{}:{}",
        wallet,
        config.kind,
        config.required_mint.as_deref().unwrap_or("-"),
        config.required_amount.unwrap_or(DEFAULT_REQUIRED_AMOUNT),
        config.collection_address.as_deref().unwrap_or("-"),
    )
}
