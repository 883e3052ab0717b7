use std::fmt;

use moka::future::Cache;

use super::config::SifenConfig;
use crate::core::{InvoiceDocument, LookupResult, TaxpayerRecord};

/// Which lookup a cache entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Taxpayer,
    Document,
}

impl EntityKind {
    fn segment(self) -> &'static str {
        match self {
            Self::Taxpayer => "ruc",
            Self::Document => "dte",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// `sifen:ruc:<ruc>` / `sifen:dte:<cdc>`.
pub fn cache_key(kind: EntityKind, id: &str) -> String {
    format!("sifen:{}:{}", kind.segment(), id.trim())
}

/// In-process TTL caches for lookup results, one per entity kind.
///
/// Cloning is cheap and clones share entries. A disabled cache stores nothing
/// and never hits.
#[derive(Clone)]
pub struct LookupCache {
    taxpayers: Option<Cache<String, LookupResult<TaxpayerRecord>>>,
    documents: Option<Cache<String, LookupResult<InvoiceDocument>>>,
}

impl LookupCache {
    /// Build the caches from `config`, or a disabled cache when caching is off.
    pub fn new(config: &SifenConfig) -> Self {
        if !config.cache_enabled {
            return Self::disabled();
        }
        Self {
            taxpayers: Some(
                Cache::builder()
                    .time_to_live(config.ruc_ttl())
                    .max_capacity(config.cache_capacity)
                    .build(),
            ),
            documents: Some(
                Cache::builder()
                    .time_to_live(config.dte_ttl())
                    .max_capacity(config.cache_capacity)
                    .build(),
            ),
        }
    }

    pub fn disabled() -> Self {
        Self {
            taxpayers: None,
            documents: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.taxpayers.is_some()
    }

    pub async fn taxpayer(&self, ruc: &str) -> Option<LookupResult<TaxpayerRecord>> {
        lookup(self.taxpayers.as_ref(), cache_key(EntityKind::Taxpayer, ruc)).await
    }

    pub async fn store_taxpayer(&self, ruc: &str, result: LookupResult<TaxpayerRecord>) {
        store(self.taxpayers.as_ref(), cache_key(EntityKind::Taxpayer, ruc), result).await;
    }

    pub async fn document(&self, cdc: &str) -> Option<LookupResult<InvoiceDocument>> {
        lookup(self.documents.as_ref(), cache_key(EntityKind::Document, cdc)).await
    }

    pub async fn store_document(&self, cdc: &str, result: LookupResult<InvoiceDocument>) {
        store(self.documents.as_ref(), cache_key(EntityKind::Document, cdc), result).await;
    }

    /// Drop one entry.
    pub async fn invalidate(&self, kind: EntityKind, id: &str) {
        let key = cache_key(kind, id);
        match kind {
            EntityKind::Taxpayer => {
                if let Some(cache) = &self.taxpayers {
                    cache.invalidate(&key).await;
                }
            }
            EntityKind::Document => {
                if let Some(cache) = &self.documents {
                    cache.invalidate(&key).await;
                }
            }
        }
        tracing::info!(key = %key, "cache entry invalidated");
    }

    /// Drop every entry of every kind.
    pub fn invalidate_all(&self) {
        if let Some(cache) = &self.taxpayers {
            cache.invalidate_all();
        }
        if let Some(cache) = &self.documents {
            cache.invalidate_all();
        }
        tracing::info!("cache cleared");
    }

    /// Approximate number of live entries for `kind`.
    pub async fn entry_count(&self, kind: EntityKind) -> u64 {
        match kind {
            EntityKind::Taxpayer => count(self.taxpayers.as_ref()).await,
            EntityKind::Document => count(self.documents.as_ref()).await,
        }
    }
}

impl fmt::Debug for LookupCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupCache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

async fn lookup<V>(cache: Option<&Cache<String, V>>, key: String) -> Option<V>
where
    V: Clone + Send + Sync + 'static,
{
    let cache = cache?;
    let hit = cache.get(&key).await;
    if hit.is_some() {
        tracing::info!(key = %key, "cache hit");
    } else {
        tracing::debug!(key = %key, "cache miss");
    }
    hit
}

async fn store<V>(cache: Option<&Cache<String, V>>, key: String, value: V)
where
    V: Clone + Send + Sync + 'static,
{
    if let Some(cache) = cache {
        tracing::info!(key = %key, "cache set");
        cache.insert(key, value).await;
    }
}

async fn count<V>(cache: Option<&Cache<String, V>>) -> u64
where
    V: Clone + Send + Sync + 'static,
{
    match cache {
        Some(cache) => {
            cache.run_pending_tasks().await;
            cache.entry_count()
        }
        None => 0,
    }
}
