use anyhow::Result;
use async_trait::async_trait;

/// What a read saw for a path: the cached body, if any, and the path's generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLookup {
    pub rendered: Option<Vec<u8>>,
    pub generation: u64,
}

/// Rendered pages keyed by request path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageCache {
    async fn get(&self, path: &str) -> PageLookup;
    /// Caches `rendered` only if `path` is still at `generation`. Returns whether it
    /// was stored.
    async fn store(&self, path: &str, generation: u64, rendered: Vec<u8>) -> bool;
    /// Marks whatever is cached for `path` as stale so the next read renders again.
    async fn revalidate_path(&self, path: &str) -> Result<()>;
}
