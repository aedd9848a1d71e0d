use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::application::interfaces::page_cache::{PageCache, PageLookup};

struct CachedPage {
    body: Vec<u8>,
    rendered_at: DateTime<Utc>,
}

#[derive(Default)]
struct PathSlot {
    generation: u64,
    page: Option<CachedPage>,
}

/// Process-local page cache. Revalidating a path drops its page and bumps the path's
/// generation, so a rendering started before the revalidation can no longer be stored.
#[derive(Default)]
pub struct InMemoryPageCache {
    slots: DashMap<String, PathSlot>,
}

impl InMemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageCache for InMemoryPageCache {
    async fn get(&self, path: &str) -> PageLookup {
        match self.slots.get(path) {
            Some(slot) => PageLookup {
                rendered: slot.page.as_ref().map(|page| page.body.clone()),
                generation: slot.generation,
            },
            None => PageLookup::default(),
        }
    }

    async fn store(&self, path: &str, generation: u64, rendered: Vec<u8>) -> bool {
        let mut slot = self.slots.entry(path.to_string()).or_default();
        if slot.generation != generation {
            debug!(
                path,
                seen = generation,
                current = slot.generation,
                "page_cache: stale rendering dropped"
            );
            return false;
        }

        slot.page = Some(CachedPage {
            body: rendered,
            rendered_at: Utc::now(),
        });
        true
    }

    async fn revalidate_path(&self, path: &str) -> Result<()> {
        let mut slot = self.slots.entry(path.to_string()).or_default();
        slot.generation += 1;
        match slot.page.take() {
            Some(page) => debug!(
                path,
                rendered_at = %page.rendered_at,
                "page_cache: revalidated cached page"
            ),
            None => debug!(path, "page_cache: nothing cached to revalidate"),
        }
        Ok(())
    }
}
