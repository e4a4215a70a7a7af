use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::forest::Forest;
use crate::error::StoreError;
use crate::store::CommentStore;

/// One recipe's entry. A refetch only stores its result if `generation` is
/// unchanged since the fetch started; `invalidate` moves it on.
#[derive(Debug)]
struct Slot {
    generation: u64,
    forest: Option<Arc<Forest>>,
    fetched_at: Instant,
}

/// Built forests per recipe. Mutations invalidate instead of patching.
///
/// Entries older than `cache_time` are swept whenever a new forest is
/// stored, so recipes nobody reads any more do not stay resident.
#[derive(Debug)]
pub struct ForestCache {
    stale_after: Duration,
    cache_time: Duration,
    generations: AtomicU64,
    slots: RwLock<HashMap<String, Slot>>,
}

impl ForestCache {
    pub fn new(stale_after: Duration, cache_time: Duration) -> Self {
        Self {
            stale_after,
            cache_time,
            generations: AtomicU64::new(0),
            slots: RwLock::new(HashMap::new()),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The cached forest if still fresh, otherwise a refetch and rebuild.
    pub async fn forest(
        &self,
        recipe_id: &str,
        store: &dyn CommentStore,
    ) -> Result<Arc<Forest>, StoreError> {
        {
            let slots = self.slots.read().await;
            if let Some(Slot {
                forest: Some(forest),
                fetched_at,
                ..
            }) = slots.get(recipe_id)
            {
                if fetched_at.elapsed() < self.stale_after {
                    return Ok(Arc::clone(forest));
                }
            }
        }

        let generation = {
            let mut slots = self.slots.write().await;
            let slot = slots.entry(recipe_id.to_string()).or_insert_with(|| Slot {
                generation: self.next_generation(),
                forest: None,
                fetched_at: Instant::now(),
            });
            slot.generation
        };

        let records = store.list_comments(recipe_id).await?;
        let forest = Arc::new(Forest::build(records));

        let mut slots = self.slots.write().await;
        match slots.get_mut(recipe_id) {
            Some(slot) if slot.generation == generation => {
                slot.forest = Some(Arc::clone(&forest));
                slot.fetched_at = Instant::now();
                tracing::debug!(recipe_id, comments = forest.len(), "comment forest rebuilt");
            }
            _ => {
                tracing::debug!(recipe_id, "comment forest invalidated during refetch, not stored");
            }
        }
        self.sweep(&mut slots, recipe_id);

        Ok(forest)
    }

    /// Drops the cached forest and makes any refetch already in flight
    /// discard its result.
    pub async fn invalidate(&self, recipe_id: &str) {
        let generation = self.next_generation();
        if let Some(slot) = self.slots.write().await.get_mut(recipe_id) {
            slot.generation = generation;
            slot.forest = None;
            slot.fetched_at = Instant::now();
            tracing::debug!(recipe_id, "comment forest invalidated");
        }
    }

    fn sweep(&self, slots: &mut HashMap<String, Slot>, keep: &str) {
        let before = slots.len();
        slots.retain(|id, slot| id == keep || slot.fetched_at.elapsed() < self.cache_time);
        let evicted = before - slots.len();
        if evicted > 0 {
            tracing::debug!(evicted, "expired comment forests evicted");
        }
    }
}
