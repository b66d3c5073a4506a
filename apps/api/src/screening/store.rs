use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::screening::Screening;

const DEFAULT_CAPACITY: usize = 100;

/// In-memory screenings, bounded. Once full, each insert drops the oldest.
#[derive(Clone)]
pub struct ScreeningStore {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    capacity: usize,
    by_id: HashMap<Uuid, Arc<Screening>>,
    /// Insertion order, oldest first.
    order: VecDeque<Uuid>,
}

impl Default for ScreeningStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ScreeningStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                capacity: capacity.max(1),
                by_id: HashMap::new(),
                order: VecDeque::new(),
            })),
        }
    }

    pub async fn insert(&self, screening: Screening) -> Arc<Screening> {
        let screening = Arc::new(screening);
        let mut inner = self.inner.write().await;

        while inner.order.len() >= inner.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.by_id.remove(&oldest);
            debug!("Evicted screening {oldest}");
        }

        inner.order.push_back(screening.id);
        inner.by_id.insert(screening.id, Arc::clone(&screening));
        screening
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Screening>> {
        self.inner.read().await.by_id.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::Document;

    fn screening(jd: &str) -> Screening {
        Screening::new(Document::new("jd.txt", jd), vec![], vec![])
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let store = ScreeningStore::default();
        let stored = store.insert(screening("Go")).await;

        let fetched = store.get(stored.id).await.unwrap();
        assert_eq!(fetched.job_description.filename, "jd.txt");
        assert_eq!(store.len().await, 1);
        assert!(store.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_full_store_drops_oldest() {
        let store = ScreeningStore::with_capacity(2);
        let first = store.insert(screening("one")).await;
        let second = store.insert(screening("two")).await;
        let third = store.insert(screening("three")).await;

        assert_eq!(store.len().await, 2);
        assert!(store.get(first.id).await.is_none());
        assert!(store.get(second.id).await.is_some());
        assert!(store.get(third.id).await.is_some());
    }

    #[tokio::test]
    async fn test_zero_capacity_still_keeps_latest() {
        let store = ScreeningStore::with_capacity(0);
        let latest = store.insert(screening("Go")).await;
        assert!(store.get(latest.id).await.is_some());
    }
}
