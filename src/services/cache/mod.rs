use crate::algorithms::{InteractionMatrix, SimilarityEngine, SimilarityMatrix};
use crate::config::CacheConfig;
use crate::models::*;
use anyhow::Result;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Everything derived from one [`Dataset`] version. Immutable once built.
#[derive(Debug)]
pub struct DerivedState {
    pub version: DatasetVersion,
    pub matrix: InteractionMatrix,
    pub similarity: SimilarityMatrix,
    /// Ratings that survived the join, as placed in the matrix.
    pub ratings: Vec<Rating>,
    pub catalog: Catalog,
}

impl DerivedState {
    pub fn build(dataset: &Dataset, engine: &SimilarityEngine) -> Result<Self> {
        let matrix = InteractionMatrix::build(dataset.users(), dataset.items(), dataset.ratings())?;
        let similarity = engine.compute(&matrix);

        let ratings = dataset
            .ratings()
            .iter()
            .filter(|r| matrix.cell(r.user_id, r.item_id).is_some_and(|c| c.is_rated()))
            .cloned()
            .collect();

        Ok(Self {
            version: dataset.version(),
            matrix,
            similarity,
            ratings,
            catalog: Catalog::new(dataset.items()),
        })
    }
}

type Slot = Arc<OnceCell<Arc<DerivedState>>>;

/// Derived state keyed by dataset version.
///
/// Concurrent callers asking for the same version share a single build and
/// never observe a partially built value. A failed build stores nothing, so
/// the next call retries it.
pub struct MatrixCache {
    engine: Arc<SimilarityEngine>,
    slots: DashMap<DatasetVersion, Slot>,
    order: Mutex<VecDeque<DatasetVersion>>,
    max_versions: usize,
    builds: AtomicU64,
}

impl MatrixCache {
    pub fn new(engine: SimilarityEngine, config: &CacheConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            slots: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            max_versions: config.max_versions.max(1),
            builds: AtomicU64::new(0),
        }
    }

    pub async fn get_or_build(&self, dataset: &Arc<Dataset>) -> Result<Arc<DerivedState>> {
        let version = dataset.version();
        // Clone the slot out so no map guard is held across the await.
        let slot = self.slots.entry(version).or_default().clone();

        let built = slot
            .get_or_try_init(|| async {
                let dataset = dataset.clone();
                let engine = self.engine.clone();
                let state = tokio::task::spawn_blocking(move || DerivedState::build(&dataset, &engine)).await??;
                self.builds.fetch_add(1, Ordering::Relaxed);
                info!(
                    "Built derived state for dataset {}: {}x{} matrix, {} users in similarity scope",
                    version,
                    state.matrix.shape().0,
                    state.matrix.shape().1,
                    state.similarity.len()
                );
                Ok::<_, anyhow::Error>(Arc::new(state))
            })
            .await
            .cloned();

        match built {
            Ok(state) => {
                self.touch(version);
                Ok(state)
            }
            Err(e) => {
                // An empty slot is never in the eviction order, so drop it here.
                self.slots.remove_if(&version, |_, slot| !slot.initialized());
                Err(e)
            }
        }
    }

    fn touch(&self, version: DatasetVersion) {
        let mut order = self.order.lock();
        if order.back() == Some(&version) {
            return;
        }
        order.retain(|v| *v != version);
        order.push_back(version);

        let mut evicted = HashSet::new();
        while order.len() > self.max_versions {
            if let Some(oldest) = order.pop_front() {
                evicted.insert(oldest);
            }
        }
        drop(order);

        for version in evicted {
            self.slots.remove(&version);
            info!("Evicted derived state for dataset {}", version);
        }
    }

    pub fn invalidate(&self, version: DatasetVersion) {
        self.slots.remove(&version);
        self.order.lock().retain(|v| *v != version);
    }

    pub fn contains(&self, version: DatasetVersion) -> bool {
        self.slots
            .get(&version)
            .map(|slot| slot.initialized())
            .unwrap_or(false)
    }

    pub fn builds(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn dataset(score: u8) -> Arc<Dataset> {
        Arc::new(Dataset::new(
            vec![User::new(1), User::new(2)],
            vec![Item::new(1, "a"), Item::new(2, "b")],
            vec![
                Rating::new(1, 1, score),
                Rating::new(1, 2, 1),
                Rating::new(2, 1, 4),
                Rating::new(3, 1, 4),
            ],
        ))
    }

    fn cache(max_versions: usize) -> MatrixCache {
        let config = Config::default();
        let engine = SimilarityEngine::from_config(&config.similarity).unwrap();
        MatrixCache::new(engine, &CacheConfig { max_versions })
    }

    #[tokio::test]
    async fn test_builds_once_per_version() {
        let cache = cache(2);
        let data = dataset(5);
        let a = cache.get_or_build(&data).await.unwrap();
        let b = cache.get_or_build(&data).await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.builds(), 1);
        // Rating by the unknown user 3 is not carried over.
        assert_eq!(a.ratings.len(), 3);
    }

    #[tokio::test]
    async fn test_evicts_oldest_version() {
        let cache = cache(1);
        let first = dataset(5);
        let second = dataset(3);
        cache.get_or_build(&first).await.unwrap();
        cache.get_or_build(&second).await.unwrap();

        assert!(!cache.contains(first.version()));
        assert!(cache.contains(second.version()));
    }

    #[tokio::test]
    async fn test_failed_build_is_retried() {
        let cache = cache(2);
        let empty = Arc::new(Dataset::new(vec![User::new(1)], vec![], vec![]));
        assert!(cache.get_or_build(&empty).await.is_err());
        assert!(cache.get_or_build(&empty).await.is_err());
        assert_eq!(cache.builds(), 0);
        assert!(!cache.contains(empty.version()));
    }

    #[tokio::test]
    async fn test_failed_builds_leave_no_slots() {
        let cache = cache(1);
        for user_id in 1..=5 {
            let empty = Arc::new(Dataset::new(vec![User::new(user_id)], vec![], vec![]));
            assert!(cache.get_or_build(&empty).await.is_err());
        }
        assert_eq!(cache.slots.len(), 0);

        let data = dataset(5);
        cache.get_or_build(&data).await.unwrap();
        assert_eq!(cache.slots.len(), 1);
    }
}
