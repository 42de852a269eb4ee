use crate::algorithms;
use crate::config::Config;
use crate::models::*;
use crate::services::cache::{DerivedState, MatrixCache};
use crate::utils::validation::{validate_neighbor_count, validate_recommendation_request};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Answers recommendation queries against the current dataset.
///
/// Each query is computed end to end against an immutable snapshot; the
/// dataset can be swapped with [`Self::replace_dataset`], after which the
/// next query builds (once) the derived state for the new version.
pub struct RecommendationService {
    dataset: RwLock<Arc<Dataset>>,
    cache: Arc<MatrixCache>,
    config: Arc<Config>,
}

impl RecommendationService {
    pub fn new(dataset: Arc<Dataset>, cache: Arc<MatrixCache>, config: Arc<Config>) -> Self {
        Self {
            dataset: RwLock::new(dataset),
            cache,
            config,
        }
    }

    pub async fn snapshot(&self) -> Result<Arc<DerivedState>> {
        let dataset = self.dataset.read().await.clone();
        self.cache.get_or_build(&dataset).await
    }

    pub async fn replace_dataset(&self, dataset: Arc<Dataset>) {
        let previous = {
            let mut current = self.dataset.write().await;
            std::mem::replace(&mut *current, dataset)
        };
        info!("Replaced dataset {}", previous.version());
    }

    pub async fn get_recommendations(&self, request: &RecommendationRequest) -> Result<RecommendationResponse> {
        validate_recommendation_request(request, &self.config.recommendation)?;
        let state = self.snapshot().await?;

        let recommendation = algorithms::recommend(
            &state.matrix,
            &state.similarity,
            &state.ratings,
            &state.catalog,
            request.user_id,
            request.num_neighbors,
            self.config.recommendation.scale.max,
        )?;
        let seen = algorithms::seen_items(&state.matrix, &state.catalog, request.user_id);

        info!(
            "Recommended {} items for user {} from {} neighbors",
            recommendation.candidates.len(),
            request.user_id,
            recommendation.neighbors.len()
        );

        Ok(RecommendationResponse {
            user_id: request.user_id,
            neighbors: recommendation.neighbors,
            recommendations: recommendation.candidates,
            seen,
            generated_at: Utc::now(),
        })
    }

    pub async fn nearest_neighbors(&self, user_id: UserId, n: usize) -> Result<Vec<Neighbor>> {
        validate_neighbor_count(n, self.config.recommendation.max_neighbors)?;
        let state = self.snapshot().await?;
        Ok(algorithms::nearest_neighbors(&state.similarity, user_id, n)?)
    }

    pub async fn seen_items(&self, user_id: UserId) -> Result<Vec<SeenItem>> {
        let state = self.snapshot().await?;
        Ok(algorithms::seen_items(&state.matrix, &state.catalog, user_id))
    }

    /// Users that can be queried, in similarity matrix order.
    pub async fn scoped_users(&self) -> Result<Vec<UserId>> {
        let state = self.snapshot().await?;
        Ok(state.similarity.users().to_vec())
    }

    pub fn default_neighbors(&self) -> usize {
        self.config.recommendation.default_neighbors
    }
}
