use crate::config::{RatingScale, RecommendationConfig};
use crate::models::*;
use anyhow::{anyhow, Result};

/// A request that can never succeed as given.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvalidRequest(pub String);

pub fn validate_recommendation_request(request: &RecommendationRequest, config: &RecommendationConfig) -> Result<()> {
    validate_neighbor_count(request.num_neighbors, config.max_neighbors)
}

pub fn validate_neighbor_count(n: usize, max_neighbors: usize) -> Result<()> {
    if n == 0 {
        return Err(InvalidRequest("Number of neighbors must be greater than 0".to_string()).into());
    }

    if n > max_neighbors {
        return Err(InvalidRequest(format!(
            "Number of neighbors too large: {} (max {})",
            n, max_neighbors
        ))
        .into());
    }

    Ok(())
}

pub fn validate_rating(rating: &Rating, scale: &RatingScale) -> Result<()> {
    if !scale.contains(rating.score) {
        return Err(anyhow!(
            "Rating {} by user {} for item {} is outside the {}..={} scale",
            rating.score,
            rating.user_id,
            rating.item_id,
            scale.min,
            scale.max
        ));
    }
    Ok(())
}

pub fn validate_item(item: &Item) -> Result<()> {
    if item.title.trim().is_empty() {
        return Err(anyhow!("Item {} has an empty title", item.item_id));
    }
    Ok(())
}
