use super::matrix::InteractionMatrix;
use super::neighbors::nearest_neighbors;
use super::similarity::SimilarityMatrix;
use crate::error::RecResult;
use crate::models::*;
use std::collections::HashSet;
use tracing::debug;

/// Items the user rated, with the user's score, highest score first.
///
/// A user with no ratings in the matrix gets an empty list.
pub fn seen_items(matrix: &InteractionMatrix, catalog: &Catalog, user_id: UserId) -> Vec<SeenItem> {
    let mut seen: Vec<SeenItem> = matrix
        .rated_items(user_id)
        .into_iter()
        .filter_map(|(item_id, score)| {
            catalog.get(item_id).map(|item| SeenItem {
                item: item.clone(),
                score,
            })
        })
        .collect();

    if seen.is_empty() {
        debug!("User {} has no rated items (cold start)", user_id);
    }
    seen.sort_by(|a, b| b.score.cmp(&a.score));
    seen
}

/// Items rated `top_score` by any of the `n` nearest neighbors that the
/// target user has not rated.
///
/// Candidates carry no ranking and are returned in catalog order.
pub fn recommend(
    matrix: &InteractionMatrix,
    similarity: &SimilarityMatrix,
    ratings: &[Rating],
    catalog: &Catalog,
    target_user: UserId,
    n: usize,
    top_score: u8,
) -> RecResult<Recommendation> {
    let neighbors = nearest_neighbors(similarity, target_user, n)?;
    let neighbor_ids: HashSet<UserId> = neighbors.iter().map(|n| n.user_id).collect();

    let liked: HashSet<ItemId> = ratings
        .iter()
        .filter(|r| r.score == top_score && neighbor_ids.contains(&r.user_id))
        .map(|r| r.item_id)
        .collect();

    let seen: HashSet<ItemId> = matrix
        .rated_items(target_user)
        .into_iter()
        .map(|(item_id, _)| item_id)
        .collect();

    let candidates: Vec<Item> = catalog
        .iter()
        .filter(|item| liked.contains(&item.item_id) && !seen.contains(&item.item_id))
        .cloned()
        .collect();

    debug!(
        "User {}: {} neighbors liked {} items, {} unseen",
        target_user,
        neighbors.len(),
        liked.len(),
        candidates.len()
    );

    Ok(Recommendation { candidates, neighbors })
}
