use super::similarity::SimilarityMatrix;
use crate::error::RecResult;
use crate::models::{Neighbor, UserId};
use crate::utils::descending_nan_last;

/// Up to `n` users most similar to `target_user`, best first.
///
/// NaN coefficients rank below every number and ties keep the matrix column
/// order. The target is excluded by id, so another user tied at 1.0 is kept.
pub fn nearest_neighbors(similarity: &SimilarityMatrix, target_user: UserId, n: usize) -> RecResult<Vec<Neighbor>> {
    let row = similarity.row(target_user)?;

    let mut ranked: Vec<Neighbor> = similarity
        .users()
        .iter()
        .zip(row.iter())
        .filter(|(user_id, _)| **user_id != target_user)
        .map(|(&user_id, &similarity)| Neighbor { user_id, similarity })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| descending_nan_last(a.similarity, b.similarity));
    ranked.truncate(n);
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::matrix::InteractionMatrix;
    use crate::algorithms::scope::FirstK;
    use crate::algorithms::similarity::SimilarityEngine;
    use crate::config::MissingValuePolicy;
    use crate::error::RecError;
    use crate::models::*;

    fn similarity(ratings: Vec<Rating>) -> SimilarityMatrix {
        let mut user_ids: Vec<UserId> = ratings.iter().map(|r| r.user_id).collect();
        user_ids.dedup();
        let users: Vec<User> = user_ids.into_iter().map(User::new).collect();
        let items: Vec<Item> = (1..=5).map(|i| Item::new(i, "x")).collect();
        let matrix = InteractionMatrix::build(&users, &items, &ratings).unwrap();
        SimilarityEngine::new(Box::new(FirstK { k: 500 }), MissingValuePolicy::ImputeZero, 1)
            .unwrap()
            .compute(&matrix)
    }

    #[test]
    fn test_identical_user_is_kept() {
        // Users 1 and 2 are identical, so both rank at 1.0 against each other.
        let sim = similarity(vec![
            Rating::new(1, 1, 5),
            Rating::new(1, 2, 1),
            Rating::new(2, 1, 5),
            Rating::new(2, 2, 1),
            Rating::new(3, 1, 1),
            Rating::new(3, 2, 5),
        ]);
        let neighbors = nearest_neighbors(&sim, 2, 2).unwrap();
        assert_eq!(neighbors[0].user_id, 1);
        assert_eq!(neighbors[0].similarity, 1.0);
        assert!(neighbors.iter().all(|n| n.user_id != 2));
    }

    #[test]
    fn test_nan_ranks_last_and_ties_stable() {
        // User 2 rates every item the same, so has no variance.
        let sim = similarity(vec![
            Rating::new(1, 1, 5),
            Rating::new(1, 2, 1),
            Rating::new(2, 1, 3),
            Rating::new(2, 2, 3),
            Rating::new(2, 3, 3),
            Rating::new(2, 4, 3),
            Rating::new(2, 5, 3),
            Rating::new(3, 1, 4),
            Rating::new(3, 2, 2),
            Rating::new(4, 1, 4),
            Rating::new(4, 2, 2),
        ]);
        let neighbors = nearest_neighbors(&sim, 1, 10).unwrap();
        let ids: Vec<UserId> = neighbors.iter().map(|n| n.user_id).collect();
        assert_eq!(ids, vec![3, 4, 2]);
        assert!(neighbors[2].similarity.is_nan());
    }

    #[test]
    fn test_n_larger_than_population() {
        let sim = similarity(vec![Rating::new(1, 1, 5), Rating::new(1, 2, 1), Rating::new(2, 1, 4)]);
        assert_eq!(nearest_neighbors(&sim, 1, 50).unwrap().len(), 1);
        assert!(nearest_neighbors(&sim, 1, 0).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_user() {
        let sim = similarity(vec![Rating::new(1, 1, 5), Rating::new(1, 2, 1)]);
        assert_eq!(nearest_neighbors(&sim, 7, 3).unwrap_err(), RecError::UnknownUser(7));
    }
}
