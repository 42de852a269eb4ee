//! Policies choosing which users and items enter the pairwise similarity
//! computation. The bound keeps an O(users^2 * items) computation tractable;
//! users outside the scope cannot be queried or returned as neighbors.

use super::matrix::InteractionMatrix;
use crate::config::ScopeStrategy;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Row and column positions into an [`InteractionMatrix`], in matrix order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

pub trait ScopeSelector: Send + Sync + std::fmt::Debug {
    fn select(&self, matrix: &InteractionMatrix) -> Scope;
    fn name(&self) -> &'static str;
}

/// Leading `k` users and `k` items.
#[derive(Debug, Clone)]
pub struct FirstK {
    pub k: usize,
}

impl ScopeSelector for FirstK {
    fn select(&self, matrix: &InteractionMatrix) -> Scope {
        let (n_rows, n_cols) = matrix.shape();
        Scope {
            rows: (0..n_rows.min(self.k)).collect(),
            cols: (0..n_cols.min(self.k)).collect(),
        }
    }

    fn name(&self) -> &'static str {
        "first_k"
    }
}

/// Seeded uniform sample of `k` users and `k` items.
#[derive(Debug, Clone)]
pub struct RandomSample {
    pub k: usize,
    pub seed: u64,
}

impl ScopeSelector for RandomSample {
    fn select(&self, matrix: &InteractionMatrix) -> Scope {
        let (n_rows, n_cols) = matrix.shape();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut rows = rand::seq::index::sample(&mut rng, n_rows, n_rows.min(self.k)).into_vec();
        let mut cols = rand::seq::index::sample(&mut rng, n_cols, n_cols.min(self.k)).into_vec();
        rows.sort_unstable();
        cols.sort_unstable();
        Scope { rows, cols }
    }

    fn name(&self) -> &'static str {
        "random_sample"
    }
}

/// The `k` users with the most ratings and the `k` most rated items.
#[derive(Debug, Clone)]
pub struct MostActive {
    pub k: usize,
}

impl MostActive {
    fn top_k(counts: Vec<usize>, k: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..counts.len()).collect();
        // Stable: equal counts keep matrix order.
        order.sort_by(|&a, &b| counts[b].cmp(&counts[a]));
        order.truncate(k);
        order.sort_unstable();
        order
    }
}

impl ScopeSelector for MostActive {
    fn select(&self, matrix: &InteractionMatrix) -> Scope {
        let (n_rows, n_cols) = matrix.shape();
        let row_counts = (0..n_rows).map(|r| matrix.rating_count(r)).collect();
        let col_counts = (0..n_cols)
            .map(|c| matrix.column_at(c).iter().filter(|cell| cell.is_rated()).count())
            .collect();
        Scope {
            rows: Self::top_k(row_counts, self.k),
            cols: Self::top_k(col_counts, self.k),
        }
    }

    fn name(&self) -> &'static str {
        "most_active"
    }
}

pub fn selector_for(strategy: ScopeStrategy, k: usize) -> Box<dyn ScopeSelector> {
    match strategy {
        ScopeStrategy::FirstK => Box::new(FirstK { k }),
        ScopeStrategy::RandomSample { seed } => Box::new(RandomSample { k, seed }),
        ScopeStrategy::MostActive => Box::new(MostActive { k }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;

    fn matrix() -> InteractionMatrix {
        let users: Vec<User> = (1..=4).map(User::new).collect();
        let items: Vec<Item> = (1..=4).map(|i| Item::new(i, format!("item {i}"))).collect();
        let ratings = vec![
            Rating::new(1, 1, 5),
            Rating::new(2, 1, 4),
            Rating::new(3, 1, 3),
            Rating::new(3, 2, 3),
            Rating::new(3, 4, 3),
            Rating::new(4, 3, 2),
            Rating::new(4, 4, 2),
        ];
        InteractionMatrix::build(&users, &items, &ratings).unwrap()
    }

    #[test]
    fn test_first_k() {
        let scope = FirstK { k: 2 }.select(&matrix());
        assert_eq!(scope.rows, vec![0, 1]);
        assert_eq!(scope.cols, vec![0, 1]);

        let scope = FirstK { k: 100 }.select(&matrix());
        assert_eq!(scope.rows.len(), 4);
    }

    #[test]
    fn test_random_sample_reproducible() {
        let m = matrix();
        let a = RandomSample { k: 2, seed: 11 }.select(&m);
        let b = RandomSample { k: 2, seed: 11 }.select(&m);
        assert_eq!(a, b);
        assert_eq!(a.rows.len(), 2);
        assert!(a.rows.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_most_active() {
        let scope = MostActive { k: 2 }.select(&matrix());
        // users 3 (3 ratings) and 4 (2 ratings); items 1 (3) and 4 (2)
        assert_eq!(scope.rows, vec![2, 3]);
        assert_eq!(scope.cols, vec![0, 3]);
    }
}
