use super::matrix::InteractionMatrix;
use super::scope::{selector_for, Scope, ScopeSelector};
use crate::config::{MissingValuePolicy, SimilarityConfig};
use crate::error::{RecError, RecResult};
use crate::models::UserId;
use crate::utils::{has_variance, pairwise_complete_correlation, pearson_correlation};
use anyhow::Result;
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::info;

/// Symmetric user x user matrix of Pearson coefficients.
///
/// Entries are NaN where a coefficient is undefined (zero variance). With
/// [`MissingValuePolicy::ImputeZero`] the coefficient also rewards shared
/// absence of ratings, so it is not a clean similarity on sparse data.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    users: Vec<UserId>,
    index: HashMap<UserId, usize>,
    values: Array2<f64>,
}

impl SimilarityMatrix {
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.index.contains_key(&user_id)
    }

    pub fn get(&self, a: UserId, b: UserId) -> Option<f64> {
        let i = *self.index.get(&a)?;
        let j = *self.index.get(&b)?;
        Some(self.values[[i, j]])
    }

    /// The user's coefficients against every scoped user, in column order.
    pub fn row(&self, user_id: UserId) -> RecResult<ArrayView1<'_, f64>> {
        self.index
            .get(&user_id)
            .map(|&i| self.values.row(i))
            .ok_or(RecError::UnknownUser(user_id))
    }
}

enum Profiles {
    Dense(Vec<Vec<f64>>),
    Sparse(Vec<Vec<Option<f64>>>),
}

impl Profiles {
    fn collect(matrix: &InteractionMatrix, scope: &Scope, policy: MissingValuePolicy) -> Self {
        let sparse: Vec<Vec<Option<f64>>> = scope
            .rows
            .iter()
            .map(|&r| {
                let row = matrix.row_at(r);
                scope
                    .cols
                    .iter()
                    .map(|&c| row[c].score().map(f64::from))
                    .collect()
            })
            .collect();

        match policy {
            MissingValuePolicy::Exclude => Profiles::Sparse(sparse),
            MissingValuePolicy::ImputeZero => Profiles::Dense(
                sparse
                    .into_iter()
                    .map(|row| row.into_iter().map(|v| v.unwrap_or(0.0)).collect())
                    .collect(),
            ),
            MissingValuePolicy::ImputeMean => Profiles::Dense(
                sparse
                    .into_iter()
                    .map(|row| {
                        let rated: Vec<f64> = row.iter().flatten().copied().collect();
                        let mean = if rated.is_empty() {
                            0.0
                        } else {
                            rated.iter().sum::<f64>() / rated.len() as f64
                        };
                        row.into_iter().map(|v| v.unwrap_or(mean)).collect()
                    })
                    .collect(),
            ),
        }
    }

    fn correlate(&self, i: usize, j: usize) -> f64 {
        match self {
            Profiles::Dense(rows) => pearson_correlation(&rows[i], &rows[j]),
            Profiles::Sparse(rows) => pairwise_complete_correlation(&rows[i], &rows[j]),
        }
    }

    fn self_similarity(&self, i: usize) -> f64 {
        let varies = match self {
            Profiles::Dense(rows) => has_variance(&rows[i]),
            Profiles::Sparse(rows) => {
                let rated: Vec<f64> = rows[i].iter().flatten().copied().collect();
                has_variance(&rated)
            }
        };
        if varies {
            1.0
        } else {
            f64::NAN
        }
    }
}

#[derive(Debug)]
pub struct SimilarityEngine {
    selector: Box<dyn ScopeSelector>,
    policy: MissingValuePolicy,
    pool: rayon::ThreadPool,
}

impl SimilarityEngine {
    pub fn new(selector: Box<dyn ScopeSelector>, policy: MissingValuePolicy, threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("similarity-{i}"))
            .build()?;
        Ok(Self {
            selector,
            policy,
            pool,
        })
    }

    pub fn from_config(config: &SimilarityConfig) -> Result<Self> {
        Self::new(
            selector_for(config.scope, config.scope_size),
            config.missing_values,
            config.threads,
        )
    }

    pub fn policy(&self) -> MissingValuePolicy {
        self.policy
    }

    pub fn compute(&self, matrix: &InteractionMatrix) -> SimilarityMatrix {
        let scope = self.selector.select(matrix);
        let users: Vec<UserId> = scope.rows.iter().map(|&r| matrix.users()[r]).collect();
        let profiles = Profiles::collect(matrix, &scope, self.policy);
        let n = users.len();

        let upper: Vec<Vec<f64>> = self.pool.install(|| {
            (0..n)
                .into_par_iter()
                .map(|i| ((i + 1)..n).map(|j| profiles.correlate(i, j)).collect())
                .collect()
        });

        let mut values = Array2::from_elem((n, n), f64::NAN);
        for (i, row) in upper.into_iter().enumerate() {
            values[[i, i]] = profiles.self_similarity(i);
            for (offset, value) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                values[[i, j]] = value;
                values[[j, i]] = value;
            }
        }

        info!(
            "Computed {}x{} similarity matrix over {} items (scope: {}, missing values: {:?})",
            n,
            n,
            scope.cols.len(),
            self.selector.name(),
            self.policy
        );

        let index = users.iter().enumerate().map(|(i, &u)| (u, i)).collect();
        SimilarityMatrix { users, index, values }
    }
}
