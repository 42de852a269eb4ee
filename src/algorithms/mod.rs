//! User-based collaborative filtering: interaction matrix, pairwise user
//! similarity, neighbor ranking and candidate generation.

pub mod matrix;
pub mod neighbors;
pub mod recommender;
pub mod scope;
pub mod similarity;

pub use matrix::InteractionMatrix;
pub use neighbors::nearest_neighbors;
pub use recommender::{recommend, seen_items};
pub use scope::{FirstK, MostActive, RandomSample, Scope, ScopeSelector};
pub use similarity::{SimilarityEngine, SimilarityMatrix};
