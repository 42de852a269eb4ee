use crate::error::{RecError, RecResult};
use crate::models::*;
use ndarray::{Array2, ArrayView1};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Dense user x item matrix of [`Cell`]s.
///
/// Rows are every distinct rater and columns every distinct rated item, both
/// sorted ascending by id.
#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    users: Vec<UserId>,
    items: Vec<ItemId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<ItemId, usize>,
    cells: Array2<Cell>,
    dropped_ratings: usize,
}

impl InteractionMatrix {
    /// Joins ratings against the user and item tables and pivots the result.
    ///
    /// Ratings whose user or item is missing from its table are dropped (inner
    /// join); the count is kept in [`Self::dropped_ratings`].
    pub fn build(users: &[User], items: &[Item], ratings: &[Rating]) -> RecResult<Self> {
        let known_users: HashSet<UserId> = users.iter().map(|u| u.user_id).collect();
        let known_items: HashSet<ItemId> = items.iter().map(|i| i.item_id).collect();

        let joined: Vec<&Rating> = ratings
            .iter()
            .filter(|r| known_users.contains(&r.user_id) && known_items.contains(&r.item_id))
            .collect();
        let dropped_ratings = ratings.len() - joined.len();
        if dropped_ratings > 0 {
            warn!(
                "Dropped {} of {} ratings with no matching user or item",
                dropped_ratings,
                ratings.len()
            );
        }

        let mut pairs = HashSet::with_capacity(joined.len());
        for rating in &joined {
            if !pairs.insert((rating.user_id, rating.item_id)) {
                return Err(RecError::DuplicateRating {
                    user_id: rating.user_id,
                    item_id: rating.item_id,
                });
            }
        }

        if joined.is_empty() {
            return Err(RecError::EmptyInput);
        }

        let mut row_ids: Vec<UserId> = joined.iter().map(|r| r.user_id).collect();
        row_ids.sort_unstable();
        row_ids.dedup();
        let mut col_ids: Vec<ItemId> = joined.iter().map(|r| r.item_id).collect();
        col_ids.sort_unstable();
        col_ids.dedup();

        let mut matrix = Self::empty(row_ids, col_ids);
        for rating in joined {
            let row = matrix.user_index[&rating.user_id];
            let col = matrix.item_index[&rating.item_id];
            matrix.cells[[row, col]] = Cell::Rated(rating.score);
        }
        matrix.dropped_ratings = dropped_ratings;

        debug!(
            "Built interaction matrix {}x{} from {} ratings",
            matrix.users.len(),
            matrix.items.len(),
            pairs.len()
        );
        Ok(matrix)
    }

    /// Wraps an already pivoted grid. Row and column ids must be unique.
    pub fn from_cells(users: Vec<UserId>, items: Vec<ItemId>, cells: Array2<Cell>) -> RecResult<Self> {
        if users.is_empty() || items.is_empty() {
            return Err(RecError::EmptyInput);
        }
        let expected = (users.len(), items.len());
        if cells.dim() != expected {
            return Err(RecError::InvalidShape {
                expected,
                found: cells.dim(),
            });
        }

        let mut matrix = Self::empty(users, items);
        if matrix.user_index.len() != matrix.users.len() || matrix.item_index.len() != matrix.items.len() {
            let user_id = first_duplicate(&matrix.users).unwrap_or(matrix.users[0]);
            let item_id = first_duplicate(&matrix.items).unwrap_or(matrix.items[0]);
            return Err(RecError::DuplicateRating { user_id, item_id });
        }
        matrix.cells = cells;
        Ok(matrix)
    }

    fn empty(users: Vec<UserId>, items: Vec<ItemId>) -> Self {
        let user_index = users.iter().enumerate().map(|(i, &u)| (u, i)).collect();
        let item_index = items.iter().enumerate().map(|(i, &it)| (it, i)).collect();
        let cells = Array2::from_elem((users.len(), items.len()), Cell::Unrated);
        Self {
            users,
            items,
            user_index,
            item_index,
            cells,
            dropped_ratings: 0,
        }
    }

    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    pub fn dropped_ratings(&self) -> usize {
        self.dropped_ratings
    }

    pub fn user_position(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    pub fn item_position(&self, item_id: ItemId) -> Option<usize> {
        self.item_index.get(&item_id).copied()
    }

    pub fn cell(&self, user_id: UserId, item_id: ItemId) -> Option<Cell> {
        let row = self.user_position(user_id)?;
        let col = self.item_position(item_id)?;
        Some(self.cells[[row, col]])
    }

    pub fn row(&self, user_id: UserId) -> Option<ArrayView1<'_, Cell>> {
        self.user_position(user_id).map(|row| self.cells.row(row))
    }

    pub fn row_at(&self, row: usize) -> ArrayView1<'_, Cell> {
        self.cells.row(row)
    }

    pub fn column_at(&self, col: usize) -> ArrayView1<'_, Cell> {
        self.cells.column(col)
    }

    /// Items the user rated, with scores, in column order.
    pub fn rated_items(&self, user_id: UserId) -> Vec<(ItemId, u8)> {
        match self.row(user_id) {
            Some(row) => row
                .iter()
                .zip(&self.items)
                .filter_map(|(cell, &item_id)| cell.score().map(|s| (item_id, s)))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn rating_count(&self, row: usize) -> usize {
        self.cells.row(row).iter().filter(|c| c.is_rated()).count()
    }
}

fn first_duplicate(ids: &[u32]) -> Option<u32> {
    let mut seen = HashSet::new();
    ids.iter().copied().find(|id| !seen.insert(*id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> (Vec<User>, Vec<Item>) {
        let users = (1..=3).map(User::new).collect();
        let items = vec![Item::new(10, "a"), Item::new(20, "b"), Item::new(30, "c")];
        (users, items)
    }

    #[test]
    fn test_pivot_fills_unrated() {
        let (users, items) = tables();
        let ratings = vec![
            Rating::new(2, 20, 4),
            Rating::new(1, 10, 5),
            Rating::new(3, 10, 1),
        ];
        let matrix = InteractionMatrix::build(&users, &items, &ratings).unwrap();

        assert_eq!(matrix.shape(), (3, 2));
        assert_eq!(matrix.users(), &[1, 2, 3]);
        assert_eq!(matrix.items(), &[10, 20]);
        assert_eq!(matrix.cell(1, 10), Some(Cell::Rated(5)));
        assert_eq!(matrix.cell(1, 20), Some(Cell::Unrated));
        assert_eq!(matrix.cell(2, 20), Some(Cell::Rated(4)));
        assert_eq!(matrix.cell(1, 30), None);
    }

    #[test]
    fn test_inner_join_drops_unknown_keys() {
        let (users, items) = tables();
        let ratings = vec![
            Rating::new(1, 10, 5),
            Rating::new(9, 10, 5),
            Rating::new(1, 99, 3),
        ];
        let matrix = InteractionMatrix::build(&users, &items, &ratings).unwrap();

        assert_eq!(matrix.shape(), (1, 1));
        assert_eq!(matrix.dropped_ratings(), 2);
    }

    #[test]
    fn test_duplicate_rating_rejected() {
        let (users, items) = tables();
        let ratings = vec![
            Rating::new(1, 10, 5),
            Rating::new(2, 10, 3),
            Rating::new(1, 10, 2),
        ];
        let err = InteractionMatrix::build(&users, &items, &ratings).unwrap_err();
        assert_eq!(err, RecError::DuplicateRating { user_id: 1, item_id: 10 });
    }

    #[test]
    fn test_empty_input() {
        let (users, items) = tables();
        assert_eq!(
            InteractionMatrix::build(&users, &items, &[]).unwrap_err(),
            RecError::EmptyInput
        );
        // Everything dropped by the join is empty too.
        let orphan = vec![Rating::new(42, 10, 5)];
        assert_eq!(
            InteractionMatrix::build(&users, &items, &orphan).unwrap_err(),
            RecError::EmptyInput
        );
    }

    #[test]
    fn test_from_cells_shape_checked() {
        let cells = Array2::from_elem((2, 2), Cell::Unrated);
        let err = InteractionMatrix::from_cells(vec![1, 2, 3], vec![10, 20], cells).unwrap_err();
        assert!(matches!(err, RecError::InvalidShape { expected: (3, 2), found: (2, 2) }));
    }

    #[test]
    fn test_rated_items() {
        let (users, items) = tables();
        let ratings = vec![
            Rating::new(1, 30, 2),
            Rating::new(1, 10, 5),
            Rating::new(2, 20, 4),
        ];
        let matrix = InteractionMatrix::build(&users, &items, &ratings).unwrap();
        assert_eq!(matrix.rated_items(1), vec![(10, 5), (30, 2)]);
        assert!(matrix.rated_items(3).is_empty());
        assert_eq!(matrix.rating_count(0), 2);
    }
}
