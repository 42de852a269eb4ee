use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

pub type UserId = u32;
pub type ItemId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub gender: String,
    pub age: u8,
    pub occupation: u8,
    pub zip_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,
    pub title: String,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub score: u8,
    pub timestamp: DateTime<Utc>,
}

/// A single cell of the interaction matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    Rated(u8),
    #[default]
    Unrated,
}

impl Cell {
    pub fn score(self) -> Option<u8> {
        match self {
            Cell::Rated(score) => Some(score),
            Cell::Unrated => None,
        }
    }

    pub fn is_rated(self) -> bool {
        matches!(self, Cell::Rated(_))
    }
}

/// Content fingerprint of a [`Dataset`], used as the derived-state cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatasetVersion(pub u64);

impl std::fmt::Display for DatasetVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// The three input tables. Read-only once constructed.
#[derive(Debug, Clone)]
pub struct Dataset {
    users: Vec<User>,
    items: Vec<Item>,
    ratings: Vec<Rating>,
    version: DatasetVersion,
}

impl Dataset {
    pub fn new(users: Vec<User>, items: Vec<Item>, ratings: Vec<Rating>) -> Self {
        let mut hasher = DefaultHasher::new();
        users.hash(&mut hasher);
        items.hash(&mut hasher);
        ratings.hash(&mut hasher);
        let version = DatasetVersion(hasher.finish());

        Self {
            users,
            items,
            ratings,
            version,
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn version(&self) -> DatasetVersion {
        self.version
    }
}

/// Item metadata indexed by id, preserving the items table order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
    index: HashMap<ItemId, usize>,
}

impl Catalog {
    pub fn new(items: &[Item]) -> Self {
        let mut catalog = Self::default();
        for item in items {
            if catalog.index.contains_key(&item.item_id) {
                continue;
            }
            catalog.index.insert(item.item_id, catalog.items.len());
            catalog.items.push(item.clone());
        }
        catalog
    }

    pub fn get(&self, item_id: ItemId) -> Option<&Item> {
        self.index.get(&item_id).map(|&i| &self.items[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub user_id: UserId,
    /// Pearson coefficient; NaN (serialized as `null`) when undefined.
    #[serde(deserialize_with = "nan_from_null")]
    pub similarity: f64,
}

fn nan_from_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeenItem {
    pub item: Item,
    pub score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: UserId,
    pub num_neighbors: usize,
}

/// Candidates and the neighbors they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub candidates: Vec<Item>,
    pub neighbors: Vec<Neighbor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: UserId,
    pub neighbors: Vec<Neighbor>,
    pub recommendations: Vec<Item>,
    pub seen: Vec<SeenItem>,
    pub generated_at: DateTime<Utc>,
}

impl User {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            gender: String::new(),
            age: 0,
            occupation: 0,
            zip_code: String::new(),
        }
    }
}

impl Item {
    pub fn new(item_id: ItemId, title: impl Into<String>) -> Self {
        Self {
            item_id,
            title: title.into(),
            genres: Vec::new(),
        }
    }

    pub fn with_genres(mut self, genres: Vec<String>) -> Self {
        self.genres = genres;
        self
    }
}

impl Rating {
    pub fn new(user_id: UserId, item_id: ItemId, score: u8) -> Self {
        Self {
            user_id,
            item_id,
            score,
            timestamp: DateTime::<Utc>::default(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
