//! Loading of the users, items and ratings tables.
//!
//! The files follow the MovieLens 1M layout: one record per line, fields
//! separated by `::`, ISO-8859-1 text.

use crate::config::{DataConfig, RatingScale};
use crate::models::*;
use crate::utils::validation::{validate_item, validate_rating};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[async_trait::async_trait]
pub trait DatasetSource: Send + Sync {
    async fn load(&self) -> Result<Dataset>;
}

/// Tables already held in memory.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    dataset: Dataset,
}

impl InMemorySource {
    pub fn new(users: Vec<User>, items: Vec<Item>, ratings: Vec<Rating>) -> Self {
        Self {
            dataset: Dataset::new(users, items, ratings),
        }
    }
}

#[async_trait::async_trait]
impl DatasetSource for InMemorySource {
    async fn load(&self) -> Result<Dataset> {
        Ok(self.dataset.clone())
    }
}

#[derive(Debug, Clone)]
pub struct DatFileSource {
    dir: PathBuf,
    users_file: String,
    items_file: String,
    ratings_file: String,
    delimiter: String,
    scale: RatingScale,
}

impl DatFileSource {
    pub fn new(config: &DataConfig, scale: RatingScale) -> Self {
        Self {
            dir: config.dir.clone(),
            users_file: config.users_file.clone(),
            items_file: config.items_file.clone(),
            ratings_file: config.ratings_file.clone(),
            delimiter: config.delimiter.clone(),
            scale,
        }
    }

    async fn read_latin1(&self, name: &str) -> Result<(PathBuf, String)> {
        let path = self.dir.join(name);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        // ISO-8859-1 maps each byte to the code point of the same value.
        let text = bytes.iter().map(|&b| b as char).collect();
        Ok((path, text))
    }
}

#[async_trait::async_trait]
impl DatasetSource for DatFileSource {
    async fn load(&self) -> Result<Dataset> {
        let (users_path, users_text) = self.read_latin1(&self.users_file).await?;
        let (items_path, items_text) = self.read_latin1(&self.items_file).await?;
        let (ratings_path, ratings_text) = self.read_latin1(&self.ratings_file).await?;

        let users = parse_users(&users_text, &self.delimiter, &users_path)?;
        let items = parse_items(&items_text, &self.delimiter, &items_path)?;
        let ratings = parse_ratings(&ratings_text, &self.delimiter, &self.scale, &ratings_path)?;

        info!(
            "Loaded {} users, {} items, {} ratings from {}",
            users.len(),
            items.len(),
            ratings.len(),
            self.dir.display()
        );
        Ok(Dataset::new(users, items, ratings))
    }
}

fn records<'a>(
    text: &'a str,
    delimiter: &'a str,
    arity: usize,
    path: &'a Path,
) -> impl Iterator<Item = Result<(usize, Vec<&'a str>)>> + 'a {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(move |(i, line)| {
            let fields: Vec<&str> = line.trim_end_matches('\r').split(delimiter).collect();
            if fields.len() != arity {
                return Err(anyhow!(
                    "{}:{}: expected {} fields, found {}",
                    path.display(),
                    i + 1,
                    arity,
                    fields.len()
                ));
            }
            Ok((i + 1, fields))
        })
}

fn field<T>(value: &str, name: &str, path: &Path, line: usize) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{}:{}: invalid {} {:?}", path.display(), line, name, value))
}

pub fn parse_users(text: &str, delimiter: &str, path: &Path) -> Result<Vec<User>> {
    records(text, delimiter, 5, path)
        .map(|record| {
            let (line, f) = record?;
            Ok(User {
                user_id: field(f[0], "user id", path, line)?,
                gender: f[1].to_string(),
                age: field(f[2], "age", path, line)?,
                occupation: field(f[3], "occupation", path, line)?,
                zip_code: f[4].to_string(),
            })
        })
        .collect()
}

pub fn parse_items(text: &str, delimiter: &str, path: &Path) -> Result<Vec<Item>> {
    records(text, delimiter, 3, path)
        .map(|record| {
            let (line, f) = record?;
            let genres = f[2]
                .split('|')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(String::from)
                .collect();
            let item = Item::new(field(f[0], "item id", path, line)?, f[1]).with_genres(genres);
            validate_item(&item).with_context(|| format!("{}:{}", path.display(), line))?;
            Ok(item)
        })
        .collect()
}

pub fn parse_ratings(text: &str, delimiter: &str, scale: &RatingScale, path: &Path) -> Result<Vec<Rating>> {
    records(text, delimiter, 4, path)
        .map(|record| {
            let (line, f) = record?;
            let seconds: i64 = field(f[3], "timestamp", path, line)?;
            let timestamp = DateTime::<Utc>::from_timestamp(seconds, 0)
                .ok_or_else(|| anyhow!("{}:{}: timestamp out of range", path.display(), line))?;
            let rating = Rating::new(
                field(f[0], "user id", path, line)?,
                field(f[1], "item id", path, line)?,
                field(f[2], "rating", path, line)?,
            )
            .at(timestamp);
            validate_rating(&rating, scale).with_context(|| format!("{}:{}", path.display(), line))?;
            Ok(rating)
        })
        .collect()
}
