use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub similarity: SimilarityConfig,
    pub recommendation: RecommendationConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub users_file: String,
    pub items_file: String,
    pub ratings_file: String,
    pub delimiter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ScopeStrategy {
    FirstK,
    RandomSample { seed: u64 },
    MostActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Unrated cells count as 0. Biases correlation toward shared absence.
    ImputeZero,
    /// Unrated cells take the user's mean in-scope rating.
    ImputeMean,
    /// Only items rated by both users contribute.
    Exclude,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityConfig {
    pub scope: ScopeStrategy,
    /// Upper bound on users and items entering the pairwise computation.
    pub scope_size: usize,
    pub missing_values: MissingValuePolicy,
    pub threads: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingScale {
    pub min: u8,
    pub max: u8,
}

impl RatingScale {
    pub fn contains(&self, score: u8) -> bool {
        (self.min..=self.max).contains(&score)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub default_neighbors: usize,
    pub max_neighbors: usize,
    pub scale: RatingScale,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_versions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            data: DataConfig {
                dir: PathBuf::from("./source/m1"),
                users_file: "users.dat".to_string(),
                items_file: "movies.dat".to_string(),
                ratings_file: "ratings.dat".to_string(),
                delimiter: "::".to_string(),
            },
            similarity: SimilarityConfig {
                scope: ScopeStrategy::FirstK,
                scope_size: 500,
                missing_values: MissingValuePolicy::ImputeZero,
                threads: num_cpus::get(),
            },
            recommendation: RecommendationConfig {
                default_neighbors: 3,
                max_neighbors: 10,
                scale: RatingScale { min: 1, max: 5 },
            },
            cache: CacheConfig { max_versions: 2 },
        }
    }
}

/// `NEIGHBOREC_<SECTION>__<KEY>`, e.g. `NEIGHBOREC_SERVER__PORT=9090`.
fn environment() -> config::Environment {
    config::Environment::with_prefix("NEIGHBOREC")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(environment())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let scale = self.recommendation.scale;
        // Scores must stay distinguishable from the historical 0 = unrated encoding.
        if scale.min == 0 {
            return Err(anyhow!("Rating scale must start at 1 or above"));
        }
        if scale.min > scale.max {
            return Err(anyhow!(
                "Rating scale is empty: min {} > max {}",
                scale.min,
                scale.max
            ));
        }
        if self.similarity.scope_size == 0 {
            return Err(anyhow!("Similarity scope size must be greater than 0"));
        }
        if self.similarity.threads == 0 {
            return Err(anyhow!("Similarity thread count must be greater than 0"));
        }
        if self.recommendation.max_neighbors == 0 {
            return Err(anyhow!("Max neighbors must be greater than 0"));
        }
        if self.recommendation.default_neighbors == 0
            || self.recommendation.default_neighbors > self.recommendation.max_neighbors
        {
            return Err(anyhow!(
                "Default neighbors must be within 1..={}",
                self.recommendation.max_neighbors
            ));
        }
        if self.cache.max_versions == 0 {
            return Err(anyhow!("Cache must retain at least one version"));
        }
        Ok(())
    }
}
