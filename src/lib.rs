pub mod algorithms;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{RecError, RecResult};
pub use models::*;

use anyhow::Result;
use services::cache::MatrixCache;
use services::ingest::{DatFileSource, DatasetSource};
use services::recommendation::RecommendationService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<MatrixCache>,
    pub recommendation_service: Arc<RecommendationService>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let source = DatFileSource::new(&config.data, config.recommendation.scale);
        Self::from_source(config, &source).await
    }

    pub async fn from_source(config: Config, source: &dyn DatasetSource) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let dataset = Arc::new(source.load().await?);

        let engine = algorithms::SimilarityEngine::from_config(&config.similarity)?;
        let cache = Arc::new(MatrixCache::new(engine, &config.cache));

        let recommendation_service = Arc::new(RecommendationService::new(
            dataset,
            cache.clone(),
            config.clone(),
        ));

        // Build the matrices up front so the first request doesn't pay for it.
        recommendation_service.snapshot().await?;

        Ok(Self {
            config,
            cache,
            recommendation_service,
        })
    }
}

pub async fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
