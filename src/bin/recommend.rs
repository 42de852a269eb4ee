use anyhow::Result;
use clap::Parser;
use neighborec::{init_tracing, AppState, Config, RecommendationRequest};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Overrides the data directory from the config file.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[arg(short, long)]
    user: u32,

    /// Number of similar users to draw recommendations from.
    #[arg(short, long)]
    neighbors: Option<usize>,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing().await;

    let mut config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };
    if let Some(dir) = args.data_dir {
        config.data.dir = dir;
    }

    let num_neighbors = args
        .neighbors
        .unwrap_or(config.recommendation.default_neighbors);
    let state = AppState::new(config).await?;

    let request = RecommendationRequest {
        user_id: args.user,
        num_neighbors,
    };
    let response = state
        .recommendation_service
        .get_recommendations(&request)
        .await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
