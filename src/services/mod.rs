pub mod cache;
pub mod ingest;
pub mod recommendation;
