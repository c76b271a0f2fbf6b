pub mod metrics;
pub mod ranker;

pub use metrics::derive_metrics;
pub use ranker::ResourceRanker;
