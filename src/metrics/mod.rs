// src/metrics/mod.rs

pub mod aggregator;
pub mod extractor;

pub use aggregator::MetricAggregator;
pub use extractor::MetricExtractor;
