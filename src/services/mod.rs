pub mod aggregator;
pub mod cache;
pub mod dashboard;
pub mod mood_log;
