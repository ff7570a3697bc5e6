pub mod config;
pub mod github;
pub mod metrics;
pub mod reporter;
pub mod telemetry;
pub mod types;

pub use reporter::{AccessError, StatisticsReporter};
