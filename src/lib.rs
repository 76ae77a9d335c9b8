// src/lib.rs

pub mod aggregate;
pub mod bugfix;
pub mod churn;
pub mod complexity;
pub mod config;
pub mod contributors;
pub mod error;
pub mod history;
pub mod logging;
#[cfg(feature = "syntax-metrics")]
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod velocity;

#[cfg(test)]
mod testing;

pub use config::AnalysisConfig;
pub use error::{AlmanacError, Result};
pub use pipeline::{analyze_repository, Pipeline};
pub use report::FullReport;
