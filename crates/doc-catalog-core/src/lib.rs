pub mod config;
pub mod dedupe;
pub mod engine;
pub mod error;
pub mod export;
pub mod hasher;
pub mod progress;
pub mod record;
pub mod storage;
pub mod walker;

pub use config::{CatalogConfig, ConflictPolicy};
pub use engine::{CatalogEngine, EngineState, RunReport};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
