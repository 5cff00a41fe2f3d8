pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod fact_pack;
pub mod monitoring;
pub mod oracle;

pub use config::{Config, EngineConfig};
pub use engine::{ConsensusEngine, Prediction};
pub use error::{CourtSeerError, Result};
