pub mod adapter;
pub mod council;
pub mod parser;
pub mod providers;
pub mod simulated;

pub use adapter::{OracleAdapter, OracleOutcome, OracleResponse, OracleVerdict};
pub use council::OracleCouncil;
pub use parser::{ParsedVerdict, ResponseParser};
pub use providers::{AnthropicOracle, GeminiOracle, OpenAiOracle};
pub use simulated::SimulatedOracle;
