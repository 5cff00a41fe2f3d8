pub mod model;
pub mod prompt;

pub use model::{FactPack, Figure, HomeAway, Injury, MathModel, Odds, RestTravel, TeamMetrics, Teams};
pub use prompt::{AnalystRole, PromptBuilder};
