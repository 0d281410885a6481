pub mod detect;
pub mod loader;
pub mod types;

pub use detect::{detect_application_type, glob_to_regex, pattern_matches};
pub use loader::{StrategyError, StrategyResult, load_strategies};
pub use types::{FALLBACK_STRATEGY, Literal, Sequence, Step, Strategy, StrategyConfig, TestSettings};
