pub mod constants;
pub mod error;
pub mod match3;
pub mod maze;
pub mod rng;
pub mod types;

pub use error::{PuzzleError, Result};
pub use match3::{now_ms, Match3Engine, Match3Options, SettleReport, SurvivalMode, SurvivalTick};
pub use maze::{GenerationReport, MazeEngine, MazeOptions, MazeRun, MoveOutcome};
pub use rng::{default_source, RandomSource, Rng};
