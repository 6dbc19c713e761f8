use thiserror::Error;

#[derive(Error, Debug)]
pub enum PuzzleError {
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("unknown game mode: {0}")]
    UnknownMode(String),

    #[error("unknown game: {0}")]
    UnknownGame(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PuzzleError>;
