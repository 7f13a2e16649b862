use thiserror::Error;

#[derive(Error, Debug)]
pub enum TeamScoreError {
    #[error("team not found: {0}")]
    TeamNotFound(String),

    #[error("no team id supplied and no active team set")]
    NoActiveTeam,

    #[error("invalid team: {0}")]
    InvalidTeam(String),

    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TeamScoreError>;
