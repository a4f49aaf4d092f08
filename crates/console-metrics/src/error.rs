use thiserror::Error;

pub type MetricsResult<T> = Result<T, MetricsError>;

#[derive(Debug, Error)]
pub enum MetricsError {
    /// Token usage arrived before any connected signal initialized the totals.
    #[error("token usage received before the session connected")]
    SessionNotConnected,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("metrics bus closed")]
    BusClosed,
}
