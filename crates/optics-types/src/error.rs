use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpticsError {
    #[error("Parameter error: {0}")]
    ParamError(String),

    #[error("Unknown sampling source: {0}")]
    UnknownSamplingSource(String),

    #[error("Evaluation cancelled before this row was started")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type OpticsResult<T> = Result<T, OpticsError>;
