pub type FrameloomResult<T> = Result<T, FrameloomError>;

#[derive(thiserror::Error, Debug)]
pub enum FrameloomError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("merge error: {0}")]
    Merge(String),

    #[error("output error: {0}")]
    Output(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FrameloomError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn merge(msg: impl Into<String>) -> Self {
        Self::Merge(msg.into())
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
