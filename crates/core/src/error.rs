use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlayerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("queue is empty")]
    EmptyQueue,
    #[error("network request failed: {0}")]
    TransientNetworkFailure(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("playlist {0} not found")]
    PlaylistNotFound(u64),
    #[error("local storage error: {0}")]
    Storage(String),
}

impl PlayerError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Network and transport failures can be retried by the user.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidArgument(_))
    }
}

pub type PlayerResult<T> = Result<T, PlayerError>;
