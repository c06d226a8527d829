use std::fmt;

use thiserror::Error;

use crate::graph::UserId;

/// Which end of a friend-chain query an id was supplied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    End,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Start => write!(f, "start"),
            Endpoint::End => write!(f, "end"),
        }
    }
}

/// Main error type for Friendgraph
#[derive(Error, Debug)]
pub enum FriendGraphError {
    /// A friends.get call for one user did not succeed
    #[error("Failed to fetch friends of {user_id}: {message}")]
    FetchFailed {
        user_id: UserId,
        /// HTTP status, when the server answered at all
        status: Option<u16>,
        message: String,
    },

    /// A friend-chain query referenced an id that is not a graph key
    #[error("{role} user {user_id} is not in the graph")]
    NodeNotInGraph { role: Endpoint, user_id: UserId },

    /// BFS exhausted every reachable user without meeting the target
    #[error("No friend chain from {start} to {end}")]
    PathNotFound { start: UserId, end: UserId },

    /// Persisted graph JSON did not have the expected shape
    #[error("Malformed graph file: {0}")]
    MalformedGraph(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl FriendGraphError {
    /// Whether another attempt at the same request could succeed.
    ///
    /// Rate limiting (429), server errors (5xx) and transport failures with no
    /// status are retryable; anything else is a definitive answer.
    pub fn is_retryable(&self) -> bool {
        match self {
            FriendGraphError::FetchFailed { status: None, .. } => true,
            FriendGraphError::FetchFailed {
                status: Some(code), ..
            } => *code == 429 || (500..600).contains(code),
            _ => false,
        }
    }
}

/// Convenient Result type using FriendGraphError
pub type Result<T> = std::result::Result<T, FriendGraphError>;
