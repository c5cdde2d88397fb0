//! Error types for the game layer.

use sketchy_protocol::{PlayerId, SessionId};

/// Errors that can occur during session and word-list operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// No queued or active session has this id.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// The player never joined this session.
    #[error("player {0} is unknown to session {1}")]
    UnknownPlayer(PlayerId, SessionId),

    /// A word list must hold at least one word.
    #[error("word list is empty")]
    EmptyWordList,

    /// The word list file could not be read.
    #[error("failed to read word list: {0}")]
    WordListIo(#[from] std::io::Error),

    /// The word list file is not a JSON array of strings.
    #[error("failed to parse word list: {0}")]
    WordListParse(#[from] serde_json::Error),
}
