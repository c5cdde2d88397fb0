//! Unified error type for the Sketchy server.

use std::path::PathBuf;

use sketchy_game::GameError;
use sketchy_protocol::ProtocolError;
use sketchy_transport::TransportError;

/// Top-level error that wraps the errors of every layer.
///
/// The `#[from]` variants let `?` lift transport, protocol and game errors
/// into this type without explicit mapping.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding, accepting, sending or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Loading the word list or a game operation failed.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`ServerConfig`](crate::ServerConfig).
    #[error("invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// An environment override holds a value that doesn't parse.
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    /// The game loop has stopped; no more events can be delivered.
    #[error("game loop is not running")]
    LoopClosed,
}

#[cfg(test)]
mod tests {
    use sketchy_protocol::SessionId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::InvalidUtf8;
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Transport(_)));
        assert!(server_err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Protocol(_)));
        assert!(server_err.to_string().contains("bad"));
    }

    #[test]
    fn test_from_game_error() {
        let err = GameError::SessionNotFound(SessionId::new("s-1"));
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Game(_)));
        assert!(server_err.to_string().contains("s-1"));
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::ConfigParse(_)));
    }

    #[test]
    fn test_invalid_env_names_variable() {
        let err = ServerError::InvalidEnv {
            var: "SKETCHY_MAX_ROUNDS",
            value: "many".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for SKETCHY_MAX_ROUNDS: \"many\""
        );
    }
}
