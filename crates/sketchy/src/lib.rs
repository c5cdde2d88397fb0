//! # Sketchy
//!
//! Server for a multiplayer drawing-and-guessing game. Players queue up,
//! get grouped into sessions, and take turns drawing a secret word while
//! everyone else guesses it in chat.
//!
//! The server ties the layers together:
//!
//! ```text
//! Transport (WebSocket) → Protocol (JSON messages) → Game loop → SessionManager
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sketchy::prelude::*;
//!
//! # async fn start() -> Result<(), ServerError> {
//! let config = ServerConfig::from_env()?;
//! let server = SketchyServer::builder().config(config).build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod game_loop;
mod handler;
mod server;

pub use config::{BIND_VAR, CONFIG_VAR, MAX_ROUNDS_VAR, ServerConfig, WORDS_VAR};
pub use error::ServerError;
pub use server::{SketchyServer, SketchyServerBuilder};

/// Installs the global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to `default_filter`.
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

/// Re-exports for running a server or writing a client against it.
pub mod prelude {
    pub use crate::{ServerConfig, ServerError, SketchyServer, SketchyServerBuilder};
    pub use sketchy_game::{GameConfig, WordList};
    pub use sketchy_protocol::{
        Avatar, ChatEntry, ClientMessage, Codec, JsonCodec, Path, Phase, PlayerId, PlayerView,
        Point, ServerMessage, SessionId, SessionSnapshot,
    };
}
