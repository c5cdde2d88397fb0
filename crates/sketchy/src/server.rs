//! `SketchyServer` builder and accept loop.

use std::net::SocketAddr;
use std::path::PathBuf;

use sketchy_game::{GameConfig, WordList};
use sketchy_protocol::JsonCodec;
use sketchy_transport::{Transport, WebSocketTransport};
use tokio::sync::mpsc;

use crate::handler::handle_connection;
use crate::{ServerConfig, ServerError, game_loop};

/// Builder for configuring and starting a Sketchy server.
///
/// # Example
///
/// ```rust,no_run
/// use sketchy::prelude::*;
///
/// # async fn start() -> Result<(), ServerError> {
/// let server = SketchyServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct SketchyServerBuilder {
    config: ServerConfig,
    words: Option<WordList>,
}

impl SketchyServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            words: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind = addr.to_string();
        self
    }

    /// Sets phase durations and limits.
    pub fn game_config(mut self, game: GameConfig) -> Self {
        self.config.game = game;
        self
    }

    /// Loads words from a JSON array file at build time.
    pub fn words_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.words = Some(path.into());
        self
    }

    /// Uses `words` as is, ignoring any configured path.
    pub fn word_list(mut self, words: WordList) -> Self {
        self.words = Some(words);
        self
    }

    /// Loads the word list and binds the listener.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<SketchyServer, ServerError> {
        let words = match (self.words, &self.config.words) {
            (Some(words), _) => words,
            (None, Some(path)) => WordList::load(path)?,
            (None, None) => WordList::default(),
        };
        tracing::info!(words = words.len(), "word list ready");

        let transport = WebSocketTransport::bind(&self.config.bind).await?;

        Ok(SketchyServer {
            transport,
            game: self.config.game,
            words,
            codec: JsonCodec,
        })
    }
}

impl Default for SketchyServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Sketchy server.
///
/// Call [`run()`](Self::run) to start the game loop and accept connections.
pub struct SketchyServer {
    transport: WebSocketTransport,
    game: GameConfig,
    words: WordList,
    codec: JsonCodec,
}

impl SketchyServer {
    /// Creates a new builder.
    pub fn builder() -> SketchyServerBuilder {
        SketchyServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.transport.local_addr()?)
    }

    /// Spawns the game loop, then accepts connections until the process
    /// is terminated, spawning a handler task for each.
    pub async fn run(mut self) -> Result<(), ServerError> {
        let (inbound, events) = mpsc::unbounded_channel();
        tokio::spawn(game_loop::run(self.game, self.words, events));

        tracing::info!("Sketchy server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let inbound = inbound.clone();
                    let codec = self.codec;
                    tokio::spawn(async move {
                        let conn_id = conn.id();
                        if let Err(e) = handle_connection(conn, inbound, codec).await {
                            tracing::debug!(%conn_id, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
