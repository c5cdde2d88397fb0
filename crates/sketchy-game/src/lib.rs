//! Game sessions and matchmaking for Sketchy.
//!
//! A session is one drawing-and-guessing game: players take turns drawing
//! a secret word while the others guess it in chat, scored by who guesses,
//! over a fixed number of rounds.
//!
//! # Key types
//!
//! - [`GameSession`]: per-room state machine (phases, roster, scoring)
//! - [`SessionManager`]: queue, start countdown, routing of connection
//!   events and timer fires
//! - [`Broadcast`] / [`ChannelHub`]: channel-scoped fan-out to connections
//! - [`WordSource`] / [`WordList`]: where secret words come from
//! - [`GameConfig`]: phase durations and limits
//!
//! Everything here is synchronous. Timers are armed through a
//! [`sketchy_timer::Scheduler`] and come back as [`TimerEvent`] values
//! passed to [`SessionManager::on_timer`].

mod config;
mod error;
mod hub;
mod manager;
mod player;
mod session;
mod words;

pub use config::GameConfig;
pub use error::GameError;
pub use hub::{Broadcast, ChannelHub, ConnectionSender};
pub use manager::SessionManager;
pub use player::{Player, PlayerMemory, RememberedPlayer};
pub use session::{GameSession, Reconnection, SessionContext, TimerEvent, TimerKind};
pub use words::{WordList, WordSource};
