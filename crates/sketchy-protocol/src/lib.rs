//! Wire protocol for Sketchy.
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`SessionSnapshot`],
//!   [`ChatEntry`], ...): the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   turned into text frames and back.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (text frames) → Protocol (messages) → Game (sessions)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use sketchy_transport::ConnectionId;
pub use types::{
    Avatar, ChatEntry, ClientMessage, Path, Phase, PlayerId, PlayerView, Point, ServerMessage,
    SessionId, SessionSnapshot, mask_word,
};
