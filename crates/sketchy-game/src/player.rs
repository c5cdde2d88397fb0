//! Roster entries and the per-session reconnect memory.

use std::collections::HashMap;

use sketchy_protocol::{Avatar, ConnectionId, PlayerId, PlayerView};

/// A player on a session's roster.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub avatar: Avatar,
    /// Committed score.
    pub points: f64,
    pub is_drawing: bool,
    pub can_draw_this_round: bool,
    pub has_guessed: bool,
    /// Points earned this turn, committed at reveal.
    pub round_increment: f64,
    /// The connection currently speaking for this player.
    pub conn: ConnectionId,
}

impl Player {
    /// A fresh player with no score who may draw this round.
    pub fn new(
        id: PlayerId,
        username: impl Into<String>,
        avatar: Avatar,
        conn: ConnectionId,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            avatar,
            points: 0.0,
            is_drawing: false,
            can_draw_this_round: true,
            has_guessed: false,
            round_increment: 0.0,
            conn,
        }
    }

    /// A player restored from memory on a new connection.
    pub fn restore(memory: &RememberedPlayer, conn: ConnectionId) -> Self {
        Self {
            points: memory.points,
            ..Self::new(memory.id.clone(), memory.username.clone(), memory.avatar, conn)
        }
    }

    /// The client-facing view. The connection is never exposed.
    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id.clone(),
            username: self.username.clone(),
            avatar: self.avatar,
            points: self.points,
            is_drawing: self.is_drawing,
            can_draw_this_round: self.can_draw_this_round,
            has_guessed: self.has_guessed,
            round_increment: self.round_increment,
        }
    }
}

/// What a session remembers about a player after they leave.
#[derive(Debug, Clone, PartialEq)]
pub struct RememberedPlayer {
    pub id: PlayerId,
    pub username: String,
    pub avatar: Avatar,
    pub points: f64,
}

/// Every player that ever joined a session, kept for reconnection.
///
/// Entries are added on first join and refreshed when a player leaves the
/// roster; they are never removed while the session lives.
#[derive(Debug, Default)]
pub struct PlayerMemory {
    players: HashMap<PlayerId, RememberedPlayer>,
}

impl PlayerMemory {
    /// Records or refreshes `player`'s identity and score.
    pub fn remember(&mut self, player: &Player) {
        self.players.insert(
            player.id.clone(),
            RememberedPlayer {
                id: player.id.clone(),
                username: player.username.clone(),
                avatar: player.avatar,
                points: player.points,
            },
        );
    }

    pub fn get(&self, id: &PlayerId) -> Option<&RememberedPlayer> {
        self.players.get(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }
}
