//! Core protocol types for Sketchy's wire format.
//!
//! Every type here travels on the wire as JSON. Client and server both
//! speak in [`ClientMessage`] / [`ServerMessage`]; everything else is a
//! building block of those two enums.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's stable external identifier.
///
/// Chosen by the client (it survives page reloads), so it is an opaque
/// string rather than a server-assigned number. `#[serde(transparent)]`
/// keeps it a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Creates a player id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one game session (one room).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Creates a session id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Avatar descriptor: three small indices into the client's sprite sheets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub body: u8,
    pub eyes: u8,
    pub mouth: u8,
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The named state of a session's state machine.
///
/// ```text
/// Queue → ShowingRoundNumber → PickingWord → Drawing → RevealingWord
///                 ↑                 ↑                        │
///                 │                 └──── next turn ─────────┤
///                 └──────────────── new round ───────────────┤
///                                                            ↓
///                                                         Result
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Queue,
    ShowingRoundNumber,
    PickingWord,
    Drawing,
    RevealingWord,
    Result,
}

impl Phase {
    /// Returns `true` while somebody holds the drawer role.
    pub fn has_drawer(&self) -> bool {
        matches!(self, Self::PickingWord | Self::Drawing)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Queue => "queue",
            Self::ShowingRoundNumber => "showing_round_number",
            Self::PickingWord => "picking_word",
            Self::Drawing => "drawing",
            Self::RevealingWord => "revealing_word",
            Self::Result => "result",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// One roster entry as clients see it. Connection handles never leave
/// the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub username: String,
    pub avatar: Avatar,
    pub points: f64,
    pub is_drawing: bool,
    pub can_draw_this_round: bool,
    pub has_guessed: bool,
    pub round_increment: f64,
}

/// The authoritative view of a session pushed to clients.
///
/// `word` is either the real word, the masked word, or `None` when no
/// word has been chosen. `countdown_target` is an absolute Unix timestamp
/// in milliseconds so clients can render a countdown without trusting
/// their own notion of "now" for the phase start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub players: Vec<PlayerView>,
    pub state: Phase,
    pub round: u32,
    pub word: Option<String>,
    pub countdown_target: Option<u64>,
}

/// Replaces every non-whitespace character with `_`.
///
/// Keeps the word's length and spacing visible to guessers.
pub fn mask_word(word: &str) -> String {
    word.chars()
        .map(|c| if c.is_whitespace() { c } else { '_' })
        .collect()
}

// ---------------------------------------------------------------------------
// Chat and strokes
// ---------------------------------------------------------------------------

/// A chat line or system notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChatEntry {
    /// Public chat from a player.
    Text { from: String, message: String },
    /// Chat visible only to the drawer and players who already guessed.
    TextPrivate { from: String, message: String },
    /// Positive system notice (correct guess, reconnection, winner).
    Green { message: String },
    /// Neutral system notice (new drawer, departures).
    Blue { message: String },
}

/// A point on the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One freehand stroke. Opaque to the server; relayed as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub points: Vec<Point>,
    pub color: String,
    pub width: f64,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter matchmaking.
    JoinQueue {
        player_id: PlayerId,
        username: String,
        avatar: Avatar,
    },
    /// Attach this connection to a session the player was part of.
    Reconnect {
        session_id: SessionId,
        player_id: PlayerId,
    },
    /// A chat line or a guess.
    Chat { text: String },
    /// A batch of strokes from the drawer.
    Draw { paths: Vec<Path> },
    /// The drawer's choice among the offered words.
    PickWord { word: String },
}

/// Messages the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Reply to `join_queue`: the session the player was placed in.
    Joined { session_id: SessionId },
    /// Full session snapshot.
    GameUpdate { game: SessionSnapshot },
    /// A chat line or notice.
    Chat { entry: ChatEntry },
    /// Strokes to draw. An empty batch clears the surface.
    Draw { paths: Vec<Path> },
    /// Sent to the drawer only: pick one of these.
    PickWord { options: Vec<String> },
    /// The game ended; `winner` is `None` only for an empty roster.
    GameOver { winner: Option<PlayerView> },
    /// The client should go back to the lobby.
    Reset { message: String },
    /// The last client message was rejected.
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The client parses these shapes directly, so the serde attributes
    //! are checked against concrete JSON.

    use super::*;

    fn view(id: &str) -> PlayerView {
        PlayerView {
            id: PlayerId::new(id),
            username: id.to_uppercase(),
            avatar: Avatar { body: 1, eyes: 2, mouth: 3 },
            points: 1.5,
            is_drawing: false,
            can_draw_this_round: true,
            has_guessed: false,
            round_increment: 0.0,
        }
    }

    #[test]
    fn test_player_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PlayerId::new("u-1")).unwrap();
        assert_eq!(json, "\"u-1\"");
    }

    #[test]
    fn test_ids_display_raw_value() {
        assert_eq!(PlayerId::new("abc").to_string(), "abc");
        assert_eq!(SessionId::new("s-9").to_string(), "s-9");
    }

    #[test]
    fn test_phase_serializes_snake_case() {
        let json = serde_json::to_string(&Phase::ShowingRoundNumber).unwrap();
        assert_eq!(json, "\"showing_round_number\"");
        let json = serde_json::to_string(&Phase::RevealingWord).unwrap();
        assert_eq!(json, "\"revealing_word\"");
    }

    #[test]
    fn test_phase_display_matches_wire_name() {
        for phase in [
            Phase::Queue,
            Phase::ShowingRoundNumber,
            Phase::PickingWord,
            Phase::Drawing,
            Phase::RevealingWord,
            Phase::Result,
        ] {
            let wire = serde_json::to_string(&phase).unwrap();
            assert_eq!(wire.trim_matches('"'), phase.to_string());
        }
    }

    #[test]
    fn test_phase_has_drawer() {
        assert!(Phase::PickingWord.has_drawer());
        assert!(Phase::Drawing.has_drawer());
        assert!(!Phase::Queue.has_drawer());
        assert!(!Phase::ShowingRoundNumber.has_drawer());
        assert!(!Phase::RevealingWord.has_drawer());
        assert!(!Phase::Result.has_drawer());
    }

    #[test]
    fn test_mask_word_keeps_spaces() {
        assert_eq!(mask_word("ice cream"), "___ _____");
        assert_eq!(mask_word("cat"), "___");
        assert_eq!(mask_word(""), "");
    }

    #[test]
    fn test_mask_word_counts_chars_not_bytes() {
        assert_eq!(mask_word("café"), "____");
    }

    #[test]
    fn test_chat_entry_json_format() {
        let entry = ChatEntry::TextPrivate {
            from: "ana".into(),
            message: "nice".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "text-private");
        assert_eq!(json["from"], "ana");

        let json = serde_json::to_value(ChatEntry::Green { message: "x".into() }).unwrap();
        assert_eq!(json["type"], "green");
        assert!(json.get("from").is_none());
    }

    #[test]
    fn test_snapshot_json_has_no_connection_field() {
        let snapshot = SessionSnapshot {
            id: SessionId::new("s"),
            players: vec![view("a")],
            state: Phase::Drawing,
            round: 2,
            word: Some("___".into()),
            countdown_target: Some(1_700_000_000_000),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["state"], "drawing");
        assert_eq!(json["countdown_target"], 1_700_000_000_000u64);
        let player = json["players"][0].as_object().unwrap();
        assert_eq!(player.len(), 8);
        assert!(!player.contains_key("connection"));
        assert_eq!(player["avatar"]["mouth"], 3);
    }

    #[test]
    fn test_client_message_join_queue_parses() {
        let raw = r#"{
            "type": "join_queue",
            "player_id": "u-7",
            "username": "Bea",
            "avatar": { "body": 0, "eyes": 4, "mouth": 2 }
        }"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinQueue {
                player_id: PlayerId::new("u-7"),
                username: "Bea".into(),
                avatar: Avatar { body: 0, eyes: 4, mouth: 2 },
            }
        );
    }

    #[test]
    fn test_client_message_draw_parses_paths() {
        let raw = r##"{
            "type": "draw",
            "paths": [{ "points": [{"x": 1, "y": 2.5}], "color": "#000", "width": 4 }]
        }"##;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        let ClientMessage::Draw { paths } = msg else {
            panic!("expected draw");
        };
        assert_eq!(paths[0].points[0], Point { x: 1.0, y: 2.5 });
        assert_eq!(paths[0].width, 4.0);
    }

    #[test]
    fn test_server_message_pick_word_json_format() {
        let msg = ServerMessage::PickWord {
            options: vec!["a".into(), "b".into(), "c".into()],
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "pick_word");
        assert_eq!(json["options"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_server_message_game_over_without_winner() {
        let json = serde_json::to_value(ServerMessage::GameOver { winner: None }).unwrap();
        assert_eq!(json["type"], "game_over");
        assert!(json["winner"].is_null());
    }

    #[test]
    fn test_decode_unknown_client_message_type_returns_error() {
        let unknown = r#"{"type": "fly_to_moon", "speed": 9000}"#;
        let result: Result<ClientMessage, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }
}
