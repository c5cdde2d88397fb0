//! Game configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Durations and limits for every session a manager creates.
///
/// Durations are written as milliseconds in config files:
///
/// ```json
/// { "draw": 90000, "max_rounds": 5 }
/// ```
///
/// Missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Matchmaking countdown once enough players are queued.
    #[serde(with = "millis")]
    pub start_countdown: Duration,

    /// "Round N" screen shown before the first turn of a round.
    #[serde(with = "millis")]
    pub round_intro: Duration,

    /// How long the drawer has to choose a word.
    #[serde(with = "millis")]
    pub pick_word: Duration,

    /// How long the drawer has to draw.
    #[serde(with = "millis")]
    pub draw: Duration,

    /// How long the word stays revealed between turns.
    #[serde(with = "millis")]
    pub reveal: Duration,

    /// How long the result screen stays up before the session is torn down.
    #[serde(with = "millis")]
    pub result: Duration,

    /// Added to every phase timer but not to the displayed deadline, so a
    /// client countdown reaches zero just before the phase actually ends.
    #[serde(with = "millis")]
    pub time_offset: Duration,

    /// Rounds per game. A round is one full pass of the roster.
    pub max_rounds: u32,

    /// Players needed before the start countdown runs.
    pub min_players: usize,

    /// Words offered to the drawer each turn.
    pub word_options: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_countdown: Duration::from_secs(15),
            round_intro: Duration::from_secs(3),
            pick_word: Duration::from_secs(15),
            draw: Duration::from_secs(120),
            reveal: Duration::from_secs(5),
            result: Duration::from_secs(6),
            time_offset: Duration::from_secs(1),
            max_rounds: 3,
            min_players: 2,
            word_options: 3,
        }
    }
}

impl GameConfig {
    /// Timer delay for a phase whose on-screen countdown is `shown`.
    pub fn timer_delay(&self, shown: Duration) -> Duration {
        shown + self.time_offset
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(sketchy_timer::as_millis(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
