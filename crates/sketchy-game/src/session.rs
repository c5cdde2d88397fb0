//! One game room: roster, phases, scoring, and phase timers.
//!
//! A [`GameSession`] is a plain synchronous state machine. It never spawns
//! tasks or sleeps. Everything it needs from the outside world comes in
//! through a [`SessionContext`]:
//!
//! - a [`Scheduler`] to arm phase timers (the fire comes back later through
//!   [`GameSession::on_timer`]),
//! - a [`Broadcast`] hub to publish snapshots, chat, and strokes,
//! - a [`WordSource`] for the drawer's options.
//!
//! # Phases
//!
//! ```text
//! queue → showing_round_number → picking_word → drawing → revealing_word
//!                  ↑                   ↑                         │
//!                  │                   └──── next turn ──────────┤
//!                  └────────────────── new round ────────────────┤
//!                                                                ↓
//!                                                 result → (destroyed)
//! ```
//!
//! # Timer slots
//!
//! The session keeps the token of every timer it armed in a slot:
//! `advance` (the next phase), `pick` (word pick timeout), and `draw`
//! (drawing timeout). A fire is only acted on when its token is still in
//! its slot, and acting on it empties the slot. Any other fire is stale.
//!
//! The pick slot doubles as the commit token for the race between the
//! drawer's `pick_word` and the pick timeout: whichever takes the token
//! first commits a word, the other finds the slot empty and does nothing.

use sketchy_protocol::{
    ChatEntry, ConnectionId, Path, Phase, PlayerId, ServerMessage, SessionId,
    SessionSnapshot, mask_word,
};
use sketchy_timer::{Fired, Scheduler, TimerToken, as_millis};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::hub::Broadcast;
use crate::player::{Player, PlayerMemory};
use crate::words::WordSource;
use crate::{GameConfig, GameError};

// ---------------------------------------------------------------------------
// Timer events
// ---------------------------------------------------------------------------

/// What a fired timer should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Matchmaking countdown ran out: promote the queued session.
    StartCountdown,
    /// Round screen or reveal ended: next drawer picks a word.
    NextTurn,
    /// Reveal at the end of a round ended: show the next round number.
    NewRound,
    /// Reveal of the final round ended: show results.
    EndGame,
    /// Result screen ended: tear the session down.
    Destroy,
    /// The drawer did not pick in time.
    PickTimeout,
    /// Drawing time ran out.
    DrawTimeout,
}

impl TimerKind {
    /// Returns `true` for kinds that live in the phase-advance slot.
    pub fn is_advance(&self) -> bool {
        matches!(
            self,
            Self::NextTurn | Self::NewRound | Self::EndGame | Self::Destroy
        )
    }
}

/// Payload of every timer armed by sessions and the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEvent {
    pub session: SessionId,
    pub kind: TimerKind,
}

impl TimerEvent {
    pub fn new(session: SessionId, kind: TimerKind) -> Self {
        Self { session, kind }
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Borrowed collaborators a session acts through.
pub struct SessionContext<'a> {
    pub timers: &'a mut dyn Scheduler<TimerEvent>,
    pub hub: &'a mut dyn Broadcast,
    pub words: &'a dyn WordSource,
}

/// Outcome of a successful [`GameSession::reconnect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconnection {
    /// The connection was already in the session; nothing was re-added.
    AlreadyAttached,
    /// The connection now speaks for the player. `replaced` is the
    /// connection it took over from, when the player was still listed.
    Attached { replaced: Option<ConnectionId> },
}

/// Absolute deadline `shown` from now, as displayed to clients.
fn deadline(cx: &SessionContext<'_>, shown: Duration) -> Option<u64> {
    Some(cx.timers.now_millis().saturating_add(as_millis(shown)))
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// State of one game room.
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    private_channel: String,
    config: GameConfig,
    players: Vec<Player>,
    memory: PlayerMemory,
    phase: Phase,
    round: u32,
    word: Option<String>,
    drawer: Option<PlayerId>,
    options: Vec<String>,
    guess_count: usize,
    countdown_target: Option<u64>,
    advance_timer: Option<TimerToken>,
    pick_timer: Option<TimerToken>,
    draw_timer: Option<TimerToken>,
    destroyed: bool,
}

impl GameSession {
    /// Creates an empty session in the queue phase.
    pub fn new(id: SessionId, config: GameConfig) -> Self {
        let private_channel = format!("{id}-private");
        Self {
            id,
            private_channel,
            config,
            players: Vec::new(),
            memory: PlayerMemory::default(),
            phase: Phase::Queue,
            round: 0,
            word: None,
            drawer: None,
            options: Vec::new(),
            guess_count: 0,
            countdown_target: None,
            advance_timer: None,
            pick_timer: None,
            draw_timer: None,
            destroyed: false,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Name of the channel every member is subscribed to.
    pub fn channel(&self) -> &str {
        self.id.as_str()
    }

    /// Name of the drawer-and-guessers channel.
    pub fn private_channel(&self) -> &str {
        &self.private_channel
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn word(&self) -> Option<&str> {
        self.word.as_deref()
    }

    pub fn drawer(&self) -> Option<&PlayerId> {
        self.drawer.as_ref()
    }

    /// Words offered to the current drawer, empty once one is committed.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn guess_count(&self) -> usize {
        self.guess_count
    }

    pub fn countdown_target(&self) -> Option<u64> {
        self.countdown_target
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn memory(&self) -> &PlayerMemory {
        &self.memory
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Number of timer slots currently holding a token.
    pub fn armed_timers(&self) -> usize {
        [self.advance_timer, self.pick_timer, self.draw_timer]
            .iter()
            .filter(|t| t.is_some())
            .count()
    }

    /// Sets or clears the displayed deadline. Used by the manager for the
    /// matchmaking countdown.
    pub fn set_countdown(&mut self, target: Option<u64>) {
        self.countdown_target = target;
    }

    fn index_of(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| &p.id == id)
    }

    fn drawer_index(&self) -> Option<usize> {
        self.drawer.as_ref().and_then(|id| self.index_of(id))
    }

    fn event(&self, kind: TimerKind) -> TimerEvent {
        TimerEvent::new(self.id.clone(), kind)
    }

    // -- snapshots and notices ---------------------------------------------

    /// The session as clients see it.
    ///
    /// Unless `privileged`, the word is masked in every phase but the
    /// reveal.
    pub fn snapshot(&self, privileged: bool) -> SessionSnapshot {
        let word = match &self.word {
            Some(w) if !privileged && self.phase != Phase::RevealingWord => Some(mask_word(w)),
            other => other.clone(),
        };
        SessionSnapshot {
            id: self.id.clone(),
            players: self.players.iter().map(Player::view).collect(),
            state: self.phase,
            round: self.round,
            word,
            countdown_target: self.countdown_target,
        }
    }

    /// Publishes the snapshot to every member. While drawing, only the
    /// drawer receives the unmasked word.
    pub fn broadcast_snapshot(&self, cx: &mut SessionContext<'_>) {
        let drawer_conn = self.drawer_index().map(|i| self.players[i].conn);
        match (self.phase, drawer_conn) {
            (Phase::Drawing, Some(conn)) => {
                let masked = ServerMessage::GameUpdate {
                    game: self.snapshot(false),
                };
                cx.hub.publish_except(self.channel(), conn, &masked);
                cx.hub.send_to(
                    conn,
                    &ServerMessage::GameUpdate {
                        game: self.snapshot(true),
                    },
                );
            }
            _ => {
                let msg = ServerMessage::GameUpdate {
                    game: self.snapshot(false),
                };
                cx.hub.publish(self.channel(), &msg);
            }
        }
    }

    fn announce(&self, cx: &mut SessionContext<'_>, entry: ChatEntry) {
        cx.hub
            .publish(self.channel(), &ServerMessage::Chat { entry });
    }

    fn green(&self, cx: &mut SessionContext<'_>, message: String) {
        self.announce(cx, ChatEntry::Green { message });
    }

    fn blue(&self, cx: &mut SessionContext<'_>, message: String) {
        self.announce(cx, ChatEntry::Blue { message });
    }

    // -- timers -------------------------------------------------------------

    fn cancel_slot(slot: &mut Option<TimerToken>, cx: &mut SessionContext<'_>) {
        if let Some(token) = slot.take() {
            cx.timers.cancel(token);
        }
    }

    fn arm_advance(&mut self, kind: TimerKind, shown: Duration, cx: &mut SessionContext<'_>) {
        Self::cancel_slot(&mut self.advance_timer, cx);
        let event = self.event(kind);
        self.advance_timer = Some(cx.timers.schedule(self.config.timer_delay(shown), event));
    }

    fn cancel_all_timers(&mut self, cx: &mut SessionContext<'_>) {
        Self::cancel_slot(&mut self.advance_timer, cx);
        Self::cancel_slot(&mut self.pick_timer, cx);
        Self::cancel_slot(&mut self.draw_timer, cx);
    }

    /// Acts on a fired timer if its token is still armed.
    pub fn on_timer(&mut self, fired: Fired<TimerEvent>, cx: &mut SessionContext<'_>) {
        let Fired { token, event } = fired;
        if self.destroyed {
            debug!(session_id = %self.id, %token, "timer fired after destroy, ignored");
            return;
        }

        let slot = match event.kind {
            kind if kind.is_advance() => &mut self.advance_timer,
            TimerKind::PickTimeout => &mut self.pick_timer,
            TimerKind::DrawTimeout => &mut self.draw_timer,
            _ => {
                debug!(session_id = %self.id, kind = ?event.kind, "timer not owned by session");
                return;
            }
        };
        if *slot != Some(token) {
            debug!(session_id = %self.id, %token, kind = ?event.kind, "stale timer ignored");
            return;
        }
        *slot = None;

        match event.kind {
            TimerKind::NextTurn => self.start_next_turn(cx),
            TimerKind::NewRound => self.start_new_round(cx),
            TimerKind::EndGame => self.end_game(cx),
            TimerKind::Destroy => self.destroy(cx),
            TimerKind::PickTimeout => {
                let word = cx.words.one();
                debug!(session_id = %self.id, "pick timed out, word chosen for drawer");
                self.commit_word(word, cx);
            }
            TimerKind::DrawTimeout => self.reveal_word(cx),
            TimerKind::StartCountdown => {}
        }
    }

    // -- roster -------------------------------------------------------------

    /// Adds a player to the end of the roster and subscribes their
    /// connection to the session channel.
    pub fn add_player(&mut self, player: Player, cx: &mut SessionContext<'_>) {
        cx.hub.join(self.channel(), player.conn);
        self.memory.remember(&player);
        info!(
            session_id = %self.id,
            player_id = %player.id,
            conn_id = %player.conn,
            players = self.players.len() + 1,
            "player joined session"
        );
        self.players.push(player);
    }

    /// Takes a player off the roster without any game consequence.
    ///
    /// Their score is saved to memory and their connection leaves both
    /// channels.
    pub fn remove_player(
        &mut self,
        id: &PlayerId,
        cx: &mut SessionContext<'_>,
    ) -> Option<Player> {
        let idx = self.index_of(id)?;
        let player = self.players.remove(idx);
        self.memory.remember(&player);
        cx.hub.leave(self.channel(), player.conn);
        cx.hub.leave(&self.private_channel, player.conn);
        info!(
            session_id = %self.id,
            player_id = %player.id,
            players = self.players.len(),
            "player left session"
        );
        Some(player)
    }

    /// Reattaches a remembered player on `conn`.
    pub fn reconnect(
        &mut self,
        conn: ConnectionId,
        id: &PlayerId,
        cx: &mut SessionContext<'_>,
    ) -> Result<Reconnection, GameError> {
        let remembered = self
            .memory
            .get(id)
            .cloned()
            .ok_or_else(|| GameError::UnknownPlayer(id.clone(), self.id.clone()))?;

        if cx.hub.is_member(self.channel(), conn) {
            self.broadcast_snapshot(cx);
            self.green(cx, format!("{} has joined the game", remembered.username));
            return Ok(Reconnection::AlreadyAttached);
        }

        let replaced = match self.index_of(id) {
            Some(idx) => {
                let player = &mut self.players[idx];
                let old = std::mem::replace(&mut player.conn, conn);
                let privileged = player.is_drawing || player.has_guessed;
                cx.hub.leave(self.id.as_str(), old);
                cx.hub.leave(&self.private_channel, old);
                if privileged {
                    cx.hub.join(&self.private_channel, conn);
                }
                Some(old)
            }
            None => {
                self.players.push(Player::restore(&remembered, conn));
                None
            }
        };
        cx.hub.join(self.channel(), conn);

        info!(
            session_id = %self.id,
            player_id = %id,
            conn_id = %conn,
            phase = %self.phase,
            "player reconnected"
        );

        self.broadcast_snapshot(cx);
        if self.phase == Phase::PickingWord && self.drawer.as_ref() == Some(id) {
            cx.hub.send_to(
                conn,
                &ServerMessage::PickWord {
                    options: self.options.clone(),
                },
            );
        }
        self.green(
            cx,
            format!("{} has reconnected to the game", remembered.username),
        );
        Ok(Reconnection::Attached { replaced })
    }

    /// Handles a player leaving a started game.
    ///
    /// - result phase: quiet removal, destroy once empty
    /// - last player: nothing happens, the game runs out on its own
    /// - two players: the other one wins
    /// - the drawer: the turn is cancelled
    /// - anyone else: removed, and the early reveal is re-checked
    pub fn leave(&mut self, id: &PlayerId, cx: &mut SessionContext<'_>) {
        let Some(idx) = self.index_of(id) else {
            debug!(session_id = %self.id, player_id = %id, "leave from unknown player");
            return;
        };

        if self.phase == Phase::Result {
            self.remove_player(id, cx);
            if self.players.is_empty() {
                self.destroy(cx);
            }
            return;
        }

        if self.players.len() == 1 {
            debug!(session_id = %self.id, player_id = %id, "last player left, session kept");
            return;
        }

        let username = self.players[idx].username.clone();
        let left = format!("{username} has left the game");

        if self.players.len() == 2 {
            self.remove_player(id, cx);
            self.blue(cx, left);
            self.end_game(cx);
            return;
        }

        if self.phase.has_drawer() && self.drawer.as_ref() == Some(id) {
            self.blue(cx, left);
            self.cancel_turn(cx);
            return;
        }

        let had_guessed = self.players[idx].has_guessed;
        self.remove_player(id, cx);
        if had_guessed {
            self.guess_count = self.guess_count.saturating_sub(1);
        }
        self.broadcast_snapshot(cx);
        self.blue(cx, left);
        self.check_all_guessed(cx);
    }

    // -- phase transitions -------------------------------------------------

    /// Leaves the queue and begins round 1.
    pub fn start(&mut self, cx: &mut SessionContext<'_>) {
        info!(session_id = %self.id, players = self.players.len(), "game started");
        self.start_new_round(cx);
    }

    /// Shows the next round number, then starts its first turn.
    pub fn start_new_round(&mut self, cx: &mut SessionContext<'_>) {
        self.round += 1;
        self.phase = Phase::ShowingRoundNumber;
        self.word = None;
        self.drawer = None;
        self.options.clear();
        self.countdown_target = deadline(cx, self.config.round_intro);
        self.arm_advance(TimerKind::NextTurn, self.config.round_intro, cx);

        info!(session_id = %self.id, round = self.round, "round started");
        self.broadcast_snapshot(cx);
    }

    /// Hands the drawer role to the next eligible player and offers them
    /// words.
    ///
    /// Eligible players are scanned from the end of the roster, so a round
    /// runs in reverse join order.
    pub fn start_next_turn(&mut self, cx: &mut SessionContext<'_>) {
        for p in &mut self.players {
            p.round_increment = 0.0;
        }
        cx.hub
            .publish(self.channel(), &ServerMessage::Draw { paths: Vec::new() });

        self.phase = Phase::PickingWord;
        self.word = None;
        self.options.clear();
        self.countdown_target = deadline(cx, self.config.pick_word);

        let Some(idx) = self.players.iter().rposition(|p| p.can_draw_this_round) else {
            warn!(session_id = %self.id, "no eligible drawer, closing round");
            self.drawer = None;
            self.finish_round(cx);
            return;
        };

        let drawer = &mut self.players[idx];
        drawer.is_drawing = true;
        let conn = drawer.conn;
        self.drawer = Some(drawer.id.clone());
        cx.hub.join(&self.private_channel, conn);

        self.options = cx.words.sample(self.config.word_options);
        info!(
            session_id = %self.id,
            player_id = %self.players[idx].id,
            round = self.round,
            "turn started"
        );

        self.broadcast_snapshot(cx);
        cx.hub.send_to(
            conn,
            &ServerMessage::PickWord {
                options: self.options.clone(),
            },
        );

        Self::cancel_slot(&mut self.pick_timer, cx);
        let event = self.event(TimerKind::PickTimeout);
        self.pick_timer = Some(
            cx.timers
                .schedule(self.config.timer_delay(self.config.pick_word), event),
        );
    }

    /// The drawer's choice. Returns `true` if it committed the word.
    ///
    /// Ignored unless `id` is the current drawer, the word was among the
    /// offered options, and the pick timeout has not already committed.
    pub fn pick_word(&mut self, id: &PlayerId, word: &str, cx: &mut SessionContext<'_>) -> bool {
        if self.phase != Phase::PickingWord || self.drawer.as_ref() != Some(id) {
            debug!(session_id = %self.id, player_id = %id, phase = %self.phase, "pick from non-drawer ignored");
            return false;
        }
        if !self.options.iter().any(|o| o == word) {
            debug!(session_id = %self.id, player_id = %id, "picked word was not offered");
            return false;
        }
        let Some(token) = self.pick_timer.take() else {
            debug!(session_id = %self.id, player_id = %id, "pick arrived after commit");
            return false;
        };
        cx.timers.cancel(token);
        self.commit_word(word.to_string(), cx);
        true
    }

    fn commit_word(&mut self, word: String, cx: &mut SessionContext<'_>) {
        self.word = Some(word);
        self.options.clear();
        self.start_drawing_phase(cx);
    }

    fn start_drawing_phase(&mut self, cx: &mut SessionContext<'_>) {
        self.phase = Phase::Drawing;
        self.guess_count = 0;
        self.countdown_target = deadline(cx, self.config.draw);

        if let Some(idx) = self.drawer_index() {
            let name = self.players[idx].username.clone();
            self.blue(cx, format!("{name} is now drawing!"));
        }
        self.broadcast_snapshot(cx);

        Self::cancel_slot(&mut self.draw_timer, cx);
        let event = self.event(TimerKind::DrawTimeout);
        self.draw_timer = Some(
            cx.timers
                .schedule(self.config.timer_delay(self.config.draw), event),
        );
    }

    /// Relays the drawer's strokes to everyone else. Anything else is
    /// dropped.
    pub fn stroke_update(&self, id: &PlayerId, paths: Vec<Path>, cx: &mut SessionContext<'_>) {
        if self.phase != Phase::Drawing || self.drawer.as_ref() != Some(id) {
            debug!(session_id = %self.id, player_id = %id, "strokes from non-drawer ignored");
            return;
        }
        if let Some(idx) = self.drawer_index() {
            cx.hub.publish_except(
                self.channel(),
                self.players[idx].conn,
                &ServerMessage::Draw { paths },
            );
        }
    }

    /// A chat line, which may be a guess.
    pub fn handle_message(&mut self, from: &PlayerId, text: &str, cx: &mut SessionContext<'_>) {
        let Some(idx) = self.index_of(from) else {
            debug!(session_id = %self.id, player_id = %from, "chat from unknown player");
            return;
        };

        let sender = &self.players[idx];
        if sender.has_guessed || sender.is_drawing {
            let entry = ChatEntry::TextPrivate {
                from: sender.username.clone(),
                message: text.to_string(),
            };
            cx.hub
                .publish(&self.private_channel, &ServerMessage::Chat { entry });
            return;
        }

        let is_correct = self.phase == Phase::Drawing && self.word.as_deref() == Some(text);
        if !is_correct {
            let entry = ChatEntry::Text {
                from: sender.username.clone(),
                message: text.to_string(),
            };
            self.announce(cx, entry);
            return;
        }

        self.guess_count += 1;
        let guesser = &mut self.players[idx];
        guesser.has_guessed = true;
        guesser.round_increment = 1.0;
        let increment = guesser.round_increment;
        let conn = guesser.conn;
        let name = guesser.username.clone();
        if let Some(d) = self.drawer_index() {
            self.players[d].round_increment = increment / 2.0;
        }
        cx.hub.join(&self.private_channel, conn);

        info!(session_id = %self.id, player_id = %from, guesses = self.guess_count, "word guessed");
        self.green(cx, format!("{name} has guessed the word"));
        self.broadcast_snapshot(cx);
        self.check_all_guessed(cx);
    }

    fn check_all_guessed(&mut self, cx: &mut SessionContext<'_>) {
        if self.phase == Phase::Drawing
            && self.players.len() > 1
            && self.guess_count >= self.players.len() - 1
        {
            debug!(session_id = %self.id, "everyone guessed, revealing early");
            self.reveal_word(cx);
        }
    }

    /// Ends the turn: commits increments and shows the word to everyone.
    pub fn reveal_word(&mut self, cx: &mut SessionContext<'_>) {
        Self::cancel_slot(&mut self.draw_timer, cx);

        let drawer_idx = self.drawer_index();
        let is_new_round = drawer_idx == Some(0);

        if let Some(i) = drawer_idx {
            let drawer = &mut self.players[i];
            drawer.can_draw_this_round = false;
            drawer.is_drawing = false;
            drawer.points += drawer.round_increment;
        }
        self.drawer = None;
        self.close_turn(is_new_round, drawer_idx, cx);
    }

    /// Reveal bookkeeping shared by a normal reveal and a cancelled drawing
    /// turn. `skip` is the drawer whose increment was already committed.
    fn close_turn(&mut self, is_new_round: bool, skip: Option<usize>, cx: &mut SessionContext<'_>) {
        self.phase = Phase::RevealingWord;
        self.countdown_target = deadline(cx, self.config.reveal);
        self.guess_count = 0;

        for (i, p) in self.players.iter_mut().enumerate() {
            if is_new_round {
                p.can_draw_this_round = true;
            }
            cx.hub.leave(&self.private_channel, p.conn);
            p.has_guessed = false;
            if Some(i) != skip {
                p.points += p.round_increment;
            }
        }

        info!(session_id = %self.id, round = self.round, is_new_round, "word revealed");
        self.broadcast_snapshot(cx);

        let next = if !is_new_round {
            TimerKind::NextTurn
        } else if self.round >= self.config.max_rounds {
            TimerKind::EndGame
        } else {
            TimerKind::NewRound
        };
        self.arm_advance(next, self.config.reveal, cx);
    }

    fn finish_round(&mut self, cx: &mut SessionContext<'_>) {
        for p in &mut self.players {
            p.can_draw_this_round = true;
        }
        if self.round >= self.config.max_rounds {
            self.end_game(cx);
        } else {
            self.start_new_round(cx);
        }
    }

    /// Removes the departing drawer and moves on without them.
    ///
    /// While picking, the next turn (or round) starts immediately. While
    /// drawing, the word is revealed to the remaining players.
    pub fn cancel_turn(&mut self, cx: &mut SessionContext<'_>) {
        let Some(drawer) = self.drawer.clone() else {
            return;
        };
        let Some(idx) = self.index_of(&drawer) else {
            return;
        };
        let wrapped = idx == 0;
        info!(session_id = %self.id, player_id = %drawer, phase = %self.phase, "turn cancelled");

        match self.phase {
            Phase::PickingWord => {
                Self::cancel_slot(&mut self.pick_timer, cx);
                self.remove_player(&drawer, cx);
                self.drawer = None;
                self.options.clear();
                for p in &self.players {
                    cx.hub.leave(&self.private_channel, p.conn);
                }
                self.broadcast_snapshot(cx);
                if wrapped {
                    self.finish_round(cx);
                } else {
                    self.start_next_turn(cx);
                }
            }
            Phase::Drawing => {
                Self::cancel_slot(&mut self.draw_timer, cx);
                self.remove_player(&drawer, cx);
                self.drawer = None;
                self.close_turn(wrapped, None, cx);
            }
            _ => {}
        }
    }

    /// Shows the result screen, then destroys the session.
    pub fn end_game(&mut self, cx: &mut SessionContext<'_>) {
        self.cancel_all_timers(cx);
        self.phase = Phase::Result;
        self.word = None;
        self.drawer = None;
        self.options.clear();
        self.guess_count = 0;
        for p in &mut self.players {
            p.is_drawing = false;
            p.has_guessed = false;
            cx.hub.leave(&self.private_channel, p.conn);
        }
        self.countdown_target = deadline(cx, self.config.result);

        let winner = self.winner().map(Player::view);
        info!(
            session_id = %self.id,
            winner = ?winner.as_ref().map(|w| w.id.to_string()),
            "game over"
        );

        self.broadcast_snapshot(cx);
        cx.hub.publish(
            self.channel(),
            &ServerMessage::GameOver {
                winner: winner.clone(),
            },
        );
        if let Some(w) = winner {
            self.green(cx, format!("{} won the game!", w.username));
        }
        self.arm_advance(TimerKind::Destroy, self.config.result, cx);
    }

    /// Highest score, earliest on the roster among equals.
    pub fn winner(&self) -> Option<&Player> {
        self.players.iter().fold(None, |best, p| match best {
            Some(b) if b.points >= p.points => Some(b),
            _ => Some(p),
        })
    }

    /// Tears the session down. Terminal.
    pub fn destroy(&mut self, cx: &mut SessionContext<'_>) {
        self.cancel_all_timers(cx);
        for p in &self.players {
            cx.hub.leave(self.id.as_str(), p.conn);
            cx.hub.leave(&self.private_channel, p.conn);
        }
        cx.hub.close_channel(self.id.as_str());
        cx.hub.close_channel(&self.private_channel);

        self.players.clear();
        self.memory.clear();
        self.word = None;
        self.drawer = None;
        self.options.clear();
        self.countdown_target = None;
        self.destroyed = true;
        info!(session_id = %self.id, "session destroyed");
    }
}
