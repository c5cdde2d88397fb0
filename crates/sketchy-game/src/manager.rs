//! Session manager: matchmaking, the start countdown, and event routing.

use std::collections::HashMap;

use sketchy_protocol::{
    Avatar, ClientMessage, ConnectionId, Path, PlayerId, ServerMessage, SessionId,
};
use sketchy_timer::{Fired, Scheduler, TimerToken, as_millis};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::hub::Broadcast;
use crate::player::Player;
use crate::session::{GameSession, Reconnection, SessionContext, TimerEvent, TimerKind};
use crate::words::WordSource;
use crate::{GameConfig, GameError};

/// The manager's collaborators, kept apart from the session registries so
/// both can be borrowed at once.
struct Services<S, B, W> {
    timers: S,
    hub: B,
    words: W,
}

impl<S, B, W> Services<S, B, W>
where
    S: Scheduler<TimerEvent>,
    B: Broadcast,
    W: WordSource,
{
    fn cx(&mut self) -> SessionContext<'_> {
        SessionContext {
            timers: &mut self.timers,
            hub: &mut self.hub,
            words: &self.words,
        }
    }
}

/// Owns every session and routes connection events and timer fires to
/// them.
///
/// Players join the single session currently filling in the queue. Once it
/// holds `min_players`, a start countdown runs; when it fires the session
/// moves to the active registry and starts. There is one countdown for the
/// whole queue, so only one session can be forming at a time.
///
/// The manager is synchronous. The server drives it from one task; tests
/// drive it with a [`sketchy_timer::ManualScheduler`].
pub struct SessionManager<S, B, W> {
    config: GameConfig,
    services: Services<S, B, W>,
    queued: HashMap<SessionId, GameSession>,
    active: HashMap<SessionId, GameSession>,
    /// Which session and player each connection speaks for.
    connections: HashMap<ConnectionId, (SessionId, PlayerId)>,
    /// The running start countdown, if any.
    countdown: Option<(SessionId, TimerToken)>,
}

impl<S, B, W> SessionManager<S, B, W>
where
    S: Scheduler<TimerEvent>,
    B: Broadcast,
    W: WordSource,
{
    pub fn new(config: GameConfig, timers: S, hub: B, words: W) -> Self {
        Self {
            config,
            services: Services { timers, hub, words },
            queued: HashMap::new(),
            active: HashMap::new(),
            connections: HashMap::new(),
            countdown: None,
        }
    }

    // -- introspection ------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn timers(&self) -> &S {
        &self.services.timers
    }

    pub fn timers_mut(&mut self) -> &mut S {
        &mut self.services.timers
    }

    pub fn hub(&self) -> &B {
        &self.services.hub
    }

    pub fn hub_mut(&mut self) -> &mut B {
        &mut self.services.hub
    }

    pub fn queued_count(&self) -> usize {
        self.queued.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Looks a session up in both registries.
    pub fn session(&self, id: &SessionId) -> Option<&GameSession> {
        self.queued.get(id).or_else(|| self.active.get(id))
    }

    pub fn is_queued(&self, id: &SessionId) -> bool {
        self.queued.contains_key(id)
    }

    /// The session and player a connection speaks for.
    pub fn connection(&self, conn: ConnectionId) -> Option<(&SessionId, &PlayerId)> {
        self.connections.get(&conn).map(|(s, p)| (s, p))
    }

    /// Session the start countdown is running for.
    pub fn countdown_session(&self) -> Option<&SessionId> {
        self.countdown.as_ref().map(|(id, _)| id)
    }

    fn session_mut<'a>(
        queued: &'a mut HashMap<SessionId, GameSession>,
        active: &'a mut HashMap<SessionId, GameSession>,
        id: &SessionId,
    ) -> Option<&'a mut GameSession> {
        if let Some(session) = queued.get_mut(id) {
            return Some(session);
        }
        active.get_mut(id)
    }

    // -- dispatch -----------------------------------------------------------

    /// Applies one decoded client message from `conn`.
    pub fn handle_client_message(&mut self, conn: ConnectionId, msg: ClientMessage) {
        match msg {
            ClientMessage::JoinQueue {
                player_id,
                username,
                avatar,
            } => {
                self.join_queue(conn, player_id, username, avatar);
            }
            ClientMessage::Reconnect {
                session_id,
                player_id,
            } => {
                // Failures were already pushed to the client as a reset.
                let _ = self.reconnect(conn, &session_id, &player_id);
            }
            ClientMessage::Chat { text } => self.chat(conn, &text),
            ClientMessage::Draw { paths } => self.stroke_update(conn, paths),
            ClientMessage::PickWord { word } => self.pick_word(conn, &word),
        }
    }

    // -- matchmaking --------------------------------------------------------

    /// Puts a player into the filling session, creating one if needed.
    ///
    /// A player id the session already lists keeps its roster entry and
    /// moves to `conn`. The start countdown is never restarted by a rejoin.
    pub fn join_queue(
        &mut self,
        conn: ConnectionId,
        player_id: PlayerId,
        username: String,
        avatar: Avatar,
    ) -> SessionId {
        let filling = self.queued.keys().next().cloned();
        if let Some(id) = filling.clone() {
            let listed = self
                .queued
                .get(&id)
                .is_some_and(|s| s.player(&player_id).is_some());
            if listed {
                return self.rejoin_queue(conn, id, player_id);
            }
        }

        match self.connections.get(&conn).cloned() {
            Some((sid, old)) if filling.as_ref() == Some(&sid) => {
                // Same session, new identity: the roster size is unchanged,
                // so the countdown keeps running.
                debug!(conn_id = %conn, player_id = %old, "connection switching player in its queued session");
                self.connections.remove(&conn);
                if let Some(session) = self.queued.get_mut(&sid) {
                    session.remove_player(&old, &mut self.services.cx());
                }
            }
            Some(_) => {
                debug!(conn_id = %conn, "connection rejoining queue, leaving its session first");
                self.disconnect(conn);
            }
            None => {}
        }

        let id = self
            .queued
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(|| SessionId::new(Uuid::new_v4().to_string()));
        let config = &self.config;
        let session = self.queued.entry(id.clone()).or_insert_with(|| {
            info!(session_id = %id, "session created");
            GameSession::new(id.clone(), config.clone())
        });

        let mut cx = self.services.cx();
        session.add_player(Player::new(player_id.clone(), username, avatar, conn), &mut cx);
        cx.hub.send_to(
            conn,
            &ServerMessage::Joined {
                session_id: id.clone(),
            },
        );
        self.connections.insert(conn, (id.clone(), player_id));

        self.maybe_start_countdown(&id);
        if let Some(session) = self.queued.get(&id) {
            session.broadcast_snapshot(&mut self.services.cx());
        }
        id
    }

    /// `join_queue` for a player the filling session already lists: the
    /// connection takes over that roster entry instead of adding another.
    fn rejoin_queue(&mut self, conn: ConnectionId, id: SessionId, player_id: PlayerId) -> SessionId {
        if let Some((sid, old)) = self.connections.get(&conn).cloned() {
            if sid != id || old != player_id {
                debug!(conn_id = %conn, "connection leaving its previous player first");
                self.disconnect(conn);
            }
        }

        self.services.hub.send_to(
            conn,
            &ServerMessage::Joined {
                session_id: id.clone(),
            },
        );

        let Some(session) = self.queued.get_mut(&id) else {
            return id;
        };
        match session.reconnect(conn, &player_id, &mut self.services.cx()) {
            Ok(Reconnection::Attached { replaced }) => {
                if let Some(old) = replaced {
                    self.connections.remove(&old);
                }
                self.connections.insert(conn, (id.clone(), player_id));
            }
            Ok(Reconnection::AlreadyAttached) => {}
            Err(e) => warn!(conn_id = %conn, session_id = %id, error = %e, "queue rejoin rejected"),
        }

        if self.maybe_start_countdown(&id) {
            if let Some(session) = self.queued.get(&id) {
                session.broadcast_snapshot(&mut self.services.cx());
            }
        }
        id
    }

    /// Starts the shared countdown for a queued session that has enough
    /// players, unless one is already running.
    fn maybe_start_countdown(&mut self, id: &SessionId) -> bool {
        if self.countdown.is_some() {
            return false;
        }
        let Some(session) = self.queued.get_mut(id) else {
            return false;
        };
        if session.len() < self.config.min_players {
            return false;
        }

        let shown = self.config.start_countdown;
        let timers = &mut self.services.timers;
        let target = timers.now_millis().saturating_add(as_millis(shown));
        let token = timers.schedule(
            self.config.timer_delay(shown),
            TimerEvent::new(id.clone(), TimerKind::StartCountdown),
        );
        session.set_countdown(Some(target));
        self.countdown = Some((id.clone(), token));

        info!(session_id = %id, players = session.len(), "start countdown running");
        true
    }

    fn cancel_countdown(&mut self, id: &SessionId) {
        if self.countdown.as_ref().is_some_and(|(sid, _)| sid == id) {
            if let Some((_, token)) = self.countdown.take() {
                self.services.timers.cancel(token);
            }
            info!(session_id = %id, "start countdown cancelled");
        }
    }

    // -- reconnection -------------------------------------------------------

    /// Attaches `conn` to a session the player was part of.
    ///
    /// On failure the client is sent a `reset` and nothing changes.
    pub fn reconnect(
        &mut self,
        conn: ConnectionId,
        session_id: &SessionId,
        player_id: &PlayerId,
    ) -> Result<(), GameError> {
        let result = self.try_reconnect(conn, session_id, player_id);
        if let Err(e) = &result {
            warn!(conn_id = %conn, session_id = %session_id, player_id = %player_id, error = %e, "reconnect rejected");
            self.services.hub.send_to(
                conn,
                &ServerMessage::Reset {
                    message: e.to_string(),
                },
            );
        }
        result
    }

    fn try_reconnect(
        &mut self,
        conn: ConnectionId,
        session_id: &SessionId,
        player_id: &PlayerId,
    ) -> Result<(), GameError> {
        let session = self
            .session(session_id)
            .ok_or_else(|| GameError::SessionNotFound(session_id.clone()))?;
        if session.memory().get(player_id).is_none() {
            return Err(GameError::UnknownPlayer(
                player_id.clone(),
                session_id.clone(),
            ));
        }

        let elsewhere = self
            .connections
            .get(&conn)
            .is_some_and(|(other, _)| other != session_id);
        if elsewhere {
            debug!(conn_id = %conn, "connection moving to another session");
            self.disconnect(conn);
        }

        let session = Self::session_mut(&mut self.queued, &mut self.active, session_id)
            .ok_or_else(|| GameError::SessionNotFound(session_id.clone()))?;
        let outcome = session.reconnect(conn, player_id, &mut self.services.cx())?;

        if let Reconnection::Attached { replaced } = outcome {
            if let Some(old) = replaced {
                self.connections.remove(&old);
            }
            self.connections
                .insert(conn, (session_id.clone(), player_id.clone()));

            if self.maybe_start_countdown(session_id) {
                if let Some(session) = self.queued.get(session_id) {
                    session.broadcast_snapshot(&mut self.services.cx());
                }
            }
        }
        self.reap(session_id);
        Ok(())
    }

    // -- departures ---------------------------------------------------------

    /// Handles a closed connection. Unknown connections are ignored.
    pub fn disconnect(&mut self, conn: ConnectionId) {
        let Some((session_id, player_id)) = self.connections.remove(&conn) else {
            debug!(conn_id = %conn, "disconnect from unattached connection");
            return;
        };
        info!(conn_id = %conn, session_id = %session_id, player_id = %player_id, "player disconnected");

        if let Some(session) = self.queued.get_mut(&session_id) {
            let mut cx = self.services.cx();
            session.remove_player(&player_id, &mut cx);
            if session.is_empty() {
                session.destroy(&mut cx);
            }
            let below_minimum = session.len() < self.config.min_players;
            if below_minimum {
                session.set_countdown(None);
                self.cancel_countdown(&session_id);
            }
            if let Some(session) = self.queued.get(&session_id) {
                if !session.is_destroyed() {
                    let mut cx = self.services.cx();
                    session.broadcast_snapshot(&mut cx);
                }
            }
        } else if let Some(session) = self.active.get_mut(&session_id) {
            session.leave(&player_id, &mut self.services.cx());
        }

        self.reap(&session_id);
    }

    // -- in-game events -----------------------------------------------------

    fn resolve(&self, conn: ConnectionId) -> Option<(SessionId, PlayerId)> {
        let found = self.connections.get(&conn).cloned();
        if found.is_none() {
            debug!(conn_id = %conn, "event from unattached connection ignored");
        }
        found
    }

    /// Chat line or guess from `conn`.
    pub fn chat(&mut self, conn: ConnectionId, text: &str) {
        let Some((sid, pid)) = self.resolve(conn) else {
            return;
        };
        if let Some(session) = Self::session_mut(&mut self.queued, &mut self.active, &sid) {
            session.handle_message(&pid, text, &mut self.services.cx());
        }
        self.reap(&sid);
    }

    /// Stroke batch from `conn`.
    pub fn stroke_update(&mut self, conn: ConnectionId, paths: Vec<Path>) {
        let Some((sid, pid)) = self.resolve(conn) else {
            return;
        };
        if let Some(session) = self.active.get(&sid) {
            session.stroke_update(&pid, paths, &mut self.services.cx());
        }
    }

    /// Word choice from `conn`.
    pub fn pick_word(&mut self, conn: ConnectionId, word: &str) {
        let Some((sid, pid)) = self.resolve(conn) else {
            return;
        };
        if let Some(session) = self.active.get_mut(&sid) {
            session.pick_word(&pid, word, &mut self.services.cx());
        }
        self.reap(&sid);
    }

    // -- timers -------------------------------------------------------------

    /// Routes a fired timer to the countdown or its session.
    pub fn on_timer(&mut self, fired: Fired<TimerEvent>) {
        let session_id = fired.event.session.clone();

        if fired.event.kind == TimerKind::StartCountdown {
            let live = self
                .countdown
                .as_ref()
                .is_some_and(|(sid, token)| *sid == session_id && *token == fired.token);
            if !live {
                debug!(session_id = %session_id, token = %fired.token, "stale start countdown ignored");
                return;
            }
            self.countdown = None;
            self.promote(&session_id);
            return;
        }

        match Self::session_mut(&mut self.queued, &mut self.active, &session_id) {
            Some(session) => session.on_timer(fired, &mut self.services.cx()),
            None => debug!(session_id = %session_id, "timer for a removed session ignored"),
        }
        self.reap(&session_id);
    }

    fn promote(&mut self, id: &SessionId) {
        let Some(mut session) = self.queued.remove(id) else {
            warn!(session_id = %id, "countdown fired for a session no longer queued");
            return;
        };
        info!(session_id = %id, players = session.len(), "session promoted");
        session.start(&mut self.services.cx());
        self.active.insert(id.clone(), session);
        self.reap(id);
    }

    /// Drops a destroyed session and everything pointing at it.
    fn reap(&mut self, id: &SessionId) {
        let destroyed = self
            .session(id)
            .is_some_and(GameSession::is_destroyed);
        if !destroyed {
            return;
        }
        self.queued.remove(id);
        self.active.remove(id);
        self.connections.retain(|_, (sid, _)| sid != id);
        self.cancel_countdown(id);
        debug!(session_id = %id, "session removed from registry");
    }
}
