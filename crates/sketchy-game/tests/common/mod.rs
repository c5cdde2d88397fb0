//! Shared harness: a manager on a virtual clock with in-memory inboxes.

#![allow(dead_code)]

use std::collections::HashMap;

use sketchy_game::{
    ChannelHub, GameConfig, GameSession, SessionManager, TimerEvent, TimerKind, WordSource,
};
use sketchy_protocol::{
    Avatar, ChatEntry, ConnectionId, Phase, PlayerId, ServerMessage, SessionId, SessionSnapshot,
};
use sketchy_timer::{Fired, ManualScheduler, Scheduler};
use tokio::sync::mpsc;

/// Clock start for every test.
pub const EPOCH: u64 = 1_000_000;

/// Word used when the pick timer runs out.
pub const FALLBACK: &str = "fallback";

/// Offers the first `n` words in order and falls back to [`FALLBACK`].
pub struct FixedWords(pub Vec<String>);

impl Default for FixedWords {
    fn default() -> Self {
        Self(
            ["apple", "boat", "cloud", "drum"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
        )
    }
}

impl WordSource for FixedWords {
    fn sample(&self, n: usize) -> Vec<String> {
        self.0.iter().take(n).cloned().collect()
    }

    fn one(&self) -> String {
        FALLBACK.to_string()
    }
}

pub type Manager = SessionManager<ManualScheduler<TimerEvent>, ChannelHub, FixedWords>;

pub fn pid(id: &str) -> PlayerId {
    PlayerId::new(id)
}

pub struct Harness {
    pub manager: Manager,
    inboxes: HashMap<ConnectionId, mpsc::UnboundedReceiver<ServerMessage>>,
    next_conn: u64,
    pub session_id: Option<SessionId>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    pub fn with_config(config: GameConfig) -> Self {
        Self {
            manager: SessionManager::new(
                config,
                ManualScheduler::new(EPOCH),
                ChannelHub::new(),
                FixedWords::default(),
            ),
            inboxes: HashMap::new(),
            next_conn: 1,
            session_id: None,
        }
    }

    /// Registers a new connection with the hub.
    pub fn connect(&mut self) -> ConnectionId {
        let conn = ConnectionId::new(self.next_conn);
        self.next_conn += 1;
        let (tx, rx) = mpsc::unbounded_channel();
        self.manager.hub_mut().register(conn, tx);
        self.inboxes.insert(conn, rx);
        conn
    }

    /// Connects and joins the queue as player `name`.
    pub fn join(&mut self, name: &str) -> ConnectionId {
        let conn = self.connect();
        let id = self
            .manager
            .join_queue(conn, pid(name), name.to_uppercase(), Avatar::default());
        self.session_id = Some(id);
        conn
    }

    /// Disconnects and unregisters a connection, as the server does.
    pub fn drop_conn(&mut self, conn: ConnectionId) {
        self.manager.disconnect(conn);
        self.manager.hub_mut().unregister(conn);
    }

    pub fn sid(&self) -> SessionId {
        self.session_id.clone().expect("nobody joined yet")
    }

    pub fn session(&self) -> &GameSession {
        self.manager
            .session(&self.sid())
            .expect("session should exist")
    }

    pub fn session_exists(&self) -> bool {
        self.manager.session(&self.sid()).is_some()
    }

    pub fn phase(&self) -> Phase {
        self.session().phase()
    }

    pub fn drawer(&self) -> Option<PlayerId> {
        self.session().drawer().cloned()
    }

    pub fn now(&self) -> u64 {
        self.manager.timers().now_millis()
    }

    /// Fires the earliest pending timer. Returns `false` if none is armed.
    pub fn fire_next(&mut self) -> bool {
        match self.manager.timers_mut().fire_next() {
            Some(fired) => {
                self.manager.on_timer(fired);
                true
            }
            None => false,
        }
    }

    /// Runs the clock forward by `ms`, firing everything due on the way.
    pub fn advance(&mut self, ms: u64) {
        let deadline = self.now() + ms;
        while let Some(fired) = self.manager.timers_mut().next_due(deadline) {
            self.manager.on_timer(fired);
        }
        self.manager.timers_mut().advance_to(deadline);
    }

    /// Fires timers until the session reaches `phase`.
    pub fn run_until(&mut self, phase: Phase) {
        for _ in 0..200 {
            if self.session_exists() && self.phase() == phase {
                return;
            }
            assert!(self.fire_next(), "ran out of timers before reaching {phase}");
        }
        panic!("never reached {phase}");
    }

    /// Copy of the pending timer of `kind`, to deliver late.
    pub fn pending(&self, kind: TimerKind) -> Fired<TimerEvent> {
        self.manager
            .timers()
            .pending_events()
            .into_iter()
            .find(|f| f.event.kind == kind)
            .unwrap_or_else(|| panic!("no pending {kind:?} timer"))
    }

    /// Takes everything delivered to `conn` so far.
    pub fn drain(&mut self, conn: ConnectionId) -> Vec<ServerMessage> {
        let rx = self.inboxes.get_mut(&conn).expect("unknown connection");
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    pub fn drain_all(&mut self) {
        let conns: Vec<_> = self.inboxes.keys().copied().collect();
        for conn in conns {
            self.drain(conn);
        }
    }
}

/// Snapshots among `msgs`.
pub fn snapshots(msgs: &[ServerMessage]) -> Vec<&SessionSnapshot> {
    msgs.iter()
        .filter_map(|m| match m {
            ServerMessage::GameUpdate { game } => Some(game),
            _ => None,
        })
        .collect()
}

/// Chat entries among `msgs`.
pub fn chats(msgs: &[ServerMessage]) -> Vec<&ChatEntry> {
    msgs.iter()
        .filter_map(|m| match m {
            ServerMessage::Chat { entry } => Some(entry),
            _ => None,
        })
        .collect()
}

/// Text of every green or blue notice among `msgs`.
pub fn notices(msgs: &[ServerMessage]) -> Vec<String> {
    chats(msgs)
        .into_iter()
        .filter_map(|e| match e {
            ChatEntry::Green { message } | ChatEntry::Blue { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// Checks the drawer invariant: one drawer exactly while a turn is on.
pub fn assert_drawer_invariant(session: &GameSession) {
    let drawing = session.players().iter().filter(|p| p.is_drawing).count();
    if session.phase().has_drawer() {
        assert_eq!(drawing, 1, "exactly one drawer in {}", session.phase());
    } else {
        assert_eq!(drawing, 0, "no drawer in {}", session.phase());
    }
    if !session.is_empty() {
        assert!(session.guess_count() <= session.len() - 1);
    }
}
