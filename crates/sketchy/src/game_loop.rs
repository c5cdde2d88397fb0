//! The single task that owns every session.
//!
//! Connection handlers never touch game state. They forward [`Inbound`]
//! events over an mpsc channel, and this loop applies them one at a time,
//! interleaved with timer fires from the [`TokioScheduler`].

use sketchy_game::{ChannelHub, ConnectionSender, GameConfig, SessionManager, TimerEvent, WordList};
use sketchy_protocol::{ClientMessage, ConnectionId};
use sketchy_timer::TokioScheduler;
use tokio::sync::mpsc;

pub(crate) type Manager = SessionManager<TokioScheduler<TimerEvent>, ChannelHub, WordList>;

/// What connection handlers report to the game loop.
#[derive(Debug)]
pub(crate) enum Inbound {
    /// A socket was accepted; `sender` is its outbound queue.
    Connected {
        conn: ConnectionId,
        sender: ConnectionSender,
    },
    /// A decoded client message.
    Message { conn: ConnectionId, msg: ClientMessage },
    /// The socket closed or failed.
    Disconnected { conn: ConnectionId },
}

/// Runs until every inbound sender is dropped.
pub(crate) async fn run(config: GameConfig, words: WordList, mut inbound: mpsc::UnboundedReceiver<Inbound>) {
    let (timers, mut fired) = TokioScheduler::channel();
    let mut manager: Manager = SessionManager::new(config, timers, ChannelHub::new(), words);

    tracing::info!("game loop started");

    loop {
        tokio::select! {
            event = inbound.recv() => match event {
                Some(event) => apply(&mut manager, event),
                None => break,
            },
            Some(fired) = fired.recv() => manager.on_timer(fired),
        }
    }

    tracing::info!("game loop stopped");
}

fn apply(manager: &mut Manager, event: Inbound) {
    match event {
        Inbound::Connected { conn, sender } => {
            tracing::debug!(%conn, "connection registered");
            manager.hub_mut().register(conn, sender);
        }
        Inbound::Message { conn, msg } => manager.handle_client_message(conn, msg),
        Inbound::Disconnected { conn } => {
            tracing::debug!(%conn, "connection unregistered");
            manager.disconnect(conn);
            manager.hub_mut().unregister(conn);
        }
    }
}
