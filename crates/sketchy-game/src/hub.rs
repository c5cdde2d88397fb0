//! Channel-scoped message fan-out.
//!
//! A session publishes to named channels rather than to individual
//! players. Each session uses two:
//!
//! - the session channel (`"<session id>"`): everyone in the game
//! - the private channel (`"<session id>-private"`): the drawer and the
//!   players who already guessed the word
//!
//! [`ChannelHub`] delivers to per-connection mpsc queues. The server's
//! writer task for each connection drains its queue onto the socket.

use std::collections::{BTreeSet, HashMap};

use sketchy_protocol::{ConnectionId, ServerMessage};
use tokio::sync::mpsc;

/// Outbound queue for one connection.
pub type ConnectionSender = mpsc::UnboundedSender<ServerMessage>;

/// Publish/subscribe over named channels plus point-to-point sends.
pub trait Broadcast {
    /// Subscribes `conn` to `channel`. Joining twice is a no-op.
    fn join(&mut self, channel: &str, conn: ConnectionId);

    /// Unsubscribes `conn` from `channel`.
    fn leave(&mut self, channel: &str, conn: ConnectionId);

    fn is_member(&self, channel: &str, conn: ConnectionId) -> bool;

    /// Sends `msg` to every member of `channel`.
    fn publish(&mut self, channel: &str, msg: &ServerMessage);

    /// Sends `msg` to every member of `channel` except `except`.
    fn publish_except(&mut self, channel: &str, except: ConnectionId, msg: &ServerMessage);

    /// Sends `msg` to one connection, member of anything or not.
    fn send_to(&mut self, conn: ConnectionId, msg: &ServerMessage);

    /// Drops `channel` and all its memberships.
    fn close_channel(&mut self, channel: &str);
}

/// [`Broadcast`] over registered per-connection senders.
///
/// Membership is kept even for connections whose sender was never
/// registered or has since closed; messages to them are dropped.
#[derive(Debug, Default)]
pub struct ChannelHub {
    senders: HashMap<ConnectionId, ConnectionSender>,
    channels: HashMap<String, BTreeSet<ConnectionId>>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the outbound queue for a connection.
    pub fn register(&mut self, conn: ConnectionId, sender: ConnectionSender) {
        self.senders.insert(conn, sender);
    }

    /// Forgets a connection and removes it from every channel.
    pub fn unregister(&mut self, conn: ConnectionId) {
        self.senders.remove(&conn);
        self.channels.retain(|_, members| {
            members.remove(&conn);
            !members.is_empty()
        });
    }

    /// Members of `channel` in connection-id order.
    pub fn members(&self, channel: &str) -> Vec<ConnectionId> {
        self.channels
            .get(channel)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn deliver(&self, conn: ConnectionId, msg: &ServerMessage) {
        if let Some(tx) = self.senders.get(&conn) {
            if tx.send(msg.clone()).is_err() {
                tracing::trace!(%conn, "outbound queue closed, message dropped");
            }
        }
    }
}

impl Broadcast for ChannelHub {
    fn join(&mut self, channel: &str, conn: ConnectionId) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .insert(conn);
    }

    fn leave(&mut self, channel: &str, conn: ConnectionId) {
        if let Some(members) = self.channels.get_mut(channel) {
            members.remove(&conn);
            if members.is_empty() {
                self.channels.remove(channel);
            }
        }
    }

    fn is_member(&self, channel: &str, conn: ConnectionId) -> bool {
        self.channels
            .get(channel)
            .is_some_and(|m| m.contains(&conn))
    }

    fn publish(&mut self, channel: &str, msg: &ServerMessage) {
        if let Some(members) = self.channels.get(channel) {
            for conn in members {
                self.deliver(*conn, msg);
            }
        }
    }

    fn publish_except(&mut self, channel: &str, except: ConnectionId, msg: &ServerMessage) {
        if let Some(members) = self.channels.get(channel) {
            for conn in members.iter().filter(|c| **c != except) {
                self.deliver(*conn, msg);
            }
        }
    }

    fn send_to(&mut self, conn: ConnectionId, msg: &ServerMessage) {
        self.deliver(conn, msg);
    }

    fn close_channel(&mut self, channel: &str) {
        self.channels.remove(channel);
    }
}
