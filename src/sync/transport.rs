//! Transport abstraction and an in-memory network.
//!
//! A [`Transport`] is one peer's view of the network: it can address other
//! peers by id and yields [`PeerEvent`]s in arrival order. Delivery is
//! best-effort; a lost message is simply never seen.
//!
//! [`MemoryNetwork`] connects any number of [`MemoryTransport`] endpoints in
//! one thread. Links are explicit (`connect`/`disconnect` raise the matching
//! events on both sides) and messages can be lost on purpose, either at a
//! seeded random rate or by scripting the next N drops on a link.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

use crate::error::TransportError;
use crate::game::{DeterministicRng, PlayerId};
use crate::sync::wire::{Envelope, encode};

/// Something that happened on the network, from one peer's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// A link to `peer` opened.
    Connected(PlayerId),
    /// The link to `peer` closed.
    Disconnected(PlayerId),
    /// Raw bytes arrived from `from`.
    Message {
        /// Sender.
        from: PlayerId,
        /// Encoded [`Envelope`]; may be malformed.
        payload: Vec<u8>,
    },
}

/// One peer's handle on the network.
pub trait Transport {
    /// This peer's id.
    fn local_id(&self) -> &str;

    /// Ids of peers with an open link, in sorted order.
    fn peers(&self) -> Vec<PlayerId>;

    /// Send to a single peer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the peer is unknown, not connected, or
    /// the envelope cannot be encoded. A message lost in transit is not an
    /// error.
    fn send(&mut self, to: &str, envelope: &Envelope) -> Result<(), TransportError>;

    /// Send to every connected peer.
    ///
    /// # Errors
    ///
    /// See [`Transport::send`].
    fn broadcast(&mut self, envelope: &Envelope) -> Result<(), TransportError> {
        for peer in self.peers() {
            self.send(&peer, envelope)?;
        }
        Ok(())
    }

    /// Send to every connected peer except `except`.
    ///
    /// # Errors
    ///
    /// See [`Transport::send`].
    fn broadcast_except(&mut self, except: &str, envelope: &Envelope) -> Result<(), TransportError> {
        for peer in self.peers() {
            if peer != except {
                self.send(&peer, envelope)?;
            }
        }
        Ok(())
    }

    /// Next inbound event, if any.
    fn poll_event(&mut self) -> Option<PeerEvent>;
}

/// Delivery counters of a [`MemoryNetwork`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    /// Messages placed in an inbox.
    pub delivered: u64,
    /// Messages lost on purpose.
    pub dropped: u64,
}

#[derive(Debug)]
struct NetworkInner {
    inboxes: BTreeMap<PlayerId, VecDeque<PeerEvent>>,
    /// Open links, stored as (smaller id, larger id).
    links: BTreeSet<(PlayerId, PlayerId)>,
    /// Scripted losses per directed link: (from, to) -> remaining drops.
    scripted: BTreeMap<(PlayerId, PlayerId), u32>,
    drop_rate_percent: u8,
    rng: DeterministicRng,
    stats: NetworkStats,
}

fn link_key(a: &str, b: &str) -> (PlayerId, PlayerId) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl NetworkInner {
    fn push(&mut self, to: &str, event: PeerEvent) {
        if let Some(inbox) = self.inboxes.get_mut(to) {
            inbox.push_back(event);
        }
    }

    fn deliver(&mut self, from: &str, to: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        if !self.inboxes.contains_key(to) {
            return Err(TransportError::UnknownPeer(to.to_string()));
        }
        if !self.links.contains(&link_key(from, to)) {
            return Err(TransportError::NotConnected(to.to_string()));
        }

        let key = (from.to_string(), to.to_string());
        if let Some(remaining) = self.scripted.get_mut(&key) {
            *remaining -= 1;
            if *remaining == 0 {
                self.scripted.remove(&key);
            }
            self.stats.dropped += 1;
            return Ok(());
        }
        if self.drop_rate_percent > 0 && self.rng.below(100) < u64::from(self.drop_rate_percent) {
            self.stats.dropped += 1;
            return Ok(());
        }

        self.stats.delivered += 1;
        self.push(
            to,
            PeerEvent::Message {
                from: from.to_string(),
                payload,
            },
        );
        Ok(())
    }
}

/// A single-threaded network of [`MemoryTransport`] endpoints.
///
/// Cloning yields another handle on the same network.
#[derive(Debug, Clone)]
pub struct MemoryNetwork {
    inner: Rc<RefCell<NetworkInner>>,
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNetwork {
    /// A lossless network.
    #[must_use]
    pub fn new() -> Self {
        Self::with_loss(0, 0)
    }

    /// A network that drops `drop_rate_percent` of messages, chosen by a
    /// generator seeded with `seed`. Connection events are never dropped.
    #[must_use]
    pub fn with_loss(seed: u64, drop_rate_percent: u8) -> Self {
        Self {
            inner: Rc::new(RefCell::new(NetworkInner {
                inboxes: BTreeMap::new(),
                links: BTreeSet::new(),
                scripted: BTreeMap::new(),
                drop_rate_percent: drop_rate_percent.min(100),
                rng: DeterministicRng::new(seed),
                stats: NetworkStats::default(),
            })),
        }
    }

    /// Register `id` and return its endpoint. Registering an id twice
    /// returns a second handle on the same inbox.
    #[must_use]
    pub fn endpoint(&self, id: &str) -> MemoryTransport {
        self.inner
            .borrow_mut()
            .inboxes
            .entry(id.to_string())
            .or_default();
        MemoryTransport {
            id: id.to_string(),
            network: self.clone(),
        }
    }

    /// Open a link between two registered peers. Both see `Connected`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnknownPeer`] if either id is unregistered.
    pub fn connect(&self, a: &str, b: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.borrow_mut();
        for id in [a, b] {
            if !inner.inboxes.contains_key(id) {
                return Err(TransportError::UnknownPeer(id.to_string()));
            }
        }
        if inner.links.insert(link_key(a, b)) {
            inner.push(a, PeerEvent::Connected(b.to_string()));
            inner.push(b, PeerEvent::Connected(a.to_string()));
        }
        Ok(())
    }

    /// Close a link. Both sides see `Disconnected`; messages already queued
    /// stay queued.
    pub fn disconnect(&self, a: &str, b: &str) {
        let mut inner = self.inner.borrow_mut();
        if inner.links.remove(&link_key(a, b)) {
            inner.push(a, PeerEvent::Disconnected(b.to_string()));
            inner.push(b, PeerEvent::Disconnected(a.to_string()));
        }
    }

    /// Whether a link between `a` and `b` is open.
    #[must_use]
    pub fn is_connected(&self, a: &str, b: &str) -> bool {
        self.inner.borrow().links.contains(&link_key(a, b))
    }

    /// Lose the next `count` messages sent from `from` to `to`.
    pub fn drop_next(&self, from: &str, to: &str, count: u32) {
        if count == 0 {
            return;
        }
        *self
            .inner
            .borrow_mut()
            .scripted
            .entry((from.to_string(), to.to_string()))
            .or_default() += count;
    }

    /// Place raw bytes in `to`'s inbox as if `from` had sent them,
    /// bypassing links and loss.
    pub fn inject(&self, from: &str, to: &str, payload: Vec<u8>) {
        self.inner.borrow_mut().push(
            to,
            PeerEvent::Message {
                from: from.to_string(),
                payload,
            },
        );
    }

    /// Events waiting in all inboxes.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().inboxes.values().map(VecDeque::len).sum()
    }

    /// Delivery counters so far.
    #[must_use]
    pub fn stats(&self) -> NetworkStats {
        self.inner.borrow().stats
    }
}

/// One endpoint of a [`MemoryNetwork`].
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    id: PlayerId,
    network: MemoryNetwork,
}

impl MemoryTransport {
    /// The network this endpoint belongs to.
    #[must_use]
    pub const fn network(&self) -> &MemoryNetwork {
        &self.network
    }
}

impl Transport for MemoryTransport {
    fn local_id(&self) -> &str {
        &self.id
    }

    fn peers(&self) -> Vec<PlayerId> {
        self.network
            .inner
            .borrow()
            .links
            .iter()
            .filter_map(|(a, b)| {
                if *a == self.id {
                    Some(b.clone())
                } else if *b == self.id {
                    Some(a.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    fn send(&mut self, to: &str, envelope: &Envelope) -> Result<(), TransportError> {
        let payload = encode(envelope)?;
        self.network.inner.borrow_mut().deliver(&self.id, to, payload)
    }

    fn poll_event(&mut self) -> Option<PeerEvent> {
        self.network
            .inner
            .borrow_mut()
            .inboxes
            .get_mut(&self.id)
            .and_then(VecDeque::pop_front)
    }
}
