//! Player definitions and the join-ordered player roster.

use std::collections::BTreeSet;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::board::{Money, STARTING_MONEY};

/// Player identifier. Doubles as the peer identifier on the transport.
pub type PlayerId = String;

/// Cosmetic playing piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Token {
    /// Bitcoin.
    Bitcoin,
    /// Ethereum.
    Ethereum,
    /// Solana.
    Solana,
    /// Dogecoin.
    Dogecoin,
    /// Cardano.
    Cardano,
    /// Polkadot.
    Polkadot,
}

impl Token {
    /// Every token in selection order.
    pub const ALL: [Self; 6] = [
        Self::Bitcoin,
        Self::Ethereum,
        Self::Solana,
        Self::Dogecoin,
        Self::Cardano,
        Self::Polkadot,
    ];

    /// Display name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Bitcoin => "Bitcoin",
            Self::Ethereum => "Ethereum",
            Self::Solana => "Solana",
            Self::Dogecoin => "Dogecoin",
            Self::Cardano => "Cardano",
            Self::Polkadot => "Polkadot",
        }
    }

    /// First token in selection order not present in `taken`, or bitcoin if all are taken.
    #[must_use]
    pub fn first_free<'a>(taken: impl IntoIterator<Item = &'a Self> + Clone) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| !taken.clone().into_iter().any(|u| u == t))
            .unwrap_or(Self::Bitcoin)
    }
}

/// A player in the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Unique identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Playing piece.
    pub token: Token,
    /// Board position (0-39).
    pub position: u8,
    /// Cash balance. May be negative after a mandatory payment.
    pub money: Money,
    /// Owned tile indices.
    pub properties: BTreeSet<u8>,
    /// Whether the player is in jail.
    pub in_jail: bool,
    /// Failed doubles attempts while in jail.
    pub jail_turns: u8,
    /// Get-out-of-jail-free cards held.
    pub get_out_of_jail_cards: u32,
    /// Whether the player has been eliminated.
    pub is_bankrupt: bool,
    /// Whether the player already rolled this turn.
    pub has_rolled: bool,
}

impl Player {
    /// Create a fresh player at GO with starting cash.
    #[must_use]
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, token: Token) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            token,
            position: 0,
            money: STARTING_MONEY,
            properties: BTreeSet::new(),
            in_jail: false,
            jail_turns: 0,
            get_out_of_jail_cards: 0,
            is_bankrupt: false,
            has_rolled: false,
        }
    }

    /// Whether the player owns the tile.
    #[must_use]
    pub fn owns(&self, index: u8) -> bool {
        self.properties.contains(&index)
    }
}

/// Players keyed by id, kept in join order.
///
/// Serializes as a JSON object `{ id: Player }`; decoding preserves the
/// object's key order so every peer iterates players identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Players {
    entries: Vec<Player>,
}

impl Players {
    /// Empty roster.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a player.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Player> {
        self.entries.iter().find(|p| p.id == id)
    }

    /// Look up a player mutably.
    #[must_use]
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.entries.iter_mut().find(|p| p.id == id)
    }

    /// Whether a player with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Insert or replace a player. New players go to the end of the join order.
    pub fn insert(&mut self, player: Player) {
        match self.entries.iter_mut().find(|p| p.id == player.id) {
            Some(existing) => *existing = player,
            None => self.entries.push(player),
        }
    }

    /// Remove a player, returning its record.
    pub fn remove(&mut self, id: &str) -> Option<Player> {
        let pos = self.entries.iter().position(|p| p.id == id)?;
        Some(self.entries.remove(pos))
    }

    /// Iterate players in join order.
    pub fn iter(&self) -> std::slice::Iter<'_, Player> {
        self.entries.iter()
    }

    /// Iterate players mutably in join order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Player> {
        self.entries.iter_mut()
    }

    /// Player ids in join order.
    #[must_use]
    pub fn ids(&self) -> Vec<PlayerId> {
        self.entries.iter().map(|p| p.id.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a Players {
    type Item = &'a Player;
    type IntoIter = std::slice::Iter<'a, Player>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<Player> for Players {
    fn from_iter<I: IntoIterator<Item = Player>>(iter: I) -> Self {
        let mut players = Self::new();
        for p in iter {
            players.insert(p);
        }
        players
    }
}

impl Serialize for Players {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for p in &self.entries {
            map.serialize_entry(&p.id, p)?;
        }
        map.end()
    }
}

struct PlayersVisitor;

impl<'de> Visitor<'de> for PlayersVisitor {
    type Value = Players;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of player id to player")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Players, A::Error> {
        let mut players = Players::new();
        while let Some((key, mut player)) = access.next_entry::<String, Player>()? {
            // The key is authoritative for lookups.
            player.id = key;
            players.insert(player);
        }
        Ok(players)
    }
}

impl<'de> Deserialize<'de> for Players {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PlayersVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_free_token() {
        assert_eq!(Token::first_free(&[]), Token::Bitcoin);
        assert_eq!(
            Token::first_free(&[Token::Bitcoin, Token::Solana]),
            Token::Ethereum
        );
        assert_eq!(Token::first_free(&Token::ALL), Token::Bitcoin);
    }

    #[test]
    fn test_players_keep_join_order_through_json() {
        let mut players = Players::new();
        players.insert(Player::new("zed", "Zed", Token::Bitcoin));
        players.insert(Player::new("amy", "Amy", Token::Ethereum));
        players.insert(Player::new("mo", "Mo", Token::Solana));

        let json = serde_json::to_string(&players).unwrap();
        let back: Players = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ids(), vec!["zed", "amy", "mo"]);
        assert_eq!(back, players);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut players = Players::new();
        players.insert(Player::new("a", "A", Token::Bitcoin));
        players.insert(Player::new("b", "B", Token::Ethereum));
        players.insert(Player::new("a", "Renamed", Token::Bitcoin));
        assert_eq!(players.ids(), vec!["a", "b"]);
        assert_eq!(players.get("a").unwrap().name, "Renamed");
    }

    #[test]
    fn test_remove() {
        let mut players: Players = [
            Player::new("a", "A", Token::Bitcoin),
            Player::new("b", "B", Token::Ethereum),
        ]
        .into_iter()
        .collect();
        assert!(players.remove("a").is_some());
        assert!(players.remove("a").is_none());
        assert_eq!(players.len(), 1);
    }
}
