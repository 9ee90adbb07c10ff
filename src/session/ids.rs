//! Room codes and player ids.

use std::fmt;

use rand_core::RngCore;

use crate::error::RoomCodeError;
use crate::game::PlayerId;

/// Length of a room code.
pub const ROOM_CODE_LEN: usize = 6;

/// Characters a room code may contain. `I`, `O`, `0` and `1` are left out
/// so codes can be read aloud.
pub const ROOM_CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a generated player id.
pub const PLAYER_ID_LEN: usize = 21;

const PLAYER_ID_ALPHABET: &[u8; 64] =
    b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";

/// A six-character room code, always upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomCode(String);

impl RoomCode {
    /// Parse a code typed by a user. Case-insensitive; surrounding
    /// whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RoomCodeError`] for a wrong length or a character outside
    /// [`ROOM_CODE_ALPHABET`].
    pub fn parse(value: &str) -> Result<Self, RoomCodeError> {
        let code = value.trim().to_ascii_uppercase();
        let found = code.chars().count();
        if found != ROOM_CODE_LEN {
            return Err(RoomCodeError::InvalidLength {
                expected: ROOM_CODE_LEN,
                found,
            });
        }
        for (index, ch) in code.chars().enumerate() {
            if !ROOM_CODE_ALPHABET.contains(ch) {
                return Err(RoomCodeError::InvalidCharacter { ch, index });
            }
        }
        Ok(Self(code))
    }

    /// A fresh code from the OS generator.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut rand_core::OsRng)
    }

    /// A fresh code from `rng`.
    pub fn generate_with<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let alphabet = ROOM_CODE_ALPHABET.as_bytes();
        // 32 symbols: the low five bits pick one without bias.
        let code = (0..ROOM_CODE_LEN)
            .map(|_| char::from(alphabet[(rng.next_u32() & 31) as usize]))
            .collect();
        Self(code)
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RoomCode {
    type Err = RoomCodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// A random, URL-safe player id from the OS generator.
#[must_use]
pub fn generate_player_id() -> PlayerId {
    generate_player_id_with(&mut rand_core::OsRng)
}

/// A random, URL-safe player id from `rng`.
pub fn generate_player_id_with<R: RngCore + ?Sized>(rng: &mut R) -> PlayerId {
    let mut bytes = [0u8; PLAYER_ID_LEN];
    rng.fill_bytes(&mut bytes);
    bytes
        .iter()
        .map(|b| char::from(PLAYER_ID_ALPHABET[usize::from(b & 63)]))
        .collect()
}
