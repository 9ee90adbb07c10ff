//! Error types for Cryptopoly.

use std::fmt;

use crate::board::Money;

/// Why the reducer ignored an action.
///
/// The reducer's contract is to return the state unchanged for illegal
/// actions. [`crate::game::try_apply_action_at`] exposes the reason for
/// callers that want diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The action is not valid in the current game phase.
    WrongPhase,
    /// Only the current player may do this.
    NotYourTurn,
    /// The named player is not in the game.
    UnknownPlayer,
    /// The acting player has been eliminated.
    PlayerBankrupt,
    /// Another pending action must be resolved first.
    PendingActionUnresolved,
    /// No pending action matches this resolution.
    NoMatchingPendingAction,
    /// The player has already rolled this turn.
    AlreadyRolled,
    /// The same roll was delivered twice.
    DuplicateRoll,
    /// Dice faces outside 1..=6.
    InvalidDice,
    /// The player must roll before ending the turn.
    MustRollFirst,
    /// The player owes money and must raise funds or declare bankruptcy.
    OutstandingDebt,
    /// Not enough cash.
    InsufficientFunds {
        /// Amount required.
        needed: Money,
        /// Cash on hand.
        available: Money,
    },
    /// The tile index is not valid for this action.
    InvalidTile(u8),
    /// The player does not own the tile.
    NotOwner(u8),
    /// House construction or sale would break the rules.
    BuildingRule(BuildingRule),
    /// The tile is already mortgaged.
    AlreadyMortgaged(u8),
    /// The tile is not mortgaged.
    NotMortgaged(u8),
    /// The player is not in jail.
    NotInJail,
    /// The player holds no get-out-of-jail-free card.
    NoJailCard,
    /// The player is not taking part in the auction.
    NotParticipant,
    /// A bid must exceed the current highest bid.
    BidTooLow {
        /// Current highest bid.
        current: Money,
    },
    /// The highest bidder cannot leave the auction.
    HighBidderCannotPass,
    /// The amount does not match what is owed.
    AmountMismatch {
        /// Amount owed.
        expected: Money,
    },
    /// The drawn card does not match the action.
    CardMismatch,
    /// The token is held by another player.
    TokenTaken,
    /// The room is full.
    RoomFull,
    /// Not enough players to start.
    NotEnoughPlayers,
    /// The trade does not exist.
    TradeNotFound,
    /// The trade has already been resolved.
    TradeNotPending,
    /// The trade terms are not valid.
    InvalidTrade,
    /// Only a party to the trade may respond to it.
    NotTradeParty,
    /// The named creditor cannot receive the holdings.
    InvalidCreditor,
}

/// Specific even-build or monopoly violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildingRule {
    /// Only color-group properties can be improved.
    NotBuildable,
    /// The owner must hold every tile of the group.
    NoMonopoly,
    /// Mortgaged tiles cannot be improved.
    Mortgaged,
    /// Already at hotel level.
    AtHotel,
    /// No houses to sell.
    NoHouses,
    /// Building here would exceed the lowest sibling by more than one.
    UnevenBuild,
    /// Selling here would drop below the highest sibling.
    UnevenSale,
    /// Mortgaging requires an unimproved tile.
    HasBuildings,
}

impl fmt::Display for BuildingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotBuildable => "tile cannot hold houses",
            Self::NoMonopoly => "owner does not hold the whole group",
            Self::Mortgaged => "tile is mortgaged",
            Self::AtHotel => "tile already has a hotel",
            Self::NoHouses => "tile has no houses",
            Self::UnevenBuild => "group must be built evenly",
            Self::UnevenSale => "group must be sold evenly",
            Self::HasBuildings => "tile has buildings",
        };
        f.write_str(text)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongPhase => write!(f, "not allowed in the current phase"),
            Self::NotYourTurn => write!(f, "not the current player"),
            Self::UnknownPlayer => write!(f, "unknown player"),
            Self::PlayerBankrupt => write!(f, "player is bankrupt"),
            Self::PendingActionUnresolved => write!(f, "a pending action must be resolved first"),
            Self::NoMatchingPendingAction => write!(f, "no matching pending action"),
            Self::AlreadyRolled => write!(f, "already rolled this turn"),
            Self::DuplicateRoll => write!(f, "duplicate roll ignored"),
            Self::InvalidDice => write!(f, "dice faces must be 1-6"),
            Self::MustRollFirst => write!(f, "must roll before ending the turn"),
            Self::OutstandingDebt => write!(f, "negative balance must be settled first"),
            Self::InsufficientFunds { needed, available } => {
                write!(f, "insufficient funds: need {needed}, have {available}")
            }
            Self::InvalidTile(index) => write!(f, "invalid tile {index}"),
            Self::NotOwner(index) => write!(f, "tile {index} is not owned by the player"),
            Self::BuildingRule(rule) => write!(f, "building rule: {rule}"),
            Self::AlreadyMortgaged(index) => write!(f, "tile {index} is already mortgaged"),
            Self::NotMortgaged(index) => write!(f, "tile {index} is not mortgaged"),
            Self::NotInJail => write!(f, "player is not in jail"),
            Self::NoJailCard => write!(f, "no get-out-of-jail-free card"),
            Self::NotParticipant => write!(f, "not an auction participant"),
            Self::BidTooLow { current } => write!(f, "bid must exceed {current}"),
            Self::HighBidderCannotPass => write!(f, "highest bidder cannot pass"),
            Self::AmountMismatch { expected } => write!(f, "amount must be {expected}"),
            Self::CardMismatch => write!(f, "card does not match the drawn card"),
            Self::TokenTaken => write!(f, "token already taken"),
            Self::RoomFull => write!(f, "room is full"),
            Self::NotEnoughPlayers => write!(f, "not enough players"),
            Self::TradeNotFound => write!(f, "trade not found"),
            Self::TradeNotPending => write!(f, "trade already resolved"),
            Self::InvalidTrade => write!(f, "trade terms are not valid"),
            Self::NotTradeParty => write!(f, "not a party to the trade"),
            Self::InvalidCreditor => write!(f, "invalid creditor"),
        }
    }
}

impl std::error::Error for Rejection {}

/// Failure to encode or decode a wire message.
#[derive(Debug)]
pub struct WireError {
    source: serde_json::Error,
}

impl WireError {
    pub(crate) const fn new(source: serde_json::Error) -> Self {
        Self { source }
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed message: {}", self.source)
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Failure to hand a message to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No endpoint with this id exists.
    UnknownPeer(String),
    /// The endpoint exists but no link to it is open.
    NotConnected(String),
    /// The envelope could not be encoded.
    Encode(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPeer(id) => write!(f, "unknown peer {id}"),
            Self::NotConnected(id) => write!(f, "peer {id} is not connected"),
            Self::Encode(reason) => write!(f, "failed to encode envelope: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<WireError> for TransportError {
    fn from(e: WireError) -> Self {
        Self::Encode(e.to_string())
    }
}

/// Failure of a session-level (lobby) operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Only the host may do this.
    NotHost,
    /// The room code is not well formed.
    InvalidRoomCode(RoomCodeError),
    /// Player count outside the allowed range.
    PlayerCount(usize),
    /// The game is not in the phase this operation needs.
    WrongPhase,
    /// The token is held by another player.
    TokenTaken,
    /// There is nothing pending that this operation could resolve.
    NothingPending,
    /// The message could not be sent.
    Transport(TransportError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotHost => write!(f, "only the host can do this"),
            Self::InvalidRoomCode(e) => write!(f, "invalid room code: {e}"),
            Self::PlayerCount(n) => write!(f, "need 2-6 players, have {n}"),
            Self::WrongPhase => write!(f, "not allowed in the current phase"),
            Self::TokenTaken => write!(f, "token already taken"),
            Self::NothingPending => write!(f, "nothing pending to resolve"),
            Self::Transport(e) => write!(f, "transport: {e}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<RoomCodeError> for SessionError {
    fn from(e: RoomCodeError) -> Self {
        Self::InvalidRoomCode(e)
    }
}

/// A string that is not a room code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomCodeError {
    /// Wrong number of characters.
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Length given.
        found: usize,
    },
    /// A character outside the room code alphabet.
    InvalidCharacter {
        /// Offending character (after upper-casing).
        ch: char,
        /// Its position.
        index: usize,
    },
}

impl fmt::Display for RoomCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength { expected, found } => {
                write!(f, "room code must be {expected} chars, got {found}")
            }
            Self::InvalidCharacter { ch, index } => {
                write!(f, "invalid character '{ch}' at position {index}")
            }
        }
    }
}

impl std::error::Error for RoomCodeError {}

/// Failure of a simulated game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// Player count outside 2..=6.
    InvalidPlayerCount(usize),
    /// A guest was never admitted to the room.
    JoinFailed(String),
    /// Nobody could act and no replica had anything to catch up on.
    Stalled {
        /// Simulation step at which progress stopped.
        step: u32,
    },
    /// A replica reached a state that breaks a game invariant.
    InvariantViolated(String),
    /// A session operation failed.
    Session(SessionError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPlayerCount(n) => write!(f, "need 2-6 players, got {n}"),
            Self::JoinFailed(id) => write!(f, "{id} never joined the room"),
            Self::Stalled { step } => write!(f, "game stalled at step {step}"),
            Self::InvariantViolated(msg) => write!(f, "invariant violated: {msg}"),
            Self::Session(e) => write!(f, "session: {e}"),
        }
    }
}

impl std::error::Error for SimulationError {}

impl From<SessionError> for SimulationError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

impl From<TransportError> for SimulationError {
    fn from(e: TransportError) -> Self {
        Self::Session(SessionError::Transport(e))
    }
}
