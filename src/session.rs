//! Rooms, lobby and the intent API.
//!
//! A [`Session`] is what a front end talks to: it owns one peer's
//! [`Replica`] and turns button presses into [`GameAction`]s, filling in
//! amounts and targets from the pending action in the local state.

mod ids;

pub use ids::{
    PLAYER_ID_LEN, ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode, generate_player_id,
    generate_player_id_with,
};

use rand_core::RngCore;

use crate::board::{MAX_PLAYERS, MIN_PLAYERS, Money};
use crate::error::SessionError;
use crate::game::{
    DeterministicRng, GameAction, GameState, PendingAction, Phase, PlayerId, Token, TradeOffer,
    TradeStatus, roll_dice,
};
use crate::sync::{Replica, Submission, SyncConfig, Transport};

/// One peer's seat in a room.
#[derive(Debug)]
pub struct Session<T> {
    replica: Replica<T>,
    room_code: RoomCode,
    now_ms: u64,
}

impl<T: Transport> Session<T> {
    /// Open a new room hosted by this peer, with a random code and decks.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if announcing the host's own
    /// join fails.
    pub fn create_room(
        transport: T,
        player_name: &str,
        now_ms: u64,
        config: SyncConfig,
    ) -> Result<Self, SessionError> {
        Self::create_room_with(transport, player_name, now_ms, config, &mut rand_core::OsRng)
    }

    /// Open a new room, drawing the code and deck seed from `rng`.
    ///
    /// # Errors
    ///
    /// See [`Session::create_room`].
    pub fn create_room_with<R: RngCore + ?Sized>(
        transport: T,
        player_name: &str,
        now_ms: u64,
        config: SyncConfig,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        let room_code = RoomCode::generate_with(rng);
        let host_id = transport.local_id().to_string();
        let state = GameState::new(room_code.as_str(), host_id.as_str(), rng.next_u64(), now_ms);
        let mut replica = Replica::host(transport, player_name, state, config);
        replica.submit(
            GameAction::JoinGame {
                player_id: host_id,
                player_name: player_name.to_string(),
            },
            now_ms,
        )?;
        log::info!("opened room {room_code}");
        Ok(Self {
            replica,
            room_code,
            now_ms,
        })
    }

    /// Join an existing room as a guest. The join request goes out once the
    /// transport reports the link to `host_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidRoomCode`] if `room_code` is malformed.
    pub fn join_room(
        transport: T,
        room_code: &str,
        host_id: &str,
        player_name: &str,
        now_ms: u64,
        config: SyncConfig,
    ) -> Result<Self, SessionError> {
        let room_code = RoomCode::parse(room_code)?;
        let replica = Replica::guest(transport, host_id, player_name, room_code.as_str(), config);
        Ok(Self {
            replica,
            room_code,
            now_ms,
        })
    }

    /// The room's code.
    #[must_use]
    pub const fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    /// This peer's view of the game.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        self.replica.state()
    }

    /// This peer's player id.
    #[must_use]
    pub fn local_id(&self) -> &str {
        self.replica.local_id()
    }

    /// Whether this peer hosts the room.
    #[must_use]
    pub const fn is_host(&self) -> bool {
        self.replica.is_host()
    }

    /// The replica behind this session.
    #[must_use]
    pub const fn replica(&self) -> &Replica<T> {
        &self.replica
    }

    /// Handle every queued network event at `now_ms`.
    pub fn pump(&mut self, now_ms: u64) -> usize {
        self.now_ms = now_ms;
        self.replica.pump(now_ms)
    }

    /// Drive timers (join retry) at `now_ms`.
    pub fn tick(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        self.replica.tick(now_ms);
    }

    /// Submit a raw action, stamped with the last time seen by
    /// [`pump`](Self::pump) or [`tick`](Self::tick).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the action could not be sent.
    pub fn submit(&mut self, action: GameAction) -> Result<Submission, SessionError> {
        Ok(self.replica.submit(action, self.now_ms)?)
    }

    fn me(&self) -> PlayerId {
        self.local_id().to_string()
    }

    fn pending(&self) -> Option<&PendingAction> {
        self.state().pending_action.as_ref()
    }

    /// Pick a token in the lobby.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongPhase`] outside the lobby and
    /// [`SessionError::TokenTaken`] if someone else holds the token.
    pub fn select_token(&mut self, token: Token) -> Result<Submission, SessionError> {
        if self.state().phase != Phase::Lobby {
            return Err(SessionError::WrongPhase);
        }
        let me = self.me();
        if self
            .state()
            .players
            .iter()
            .any(|p| p.token == token && p.id != me)
        {
            return Err(SessionError::TokenTaken);
        }
        self.submit(GameAction::SelectToken {
            player_id: me,
            token,
        })
    }

    /// Start the game in a random seating order.
    ///
    /// # Errors
    ///
    /// See [`Session::start_game_with_order`].
    pub fn start_game(&mut self) -> Result<Submission, SessionError> {
        self.start_game_with(&mut rand_core::OsRng)
    }

    /// Start the game with a seating order shuffled by `rng`.
    ///
    /// # Errors
    ///
    /// See [`Session::start_game_with_order`].
    pub fn start_game_with<R: RngCore + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Submission, SessionError> {
        let mut order = self.state().players.ids();
        DeterministicRng::new(rng.next_u64()).shuffle(&mut order);
        self.start_game_with_order(order)
    }

    /// Start the game with an explicit seating order.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotHost`] on a guest,
    /// [`SessionError::WrongPhase`] outside the lobby and
    /// [`SessionError::PlayerCount`] with fewer than two or more than six
    /// players.
    pub fn start_game_with_order(
        &mut self,
        turn_order: Vec<PlayerId>,
    ) -> Result<Submission, SessionError> {
        if !self.is_host() {
            return Err(SessionError::NotHost);
        }
        if self.state().phase != Phase::Lobby {
            return Err(SessionError::WrongPhase);
        }
        let count = self.state().players.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(SessionError::PlayerCount(count));
        }
        self.submit(GameAction::StartGame { turn_order })
    }

    /// Roll with the OS generator.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the roll could not be sent.
    pub fn roll_dice(&mut self) -> Result<Submission, SessionError> {
        self.roll_dice_with(&mut rand_core::OsRng)
    }

    /// Roll with `rng`. The same generator picks the animation seed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the roll could not be sent.
    pub fn roll_dice_with<R: RngCore + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Submission, SessionError> {
        let result = roll_dice(rng);
        let seed = rng.next_u32();
        self.submit(GameAction::RollDice {
            player_id: self.me(),
            result,
            seed,
        })
    }

    fn offered_tile(&self) -> Result<u8, SessionError> {
        match self.pending() {
            Some(PendingAction::BuyDecision { tile_index, .. }) => Ok(*tile_index),
            _ => Err(SessionError::NothingPending),
        }
    }

    /// Buy the tile on offer.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NothingPending`] without a pending buy decision.
    pub fn buy_property(&mut self) -> Result<Submission, SessionError> {
        let tile_index = self.offered_tile()?;
        self.submit(GameAction::BuyProperty {
            player_id: self.me(),
            tile_index,
        })
    }

    /// Decline the tile on offer and open an auction.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NothingPending`] without a pending buy decision.
    pub fn auction_property(&mut self) -> Result<Submission, SessionError> {
        let tile_index = self.offered_tile()?;
        self.submit(GameAction::AuctionProperty {
            player_id: self.me(),
            tile_index,
        })
    }

    /// Bid in the open auction.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NothingPending`] when no auction is open.
    pub fn place_bid(&mut self, amount: Money) -> Result<Submission, SessionError> {
        if !matches!(self.pending(), Some(PendingAction::Auction { .. })) {
            return Err(SessionError::NothingPending);
        }
        self.submit(GameAction::PlaceBid {
            player_id: self.me(),
            amount,
        })
    }

    /// Leave the open auction.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NothingPending`] when no auction is open.
    pub fn pass_auction(&mut self) -> Result<Submission, SessionError> {
        if !matches!(self.pending(), Some(PendingAction::Auction { .. })) {
            return Err(SessionError::NothingPending);
        }
        self.submit(GameAction::PassAuction {
            player_id: self.me(),
        })
    }

    /// Pay the pending rent in full.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NothingPending`] when no rent is owed.
    pub fn pay_rent(&mut self) -> Result<Submission, SessionError> {
        let Some(PendingAction::PayRent {
            amount,
            to_player_id,
        }) = self.pending().cloned()
        else {
            return Err(SessionError::NothingPending);
        };
        self.submit(GameAction::PayRent {
            player_id: self.me(),
            amount,
            to_player_id,
        })
    }

    /// Pay the pending tax.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NothingPending`] when no tax is owed.
    pub fn pay_tax(&mut self) -> Result<Submission, SessionError> {
        let Some(&PendingAction::PayTax { amount }) = self.pending() else {
            return Err(SessionError::NothingPending);
        };
        self.submit(GameAction::PayTax {
            player_id: self.me(),
            amount,
        })
    }

    /// Draw from the deck the pending action names.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NothingPending`] when no draw is pending.
    pub fn draw_card(&mut self) -> Result<Submission, SessionError> {
        let Some(&PendingAction::DrawCard { card_type }) = self.pending() else {
            return Err(SessionError::NothingPending);
        };
        self.submit(GameAction::DrawCard {
            player_id: self.me(),
            card_type,
        })
    }

    /// Execute the drawn card.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NothingPending`] when no card awaits execution.
    pub fn execute_card(&mut self) -> Result<Submission, SessionError> {
        let Some(PendingAction::CardAction { card }) = self.pending().cloned() else {
            return Err(SessionError::NothingPending);
        };
        self.submit(GameAction::ExecuteCard {
            player_id: self.me(),
            card,
        })
    }

    /// Build one house on `tile_index`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the request could not be sent.
    pub fn build_house(&mut self, tile_index: u8) -> Result<Submission, SessionError> {
        self.submit(GameAction::BuildHouse {
            player_id: self.me(),
            tile_index,
        })
    }

    /// Sell one house from `tile_index`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the request could not be sent.
    pub fn sell_house(&mut self, tile_index: u8) -> Result<Submission, SessionError> {
        self.submit(GameAction::SellHouse {
            player_id: self.me(),
            tile_index,
        })
    }

    /// Mortgage `tile_index`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the request could not be sent.
    pub fn mortgage(&mut self, tile_index: u8) -> Result<Submission, SessionError> {
        self.submit(GameAction::MortgageProperty {
            player_id: self.me(),
            tile_index,
        })
    }

    /// Lift the mortgage on `tile_index`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the request could not be sent.
    pub fn unmortgage(&mut self, tile_index: u8) -> Result<Submission, SessionError> {
        self.submit(GameAction::UnmortgageProperty {
            player_id: self.me(),
            tile_index,
        })
    }

    /// Pay to leave jail.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the request could not be sent.
    pub fn pay_jail_fine(&mut self) -> Result<Submission, SessionError> {
        self.submit(GameAction::PayJailFine {
            player_id: self.me(),
        })
    }

    /// Spend a get-out-of-jail-free card.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the request could not be sent.
    pub fn use_jail_card(&mut self) -> Result<Submission, SessionError> {
        self.submit(GameAction::UseJailCard {
            player_id: self.me(),
        })
    }

    /// Offer a trade to `to_player_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the offer could not be sent.
    pub fn propose_trade(
        &mut self,
        to_player_id: &str,
        offered_properties: Vec<u8>,
        offered_money: Money,
        requested_properties: Vec<u8>,
        requested_money: Money,
    ) -> Result<Submission, SessionError> {
        let offer = TradeOffer {
            id: String::new(),
            from_player_id: self.me(),
            to_player_id: to_player_id.to_string(),
            offered_properties,
            offered_money,
            requested_properties,
            requested_money,
            status: TradeStatus::Pending,
        };
        self.submit(GameAction::ProposeTrade { offer })
    }

    /// Accept a trade offered to this player.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the answer could not be sent.
    pub fn accept_trade(&mut self, trade_id: &str) -> Result<Submission, SessionError> {
        self.submit(GameAction::AcceptTrade {
            player_id: self.me(),
            trade_id: trade_id.to_string(),
        })
    }

    /// Reject a trade offered to this player.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the answer could not be sent.
    pub fn reject_trade(&mut self, trade_id: &str) -> Result<Submission, SessionError> {
        self.submit(GameAction::RejectTrade {
            player_id: self.me(),
            trade_id: trade_id.to_string(),
        })
    }

    /// Withdraw a trade this player proposed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the request could not be sent.
    pub fn cancel_trade(&mut self, trade_id: &str) -> Result<Submission, SessionError> {
        self.submit(GameAction::CancelTrade {
            player_id: self.me(),
            trade_id: trade_id.to_string(),
        })
    }

    /// Concede. Holdings go to the player owed rent, if any, else the bank.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the request could not be sent.
    pub fn declare_bankruptcy(&mut self) -> Result<Submission, SessionError> {
        let me = self.me();
        let creditor_id = match self.pending() {
            Some(PendingAction::PayRent { to_player_id, .. }) if self.state().is_current(&me) => {
                Some(to_player_id.clone())
            }
            _ => None,
        };
        self.submit(GameAction::DeclareBankruptcy {
            player_id: me,
            creditor_id,
        })
    }

    /// End this player's turn.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the request could not be sent.
    pub fn end_turn(&mut self) -> Result<Submission, SessionError> {
        self.submit(GameAction::EndTurn {
            player_id: self.me(),
        })
    }

    /// Leave the room.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] if the request could not be sent.
    pub fn leave(&mut self) -> Result<Submission, SessionError> {
        self.submit(GameAction::LeaveGame {
            player_id: self.me(),
        })
    }
}
