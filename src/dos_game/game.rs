use super::card::{Card, CardKind, CardType, Color};
use super::player::{Player, PlayerId};
use super::view::{CardView, PrivateView, PublicView, SeatView};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;
pub const INITIAL_HAND_SIZE: usize = 7;
pub const DOS_PENALTY: usize = 3;
pub const DECK_SIZE: usize = 108;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameStatus {
    Waiting,
    InProgress,
    Complete { winner_id: PlayerId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    GameFull,
    AlreadyStarted,
    DuplicatePlayer,
    UnknownPlayer,
    NotEnoughPlayers,
    NotInProgress,
    NotYourTurn,
    WaitingForColorChoice,
    NoColorChoicePending,
    InvalidCard,
    CannotPlayCard,
    InvalidDosCall,
    EmptyDeck,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::GameFull => write!(f, "Game is full"),
            GameError::AlreadyStarted => write!(f, "Game already in progress"),
            GameError::DuplicatePlayer => write!(f, "Player is already seated"),
            GameError::UnknownPlayer => write!(f, "Unknown player"),
            GameError::NotEnoughPlayers => {
                write!(f, "Need at least {} players to start", MIN_PLAYERS)
            }
            GameError::NotInProgress => write!(f, "Game not in progress"),
            GameError::NotYourTurn => write!(f, "Not your turn"),
            GameError::WaitingForColorChoice => write!(f, "Waiting for color choice"),
            GameError::NoColorChoicePending => write!(f, "No color choice is pending"),
            GameError::InvalidCard => write!(f, "Invalid card"),
            GameError::CannotPlayCard => write!(f, "Cannot play this card"),
            GameError::InvalidDosCall => write!(f, "Invalid DOS call"),
            GameError::EmptyDeck => write!(f, "Deck ran out while dealing"),
        }
    }
}

impl std::error::Error for GameError {}

/// Outcome of a successful operation. `Display` renders the feed line shown to every client.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PlayerJoined {
        player_id: PlayerId,
        player_name: String,
    },
    PlayerLeft {
        player_id: PlayerId,
        player_name: String,
        game_reset: bool,
    },
    GameStarted {
        opener: Card,
    },
    CardPlayed {
        player_id: PlayerId,
        player_name: String,
        card: Card,
    },
    PlayerWins {
        player_id: PlayerId,
        player_name: String,
        card: Card,
    },
    CardDrawn {
        player_id: PlayerId,
        player_name: String,
    },
    ColorChosen {
        player_id: PlayerId,
        color: Color,
    },
    SaidDos {
        player_id: PlayerId,
        player_name: String,
    },
    DosCalled {
        caller_name: String,
        target_id: PlayerId,
        target_name: String,
        penalty: usize,
    },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::PlayerJoined { player_name, .. } => {
                write!(f, "{} joined the game", player_name)
            }
            GameEvent::PlayerLeft { player_name, .. } => write!(f, "{} left the game", player_name),
            GameEvent::GameStarted { .. } => write!(f, "Game started!"),
            GameEvent::CardPlayed {
                player_name, card, ..
            } => write!(f, "{} played {}", player_name, card),
            GameEvent::PlayerWins {
                player_name, card, ..
            } => {
                if card.card_type == CardType::WildDrawFour {
                    write!(f, "{} wins with a black +4 card!", player_name)
                } else {
                    write!(f, "{} wins!", player_name)
                }
            }
            GameEvent::CardDrawn { player_name, .. } => write!(f, "{} drew a card", player_name),
            GameEvent::ColorChosen { color, .. } => write!(f, "Color chosen: {}", color),
            GameEvent::SaidDos { player_name, .. } => write!(f, "{} said DOS!", player_name),
            GameEvent::DosCalled {
                caller_name,
                target_name,
                penalty,
                ..
            } => write!(
                f,
                "{} called DOS on {}! {} draws {} cards.",
                caller_name, target_name, target_name, penalty
            ),
        }
    }
}

/// Represents the direction of play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    pub fn reverse(&self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }

    /// Seat offset for one step of play: `+1` or `-1`.
    pub fn step(&self) -> i8 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }
}

/// The authoritative rules engine for one game.
///
/// All state is private; callers go through the operations below, each of
/// which either applies a full rule transition or leaves the game untouched.
#[derive(Debug)]
pub struct DosGame {
    players: Vec<Player>,
    deck: Vec<Card>,
    discard_pile: Vec<Card>,
    // Wilds skipped while searching for the opener stay out of play for the round.
    set_aside: Vec<Card>,
    current_turn: usize,
    direction: Direction,
    waiting_for_color: bool,
    status: GameStatus,
    rng: StdRng,
}

impl Default for DosGame {
    fn default() -> Self {
        Self::new()
    }
}

impl DosGame {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Creates a game whose shuffles are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            players: Vec::with_capacity(MAX_PLAYERS),
            deck: Vec::new(),
            discard_pile: Vec::new(),
            set_aside: Vec::new(),
            current_turn: 0,
            direction: Direction::Clockwise,
            waiting_for_color: false,
            status: GameStatus::Waiting,
            rng,
        }
    }

    /// Builds the unshuffled 108-card deck.
    pub fn standard_deck() -> Vec<Card> {
        let mut deck = Vec::with_capacity(DECK_SIZE);

        for color in Color::ALL {
            // One 0, two of each 1-9
            deck.push(Card::new(color, CardType::Number(0)));
            for number in 1..=9 {
                deck.push(Card::new(color, CardType::Number(number)));
                deck.push(Card::new(color, CardType::Number(number)));
            }

            for _ in 0..2 {
                deck.push(Card::new(color, CardType::Skip));
                deck.push(Card::new(color, CardType::Reverse));
                deck.push(Card::new(color, CardType::DrawTwo));
            }
        }

        for _ in 0..4 {
            deck.push(Card::wild(CardType::Wild));
            deck.push(Card::wild(CardType::WildDrawFour));
        }

        deck
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn status(&self) -> &GameStatus {
        &self.status
    }

    /// True once dealt, including after a winner has been declared.
    pub fn is_started(&self) -> bool {
        !matches!(self.status, GameStatus::Waiting)
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        match &self.status {
            GameStatus::Complete { winner_id } => Some(winner_id),
            _ => None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_waiting_for_color(&self) -> bool {
        self.waiting_for_color
    }

    pub fn current_player(&self) -> Option<&Player> {
        if self.is_started() {
            self.players.get(self.current_turn)
        } else {
            None
        }
    }

    pub fn top_card(&self) -> Option<&Card> {
        self.discard_pile.last()
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn discard_len(&self) -> usize {
        self.discard_pile.len()
    }

    pub fn set_aside_len(&self) -> usize {
        self.set_aside.len()
    }

    /// Every card the game currently accounts for. Equals [`DECK_SIZE`] while started.
    pub fn total_cards(&self) -> usize {
        self.deck.len()
            + self.discard_pile.len()
            + self.set_aside.len()
            + self.players.iter().map(|p| p.hand.len()).sum::<usize>()
    }

    pub fn add_player(&mut self, player_id: PlayerId, name: String) -> Result<GameEvent, GameError> {
        if self.is_started() {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::GameFull);
        }
        if self.seat_of(&player_id).is_some() {
            return Err(GameError::DuplicatePlayer);
        }

        info!("{} ({}) takes seat {}", name, player_id, self.players.len());
        self.players.push(Player::new(player_id.clone(), name.clone()));
        Ok(GameEvent::PlayerJoined {
            player_id,
            player_name: name,
        })
    }

    /// Removes a seat. A running game with too few seats left is reset, as is a
    /// finished game whose winner leaves; otherwise the leaver's cards go under
    /// the deck and the turn pointer is repaired.
    pub fn remove_player(&mut self, player_id: &str) -> Result<GameEvent, GameError> {
        let seat = self.seat_of(player_id).ok_or(GameError::UnknownPlayer)?;
        let mut player = self.players.remove(seat);
        let mut returned = player.reset();

        let mut game_reset = false;
        if self.is_started() {
            let winner_left = self.winner() == Some(&player.id);
            if self.players.len() < MIN_PLAYERS || winner_left {
                info!("{} left, resetting game", player.name);
                self.reset();
                game_reset = true;
            } else {
                // The deck draws from its tail, so the front is the bottom.
                returned.append(&mut self.deck);
                self.deck = returned;
                self.repair_turn_after_removal(seat);
            }
        }

        Ok(GameEvent::PlayerLeft {
            player_id: player.id,
            player_name: player.name,
            game_reset,
        })
    }

    fn repair_turn_after_removal(&mut self, removed_seat: usize) {
        let seats = self.players.len();
        if removed_seat < self.current_turn {
            self.current_turn -= 1;
        } else if removed_seat == self.current_turn && self.direction == Direction::CounterClockwise
        {
            self.current_turn = (removed_seat + seats - 1) % seats;
        }
        if self.current_turn >= seats {
            self.current_turn = 0;
        }
    }

    /// Shuffles a fresh deck, deals, and reveals the opener.
    pub fn start(&mut self) -> Result<GameEvent, GameError> {
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }

        self.reset();
        let opener = match self.deal() {
            Ok(card) => card,
            Err(e) => {
                self.reset();
                return Err(e);
            }
        };

        self.status = GameStatus::InProgress;
        self.current_turn = 0;
        if opener.kind() == CardKind::Action {
            debug!("Opener {} takes effect before the first turn", opener);
            self.apply_card_effect(opener.card_type, false);
        }

        info!(
            "Game started with {} players, opener {}",
            self.players.len(),
            opener
        );
        Ok(GameEvent::GameStarted { opener })
    }

    fn deal(&mut self) -> Result<Card, GameError> {
        let mut deck = Self::standard_deck();
        deck.shuffle(&mut self.rng);
        self.deck = deck;

        for _ in 0..INITIAL_HAND_SIZE {
            for player in self.players.iter_mut() {
                let card = self.deck.pop().ok_or(GameError::EmptyDeck)?;
                player.add_card(card);
            }
        }

        loop {
            let card = self.deck.pop().ok_or(GameError::EmptyDeck)?;
            if card.is_wild() {
                debug!("Setting aside {} drawn as opener", card);
                self.set_aside.push(card);
            } else {
                self.discard_pile.push(card.clone());
                return Ok(card);
            }
        }
    }

    fn reset(&mut self) {
        self.status = GameStatus::Waiting;
        self.deck.clear();
        self.discard_pile.clear();
        self.set_aside.clear();
        self.current_turn = 0;
        self.direction = Direction::Clockwise;
        self.waiting_for_color = false;
        for player in self.players.iter_mut() {
            player.reset();
        }
    }

    /// Handles playing a card.
    pub fn play_card(
        &mut self,
        player_id: &str,
        card_index: usize,
        chosen_color: Option<Color>,
    ) -> Result<GameEvent, GameError> {
        let seat = self.ensure_turn(player_id)?;

        let top_card = self.discard_pile.last().ok_or(GameError::NotInProgress)?;
        let card = self.players[seat]
            .hand
            .get(card_index)
            .ok_or(GameError::InvalidCard)?;
        if !card.can_play_on(top_card) {
            return Err(GameError::CannotPlayCard);
        }

        let mut card = self.players[seat].remove_card(card_index)?;
        if card.is_wild() {
            if let Some(color) = chosen_color {
                card.stamp_color(color);
            }
        }
        self.discard_pile.push(card.clone());

        let player = &self.players[seat];
        let player_id = player.id.clone();
        let player_name = player.name.clone();

        // A win ends the game before the card's effect resolves.
        if player.has_won() {
            info!("{} wins playing {}", player_name, card);
            self.status = GameStatus::Complete {
                winner_id: player_id.clone(),
            };
            return Ok(GameEvent::PlayerWins {
                player_id,
                player_name,
                card,
            });
        }

        self.apply_card_effect(card.card_type, card.chosen_color.is_some());
        self.players[seat].said_dos = false;

        debug!("{} played {}", player_name, card);
        Ok(GameEvent::CardPlayed {
            player_id,
            player_name,
            card,
        })
    }

    /// Draws one card for the current player and passes the turn.
    pub fn draw_card(&mut self, player_id: &str) -> Result<GameEvent, GameError> {
        let seat = self.ensure_turn(player_id)?;

        self.draw_cards(seat, 1);
        self.next_turn();

        let player = &self.players[seat];
        Ok(GameEvent::CardDrawn {
            player_id: player.id.clone(),
            player_name: player.name.clone(),
        })
    }

    /// Resolves a pending wild played by the current player.
    pub fn choose_color(&mut self, player_id: &str, color: Color) -> Result<GameEvent, GameError> {
        let seat = self.seat_of(player_id).ok_or(GameError::UnknownPlayer)?;
        if !self.waiting_for_color {
            return Err(GameError::NoColorChoicePending);
        }
        if seat != self.current_turn {
            return Err(GameError::NotYourTurn);
        }

        let top_card = self
            .discard_pile
            .last_mut()
            .ok_or(GameError::NoColorChoicePending)?;
        top_card.stamp_color(color);
        let card_type = top_card.card_type;
        self.waiting_for_color = false;

        self.apply_card_effect(card_type, true);

        Ok(GameEvent::ColorChosen {
            player_id: player_id.to_string(),
            color,
        })
    }

    pub fn say_dos(&mut self, player_id: &str) -> Result<GameEvent, GameError> {
        let seat = self.seat_of(player_id).ok_or(GameError::UnknownPlayer)?;
        let player = &mut self.players[seat];
        player.said_dos = true;
        Ok(GameEvent::SaidDos {
            player_id: player.id.clone(),
            player_name: player.name.clone(),
        })
    }

    /// Calls out a player sitting on one undeclared card. Callable by anyone, on any turn.
    pub fn call_dos(&mut self, caller_id: &str, target_id: &str) -> Result<GameEvent, GameError> {
        if self.status != GameStatus::InProgress {
            return Err(GameError::NotInProgress);
        }
        let caller = self.seat_of(caller_id).ok_or(GameError::UnknownPlayer)?;
        let target = self.seat_of(target_id).ok_or(GameError::UnknownPlayer)?;

        if !self.players[target].is_dos_callable() {
            return Err(GameError::InvalidDosCall);
        }

        let drawn = self.draw_cards(target, DOS_PENALTY);
        info!(
            "{} called DOS on {}, {} penalty cards drawn",
            self.players[caller].name, self.players[target].name, drawn
        );

        Ok(GameEvent::DosCalled {
            caller_name: self.players[caller].name.clone(),
            target_id: self.players[target].id.clone(),
            target_name: self.players[target].name.clone(),
            penalty: DOS_PENALTY,
        })
    }

    pub fn public_view(&self) -> PublicView {
        PublicView {
            players: self.players.iter().map(SeatView::from_player).collect(),
            current_player: self.current_player().map(|p| p.id.clone()),
            top_card: self.top_card().map(CardView::from_card),
            game_started: self.is_started(),
            waiting_for_color_choice: self.waiting_for_color,
            winner: self.winner().cloned(),
            direction: self.direction.step(),
            deck_count: self.deck.len(),
        }
    }

    pub fn private_view(&self, player_id: &str) -> Option<PrivateView> {
        self.player(player_id).map(PrivateView::from_player)
    }

    fn seat_of(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    /// Guards shared by play and draw. Returns the acting seat.
    fn ensure_turn(&self, player_id: &str) -> Result<usize, GameError> {
        if self.status != GameStatus::InProgress {
            return Err(GameError::NotInProgress);
        }
        let seat = self.seat_of(player_id).ok_or(GameError::UnknownPlayer)?;
        if seat != self.current_turn {
            return Err(GameError::NotYourTurn);
        }
        if self.waiting_for_color {
            return Err(GameError::WaitingForColorChoice);
        }
        Ok(seat)
    }

    /// Updates the current turn based on the direction of play.
    fn next_turn(&mut self) {
        let num_players = self.players.len();
        if num_players == 0 {
            return;
        }
        self.current_turn = match self.direction {
            Direction::Clockwise => (self.current_turn + 1) % num_players,
            Direction::CounterClockwise => (self.current_turn + num_players - 1) % num_players,
        };
    }

    fn reverse_direction(&mut self) {
        self.direction = self.direction.reverse();
    }

    /// Resolves a card's effect on turn order. A wild without a chosen color
    /// halts here until `choose_color` re-enters with `color_chosen = true`.
    fn apply_card_effect(&mut self, card_type: CardType, color_chosen: bool) {
        match card_type {
            CardType::Skip => {
                self.next_turn();
                self.next_turn();
            }
            CardType::Reverse => {
                if self.players.len() == 2 {
                    self.next_turn();
                    self.next_turn();
                } else {
                    self.reverse_direction();
                    self.next_turn();
                }
            }
            CardType::DrawTwo => {
                self.next_turn();
                self.draw_cards(self.current_turn, 2);
                self.next_turn();
            }
            CardType::Wild | CardType::WildDrawFour if !color_chosen => {
                self.waiting_for_color = true;
            }
            CardType::WildDrawFour => {
                self.next_turn();
                self.draw_cards(self.current_turn, 4);
                self.next_turn();
            }
            CardType::Wild | CardType::Number(_) => self.next_turn(),
        }
    }

    /// Moves up to `count` cards into a hand, recycling the discard pile when
    /// the deck runs dry. Returns how many cards were actually drawn.
    fn draw_cards(&mut self, seat: usize, count: usize) -> usize {
        let mut drawn = 0;
        for _ in 0..count {
            if self.deck.is_empty() {
                self.reshuffle();
            }
            match self.deck.pop() {
                Some(card) => {
                    self.players[seat].add_card(card);
                    drawn += 1;
                }
                None => {
                    warn!("No cards left to draw, {} of {} drawn", drawn, count);
                    break;
                }
            }
        }
        drawn
    }

    /// Shuffles everything under the top card back into the deck.
    fn reshuffle(&mut self) {
        if self.discard_pile.len() <= 1 {
            return;
        }
        let Some(top_card) = self.discard_pile.pop() else {
            return;
        };

        let mut recycled = std::mem::replace(&mut self.discard_pile, vec![top_card]);
        recycled.iter_mut().for_each(Card::clear_stamp);
        recycled.shuffle(&mut self.rng);
        debug!("Reshuffled {} cards from the discard pile", recycled.len());
        self.deck.append(&mut recycled);
    }
}
