use super::card::Card;
use super::game::GameError;

pub type PlayerId = String;

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub hand: Vec<Card>,
    pub said_dos: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            hand: Vec::new(),
            said_dos: false,
        }
    }

    /// Adds a card to the player's hand.
    pub fn add_card(&mut self, card: Card) {
        self.hand.push(card);
    }

    /// Removes a card from the player's hand at the specified index.
    /// Returns `Err(GameError::InvalidCard)` if the index is out of bounds.
    pub fn remove_card(&mut self, card_index: usize) -> Result<Card, GameError> {
        if card_index < self.hand.len() {
            Ok(self.hand.remove(card_index))
        } else {
            Err(GameError::InvalidCard)
        }
    }

    /// Checks if the player has won (i.e., their hand is empty).
    pub fn has_won(&self) -> bool {
        self.hand.is_empty()
    }

    /// A player is exposed to a DOS call when down to one card without having declared it.
    pub fn is_dos_callable(&self) -> bool {
        self.hand.len() == 1 && !self.said_dos
    }

    pub fn reset(&mut self) -> Vec<Card> {
        self.said_dos = false;
        std::mem::take(&mut self.hand)
    }
}
