//! Read-only projections of the game handed to clients.
//!
//! The engine builds a [`PublicView`] that any seat may see and one
//! [`PrivateView`] per seat. The session layer composes the two into a
//! [`PlayerSnapshot`] for each recipient, so a hand is only ever serialized
//! for its owner.

use super::card::{Card, CardKind, CardType, Color};
use super::player::{Player, PlayerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CardValue {
    Number(u8),
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub color: Option<Color>,
    #[serde(rename = "type")]
    pub kind: CardKind,
    pub value: CardValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_color: Option<Color>,
}

impl CardView {
    pub fn from_card(card: &Card) -> Self {
        let value = match card.card_type {
            CardType::Number(n) => CardValue::Number(n),
            other => CardValue::Named(other.symbol().unwrap_or_default().to_string()),
        };
        Self {
            color: card.color,
            kind: card.kind(),
            value,
            chosen_color: card.chosen_color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub id: PlayerId,
    pub name: String,
    pub hand_count: usize,
    pub said_dos: bool,
}

impl SeatView {
    pub fn from_player(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            hand_count: player.hand.len(),
            said_dos: player.said_dos,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicView {
    pub players: Vec<SeatView>,
    pub current_player: Option<PlayerId>,
    pub top_card: Option<CardView>,
    pub game_started: bool,
    pub waiting_for_color_choice: bool,
    pub winner: Option<PlayerId>,
    pub direction: i8,
    pub deck_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateView {
    pub hand: Vec<CardView>,
}

impl PrivateView {
    pub fn from_player(player: &Player) -> Self {
        Self {
            hand: player.hand.iter().map(CardView::from_card).collect(),
        }
    }
}

/// What a single connected player receives after every state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    #[serde(flatten)]
    pub public: PublicView,
    #[serde(flatten)]
    pub private: PrivateView,
}

impl PlayerSnapshot {
    pub fn compose(public: PublicView, private: PrivateView) -> Self {
        Self { public, private }
    }
}
