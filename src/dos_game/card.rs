use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Blue, Color::Green, Color::Yellow];
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
        };
        write!(f, "{}", name)
    }
}

/// Broad family of a card, as exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Number,
    Action,
    Wild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CardType {
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

impl CardType {
    pub fn kind(&self) -> CardKind {
        match self {
            CardType::Number(_) => CardKind::Number,
            CardType::Skip | CardType::Reverse | CardType::DrawTwo => CardKind::Action,
            CardType::Wild | CardType::WildDrawFour => CardKind::Wild,
        }
    }

    /// Wire name of an action or wild value (`skip`, `draw2`, `wild_draw4`, ...).
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            CardType::Number(_) => None,
            CardType::Skip => Some("skip"),
            CardType::Reverse => Some("reverse"),
            CardType::DrawTwo => Some("draw2"),
            CardType::Wild => Some("wild"),
            CardType::WildDrawFour => Some("wild_draw4"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub color: Option<Color>,
    pub card_type: CardType,
    pub chosen_color: Option<Color>,
}

impl Card {
    pub fn new(color: Color, card_type: CardType) -> Self {
        Self {
            color: Some(color),
            card_type,
            chosen_color: None,
        }
    }

    pub fn wild(card_type: CardType) -> Self {
        Self {
            color: None,
            card_type,
            chosen_color: None,
        }
    }

    pub fn kind(&self) -> CardKind {
        self.card_type.kind()
    }

    pub fn is_wild(&self) -> bool {
        self.kind() == CardKind::Wild
    }

    /// Stamps the chosen color onto a wild. Later legality checks read `color`,
    /// so both fields carry it.
    pub fn stamp_color(&mut self, color: Color) {
        self.color = Some(color);
        self.chosen_color = Some(color);
    }

    /// Clears a wild's stamp so it can be dealt again as a colorless card.
    pub fn clear_stamp(&mut self) {
        if self.is_wild() {
            self.color = None;
            self.chosen_color = None;
        }
    }

    /// Whether `self` may be played on top of `top`.
    pub fn can_play_on(&self, top: &Card) -> bool {
        if self.is_wild() {
            return true;
        }

        if let Some(color) = self.color {
            if top.color == Some(color) || top.chosen_color == Some(color) {
                return true;
            }
        }

        match (self.card_type, top.card_type) {
            (CardType::Number(n), CardType::Number(m)) => n == m,
            (mine, theirs) => mine.kind() == CardKind::Action && mine == theirs,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.card_type, self.color) {
            (CardType::Wild, _) => write!(f, "Wild"),
            (CardType::WildDrawFour, _) => write!(f, "Wild Draw 4"),
            (CardType::Number(n), Some(color)) => write!(f, "{} {}", color, n),
            (card_type, Some(color)) => {
                write!(f, "{} {}", color, card_type.symbol().unwrap_or("card"))
            }
            (_, None) => write!(f, "Unknown"),
        }
    }
}
