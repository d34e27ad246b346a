use super::card::Color;
use super::player::PlayerId;
use super::view::PlayerSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Requests a client may send, framed as `{"type": ..., "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ClientRequest {
    #[serde(rename_all = "camelCase")]
    JoinGame {
        #[serde(alias = "name")]
        player_name: String,
    },
    #[serde(rename_all = "camelCase")]
    StartGame {
        #[serde(default)]
        player_id: Option<PlayerId>,
    },
    #[serde(rename_all = "camelCase")]
    PlayCard {
        player_id: PlayerId,
        card_index: usize,
        #[serde(default)]
        chosen_color: Option<Color>,
    },
    #[serde(rename_all = "camelCase")]
    DrawCard { player_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    ChooseColor { player_id: PlayerId, color: Color },
    #[serde(rename_all = "camelCase")]
    SayDos { player_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    CallDosOnPlayer {
        caller_id: PlayerId,
        target_id: PlayerId,
    },
}

impl ClientRequest {
    /// The identity the client claims to be acting as, if the request carries one.
    pub fn claimed_player(&self) -> Option<&str> {
        match self {
            ClientRequest::JoinGame { .. } => None,
            ClientRequest::StartGame { player_id } => player_id.as_deref(),
            ClientRequest::PlayCard { player_id, .. }
            | ClientRequest::DrawCard { player_id }
            | ClientRequest::ChooseColor { player_id, .. }
            | ClientRequest::SayDos { player_id } => Some(player_id),
            ClientRequest::CallDosOnPlayer { caller_id, .. } => Some(caller_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    Joined {
        player_id: PlayerId,
        player_state: PlayerSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    GameUpdate { player_state: PlayerSnapshot },
    GameMessage {
        message: String,
        timestamp: DateTime<Utc>,
    },
    Error { message: String },
}

impl ServerMessage {
    pub fn feed(message: impl Into<String>) -> Self {
        ServerMessage::GameMessage {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
