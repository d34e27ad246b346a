use super::game::{DosGame, GameError, GameEvent};
use super::player::PlayerId;
use super::protocol::{ClientRequest, ServerMessage};
use super::view::{PlayerSnapshot, PublicView};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

pub type ConnectionId = u64;

/// Outbound queue of one connection. Sending never blocks, so the session can
/// broadcast while holding its lock.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    UnknownConnection,
    NotJoined,
    AlreadyJoined,
    EmptyName,
    IdentityMismatch,
    Game(GameError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::UnknownConnection => write!(f, "Unknown connection"),
            SessionError::NotJoined => write!(f, "Join the game first"),
            SessionError::AlreadyJoined => write!(f, "Already joined"),
            SessionError::EmptyName => write!(f, "Player name must not be empty"),
            SessionError::IdentityMismatch => write!(f, "Player id does not match this connection"),
            SessionError::Game(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<GameError> for SessionError {
    fn from(e: GameError) -> Self {
        SessionError::Game(e)
    }
}

struct Connection {
    outbox: Outbox,
    player_id: Option<PlayerId>,
}

/// One running game and the connections watching it.
pub struct GameSession {
    game: DosGame,
    connections: HashMap<ConnectionId, Connection>,
    next_connection_id: ConnectionId,
}

impl GameSession {
    pub fn new(game: DosGame) -> Self {
        Self {
            game,
            connections: HashMap::new(),
            next_connection_id: 1,
        }
    }

    pub fn game(&self) -> &DosGame {
        &self.game
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn player_for(&self, conn_id: ConnectionId) -> Option<&PlayerId> {
        self.connections
            .get(&conn_id)
            .and_then(|c| c.player_id.as_ref())
    }

    pub fn connect(&mut self, outbox: Outbox) -> ConnectionId {
        let conn_id = self.next_connection_id;
        self.next_connection_id += 1;
        self.connections.insert(
            conn_id,
            Connection {
                outbox,
                player_id: None,
            },
        );
        info!(
            "Connection #{} opened ({} total)",
            conn_id,
            self.connections.len()
        );
        conn_id
    }

    /// Drops the connection and gives up its seat, telling everyone else.
    pub fn disconnect(&mut self, conn_id: ConnectionId) {
        let Some(connection) = self.connections.remove(&conn_id) else {
            return;
        };
        info!(
            "Connection #{} closed ({} total)",
            conn_id,
            self.connections.len()
        );

        let Some(player_id) = connection.player_id else {
            return;
        };
        match self.game.remove_player(&player_id) {
            Ok(event) => self.publish(&event),
            Err(e) => warn!("Could not remove player {}: {}", player_id, e),
        }
    }

    /// Applies one request. Success is broadcast to everyone; failure goes back
    /// to the requester only.
    pub fn handle_request(&mut self, conn_id: ConnectionId, request: ClientRequest) {
        debug!("Connection #{} sent {:?}", conn_id, request);
        match self.dispatch(conn_id, request) {
            Ok(event) => {
                info!("{}", event);
                self.publish(&event);
            }
            Err(e) => {
                debug!("Rejected request from #{}: {}", conn_id, e);
                self.reject(conn_id, e.to_string());
            }
        }
    }

    pub fn reject(&self, conn_id: ConnectionId, message: impl Into<String>) {
        self.send_to(conn_id, ServerMessage::error(message));
    }

    fn dispatch(
        &mut self,
        conn_id: ConnectionId,
        request: ClientRequest,
    ) -> Result<GameEvent, SessionError> {
        let bound = self
            .connections
            .get(&conn_id)
            .ok_or(SessionError::UnknownConnection)?
            .player_id
            .clone();

        if let ClientRequest::JoinGame { player_name } = &request {
            if bound.is_some() {
                return Err(SessionError::AlreadyJoined);
            }
            return self.join(conn_id, player_name.trim());
        }

        let player_id = bound.ok_or(SessionError::NotJoined)?;
        if request
            .claimed_player()
            .is_some_and(|claimed| claimed != player_id)
        {
            return Err(SessionError::IdentityMismatch);
        }

        let event = match request {
            ClientRequest::JoinGame { .. } => return Err(SessionError::AlreadyJoined),
            ClientRequest::StartGame { .. } => self.game.start()?,
            ClientRequest::PlayCard {
                card_index,
                chosen_color,
                ..
            } => self.game.play_card(&player_id, card_index, chosen_color)?,
            ClientRequest::DrawCard { .. } => self.game.draw_card(&player_id)?,
            ClientRequest::ChooseColor { color, .. } => self.game.choose_color(&player_id, color)?,
            ClientRequest::SayDos { .. } => self.game.say_dos(&player_id)?,
            ClientRequest::CallDosOnPlayer { target_id, .. } => {
                self.game.call_dos(&player_id, &target_id)?
            }
        };
        Ok(event)
    }

    fn join(&mut self, conn_id: ConnectionId, player_name: &str) -> Result<GameEvent, SessionError> {
        if player_name.is_empty() {
            return Err(SessionError::EmptyName);
        }

        let player_id = Uuid::new_v4().to_string();
        let event = self
            .game
            .add_player(player_id.clone(), player_name.to_string())?;

        if let Some(connection) = self.connections.get_mut(&conn_id) {
            connection.player_id = Some(player_id.clone());
        }
        if let Some(player_state) = self.snapshot_for(&player_id) {
            self.send_to(
                conn_id,
                ServerMessage::Joined {
                    player_id,
                    player_state,
                },
            );
        }
        Ok(event)
    }

    fn snapshot_for(&self, player_id: &str) -> Option<PlayerSnapshot> {
        let private = self.game.private_view(player_id)?;
        Some(PlayerSnapshot::compose(self.game.public_view(), private))
    }

    /// Every seated connection gets the shared view plus its own hand, then
    /// every connection gets the event line.
    fn publish(&self, event: &GameEvent) {
        let public = self.game.public_view();
        for (conn_id, connection) in &self.connections {
            let Some(player_id) = &connection.player_id else {
                continue;
            };
            let Some(private) = self.game.private_view(player_id) else {
                continue;
            };
            let player_state = PlayerSnapshot::compose(public.clone(), private);
            Self::deliver(*conn_id, connection, ServerMessage::GameUpdate { player_state });
        }

        let feed = ServerMessage::feed(event.to_string());
        for (conn_id, connection) in &self.connections {
            Self::deliver(*conn_id, connection, feed.clone());
        }
    }

    fn send_to(&self, conn_id: ConnectionId, message: ServerMessage) {
        if let Some(connection) = self.connections.get(&conn_id) {
            Self::deliver(conn_id, connection, message);
        }
    }

    fn deliver(conn_id: ConnectionId, connection: &Connection, message: ServerMessage) {
        if connection.outbox.send(message).is_err() {
            debug!("Connection #{} is gone, dropping message", conn_id);
        }
    }
}

/// Shared handle to the single session. Every request runs to completion,
/// broadcast included, under one lock.
#[derive(Clone)]
pub struct SessionManager {
    session: Arc<Mutex<GameSession>>,
}

impl SessionManager {
    pub fn new(game: DosGame) -> Self {
        Self {
            session: Arc::new(Mutex::new(GameSession::new(game))),
        }
    }

    pub async fn connect(&self, outbox: Outbox) -> ConnectionId {
        self.session.lock().await.connect(outbox)
    }

    pub async fn handle(&self, conn_id: ConnectionId, request: ClientRequest) {
        self.session.lock().await.handle_request(conn_id, request);
    }

    pub async fn reject(&self, conn_id: ConnectionId, message: String) {
        self.session.lock().await.reject(conn_id, message);
    }

    pub async fn disconnect(&self, conn_id: ConnectionId) {
        self.session.lock().await.disconnect(conn_id);
    }

    pub async fn public_view(&self) -> PublicView {
        self.session.lock().await.game().public_view()
    }
}
