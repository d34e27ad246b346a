use super::game::DosGame;
use super::protocol::ClientRequest;
use super::session::{ConnectionId, SessionManager};
use crate::config::ServerConfig;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub struct AppState {
    sessions: SessionManager,
}

impl AppState {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().include_headers(true))
        .on_response(DefaultOnResponse::new().include_headers(true));

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/state", get(get_state))
        .layer(cors)
        .layer(trace_layer)
        .with_state(state)
}

/// Public view of the table. Never includes any hand.
pub async fn get_state(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.sessions.public_view().await)
}

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, mut socket: WebSocket) {
    let (outbox, mut inbox) = mpsc::unbounded_channel();
    let conn_id = state.sessions.connect(outbox).await;

    loop {
        tokio::select! {
            outgoing = inbox.recv() => {
                let Some(message) = outgoing else {
                    break;
                };
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Failed to encode message for #{}: {}", conn_id, e);
                        continue;
                    }
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    handle_text(&state, conn_id, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Connection #{} failed: {}", conn_id, e);
                    break;
                }
            }
        }
    }

    state.sessions.disconnect(conn_id).await;
}

async fn handle_text(state: &AppState, conn_id: ConnectionId, text: &str) {
    match serde_json::from_str::<ClientRequest>(text) {
        Ok(request) => state.sessions.handle(conn_id, request).await,
        Err(e) => {
            debug!("Malformed request from #{}: {}", conn_id, e);
            state
                .sessions
                .reject(conn_id, format!("Malformed request: {}", e))
                .await;
        }
    }
}

fn init_logging(config: &ServerConfig) {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    // Carries the tower-http request spans.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tower_http={}", config.log_level)));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        warn!("A tracing subscriber was already installed");
    }
}

pub async fn start_api_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&config);
    info!("Starting DOS server...");

    let game = match config.seed {
        Some(seed) => {
            info!("Shuffling with fixed seed {}", seed);
            DosGame::with_seed(seed)
        }
        None => DosGame::new(),
    };
    let app = router(AppState::new(SessionManager::new(game)));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("DOS server running on http://{}", address);
    info!("Clients connect to ws://{}/ws", address);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dos_game::view::PublicView;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_state_of_empty_table() {
        let app = router(AppState::new(SessionManager::new(DosGame::with_seed(1))));

        let response = app.oneshot(get("/state")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let view: PublicView = serde_json::from_slice(&body).unwrap();
        assert!(view.players.is_empty());
        assert!(!view.game_started);
        assert_eq!(view.current_player, None);
    }

    #[tokio::test]
    async fn test_get_state_hides_hands() {
        let sessions = SessionManager::new(DosGame::with_seed(2));
        let app = router(AppState::new(sessions.clone()));

        for name in ["Ana", "Ben"] {
            let (outbox, _inbox) = mpsc::unbounded_channel();
            let conn_id = sessions.connect(outbox).await;
            sessions
                .handle(
                    conn_id,
                    ClientRequest::JoinGame {
                        player_name: name.to_string(),
                    },
                )
                .await;
            if name == "Ben" {
                sessions
                    .handle(conn_id, ClientRequest::StartGame { player_id: None })
                    .await;
            }
        }

        let response = app.oneshot(get("/state")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["gameStarted"], true);
        assert_eq!(value["players"].as_array().unwrap().len(), 2);
        assert!(value["topCard"].is_object());
        assert!(value.get("hand").is_none());
        assert!(value["players"][0]["handCount"].as_u64().unwrap() >= 7);
    }

    #[tokio::test]
    async fn test_ws_route_requires_upgrade() {
        let app = router(AppState::new(SessionManager::new(DosGame::with_seed(3))));

        let response = app.oneshot(get("/ws")).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = router(AppState::new(SessionManager::new(DosGame::with_seed(4))));

        let response = app.oneshot(get("/games")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
