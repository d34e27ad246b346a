pub mod api;
pub mod card;
pub mod game;
pub mod player;
pub mod protocol;
pub mod session;
pub mod view;

pub use card::{Card, CardKind, CardType, Color};
pub use game::{DosGame, GameError, GameEvent, GameStatus};
pub use player::{Player, PlayerId};
pub use protocol::{ClientRequest, ServerMessage};
pub use session::{GameSession, SessionError, SessionManager};
pub use view::{PlayerSnapshot, PrivateView, PublicView};
