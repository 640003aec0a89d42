//! Game-room domain: rule-agnostic room/seat bookkeeping, the message
//! wire format, and the stateless engine that turns a `ClientMessage`
//! plus a `Room` into state mutations, outbound dispatches, and timer
//! instructions. Transport (sockets, the room registry, bot scheduling)
//! lives one layer up, in the hosting crate.

pub mod engine;
pub mod error;
pub mod event;
pub mod message;
pub mod players;
pub mod room;
pub mod table;

pub use engine::{Dispatch, Outcome, Recipient, TimerAction};
pub use error::EngineError;
pub use event::Event;
pub use message::{ClientMessage, ServerMessage, SettlementResult, TablePlayView};
pub use players::{bot::BotPlayer, Decision, Player};
pub use room::{PlayerInfo, Room, RoomInfo, RoomPhase, Spectator, TablePlay};
pub use table::Table;
