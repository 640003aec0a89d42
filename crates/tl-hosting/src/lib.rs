//! Connection hub: the transport-facing layer that owns the room
//! registry, fans socket frames in and out through the game engine, and
//! schedules bots. The HTTP/WebSocket surface itself lives in the server
//! crate; this crate is the part of it that doesn't care which web
//! framework is on the other end of the socket.

pub mod bot_manager;
pub mod client;
pub mod hub;
pub mod matchmaking;
pub mod settlement;

pub use bot_manager::BotManager;
pub use client::{connect, on_disconnect, on_message};
pub use hub::Hub;
pub use matchmaking::{MatchRequest, MatchmakingService};
pub use settlement::{LoggingSink, SettlementSink};
