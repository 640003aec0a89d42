pub mod bot;

use async_trait::async_trait;
use tl_cards::{Card, Combination, Standing};

/// What a player decided to do on their turn.
#[derive(Debug, Clone)]
pub enum Decision {
    Play(Vec<Card>, Combination),
    Pass,
}

/// A turn-taking participant that can decide for itself. Human players
/// never implement this — their decisions arrive as `ClientMessage`s off
/// the socket. This trait exists for automated seats (bots) that the
/// engine drives the same way it would wait on a human's next message.
#[async_trait]
pub trait Player: Send + Sync {
    async fn decide(&self, hand: &[Card], table: Option<&Standing>) -> Decision;
}
