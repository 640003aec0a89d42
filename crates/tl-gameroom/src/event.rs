use tl_cards::{Card, Combination};
use tl_core::Seat;

/// Domain events the engine emits as a side effect of handling a message.
/// These are internal; the hub translates them into `ServerMessage` frames
/// and fan-out decisions (broadcast vs. unicast vs. per-seat hand reveal).
#[derive(Debug, Clone)]
pub enum Event {
    RoomUpdated,
    GameStarted {
        hands: [Vec<Card>; 4],
        first_player: Seat,
    },
    CardsPlayed {
        seat: Seat,
        cards: Vec<Card>,
        combo: Combination,
    },
    TurnAdvanced {
        current_turn: Seat,
        table_cleared: bool,
    },
    TurnPassed {
        seat: Seat,
    },
    RoundSettled {
        winner: Seat,
    },
    RoomReset,
    ChatRelayed {
        sender: String,
        message: String,
    },
    PlayerLeft {
        seat: Seat,
    },
    SpectatorJoined,
    SpectatorLeft,
}
