use crate::message::ServerMessage;

/// Error taxonomy for inbound client actions. All of these surface as an
/// `error` wire frame and never mutate room state; transport-level errors
/// (socket read/write failures) are handled separately and are silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    InvalidEnvelope,
    InvalidPayload,
    InvalidCard(String),
    WrongPhase(&'static str),
    NotYourTurn,
    NotOwned,
    InvalidCombination,
    CannotBeat,
    MustLead,
    CannotPassOwn,
    RoomFull,
    AlreadyInRoom,
    RoomNotFound,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            EngineError::InvalidEnvelope => write!(f, "malformed message envelope"),
            EngineError::InvalidPayload => write!(f, "invalid payload for this message type"),
            EngineError::InvalidCard(s) => write!(f, "invalid card: {s}"),
            EngineError::WrongPhase(what) => write!(f, "{what}"),
            EngineError::NotYourTurn => write!(f, "not your turn"),
            EngineError::NotOwned => write!(f, "you don't have those cards"),
            EngineError::InvalidCombination => write!(f, "invalid card combination"),
            EngineError::CannotBeat => write!(f, "your cards cannot beat the current play"),
            EngineError::MustLead => write!(f, "you must play cards to start the round"),
            EngineError::CannotPassOwn => write!(f, "you cannot pass on your own play"),
            EngineError::RoomFull => write!(f, "room is full"),
            EngineError::AlreadyInRoom => write!(f, "already in a room, leave first"),
            EngineError::RoomNotFound => write!(f, "room not found"),
        }
    }
}

impl std::error::Error for EngineError {}

impl EngineError {
    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::error(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_human_readable_message() {
        assert_eq!(EngineError::NotYourTurn.to_string(), "not your turn");
    }
}
