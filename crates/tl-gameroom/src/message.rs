use crate::error::EngineError;
use crate::room::{PlayerInfo, RoomPhase};
use tl_cards::CardPayload;
use tl_core::{Chips, RoomId, Seat};

/// The wire envelope every inbound and outbound frame follows.
#[derive(Debug, serde::Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    payload: serde_json::Value,
}

/// Messages the server accepts from a client.
#[derive(Debug, Clone)]
pub enum ClientMessage {
    JoinRoom { room_id: RoomId },
    LeaveRoom,
    Ready,
    PlayCards { cards: Vec<CardPayload> },
    PassTurn,
    Chat { message: String },
    AutoMatch { ante_level: Chips },
}

impl ClientMessage {
    /// Parses a raw text frame into a typed client message. Malformed
    /// outer frames and payloads that fail to parse for their declared
    /// type both surface as distinct `EngineError` variants.
    pub fn decode(raw: &str) -> Result<Self, EngineError> {
        let envelope: Envelope =
            serde_json::from_str(raw).map_err(|_| EngineError::InvalidEnvelope)?;

        match envelope.kind.as_str() {
            "join_room" => {
                #[derive(serde::Deserialize)]
                struct Payload {
                    room_id: RoomId,
                }
                let p: Payload = serde_json::from_value(envelope.payload)
                    .map_err(|_| EngineError::InvalidPayload)?;
                Ok(ClientMessage::JoinRoom { room_id: p.room_id })
            }
            "leave_room" => Ok(ClientMessage::LeaveRoom),
            "ready" => Ok(ClientMessage::Ready),
            "play_cards" => {
                #[derive(serde::Deserialize)]
                struct Payload {
                    cards: Vec<CardPayload>,
                }
                let p: Payload = serde_json::from_value(envelope.payload)
                    .map_err(|_| EngineError::InvalidPayload)?;
                Ok(ClientMessage::PlayCards { cards: p.cards })
            }
            "pass_turn" => Ok(ClientMessage::PassTurn),
            "chat" => {
                #[derive(serde::Deserialize)]
                struct Payload {
                    message: String,
                }
                let p: Payload = serde_json::from_value(envelope.payload)
                    .map_err(|_| EngineError::InvalidPayload)?;
                Ok(ClientMessage::Chat { message: p.message })
            }
            "auto_match" => {
                #[derive(serde::Deserialize)]
                struct Payload {
                    ante_level: Chips,
                }
                let p: Payload = serde_json::from_value(envelope.payload)
                    .map_err(|_| EngineError::InvalidPayload)?;
                Ok(ClientMessage::AutoMatch {
                    ante_level: p.ante_level,
                })
            }
            _ => Err(EngineError::InvalidEnvelope),
        }
    }
}

/// Messages the server sends to a client.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    RoomUpdate {
        id: RoomId,
        name: String,
        ante_amount: Chips,
        phase: RoomPhase,
        player_count: usize,
        spectator_count: usize,
        has_bots: bool,
    },
    GameState {
        room_id: RoomId,
        phase: RoomPhase,
        current_turn: Option<Seat>,
        players: Vec<PlayerInfo>,
        table_play: Option<TablePlayView>,
        ante_amount: Chips,
    },
    CardDealt {
        room_id: RoomId,
        phase: RoomPhase,
        current_turn: Option<Seat>,
        hand: Vec<CardPayload>,
        players: Vec<PlayerInfo>,
        table_play: Option<TablePlayView>,
        ante_amount: Chips,
    },
    MovePlayed {
        player_index: Seat,
        cards: Vec<CardPayload>,
        combo_type: tl_cards::Combination,
    },
    TurnChange {
        #[serde(skip_serializing_if = "Option::is_none")]
        current_turn: Option<Seat>,
        #[serde(skip_serializing_if = "Option::is_none")]
        table_clear: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        action: Option<&'static str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        player_index: Option<Seat>,
    },
    Settlement {
        winner: Seat,
        total_pot: Chips,
        server_fee: Chips,
        results: Vec<SettlementResult>,
    },
    ChatRelay {
        message: String,
        sender: String,
    },
    MatchFound {
        room_id: RoomId,
        room_name: String,
        seat: Seat,
    },
    Error {
        error: String,
    },
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TablePlayView {
    pub player_index: Seat,
    pub cards: Vec<CardPayload>,
    pub combo_type: tl_cards::Combination,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SettlementResult {
    pub seat: Seat,
    pub user_id: i64,
    pub username: String,
    pub cards_left: usize,
    pub twos_held: usize,
    pub penalty_multiplier: Chips,
    pub gold_delta: Chips,
    pub is_bot: bool,
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            error: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize server message")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_join_room() {
        let raw = r#"{"type":"join_room","payload":{"room_id":7}}"#;
        match ClientMessage::decode(raw).unwrap() {
            ClientMessage::JoinRoom { room_id } => assert_eq!(room_id, 7),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_envelope() {
        assert!(ClientMessage::decode("not json").is_err());
    }

    #[test]
    fn rejects_unknown_message_type() {
        let raw = r#"{"type":"nonsense","payload":{}}"#;
        assert!(ClientMessage::decode(raw).is_err());
    }

    #[test]
    fn rejects_payload_mismatched_with_declared_type() {
        let raw = r#"{"type":"join_room","payload":{"wrong":"shape"}}"#;
        assert!(ClientMessage::decode(raw).is_err());
    }

    #[test]
    fn error_message_serializes_with_tagged_type() {
        let msg = ServerMessage::error("boom");
        assert_eq!(msg.to_json(), r#"{"type":"error","error":"boom"}"#);
    }
}
