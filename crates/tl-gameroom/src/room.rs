use std::time::Instant;

use tl_cards::{Card, Combination};
use tl_core::{Chips, RoomId, Seat, MAX_SPECTATORS, SEATS};

/// A room's lifecycle. Plain and closed rather than a generic typestate:
/// transitions are driven by external messages and two independently
/// armed timers (turn, settlement-reset), not by a single linear
/// chance/choice/terminal turn loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPhase {
    Lobby,
    Dealing,
    Playing,
    Settlement,
}

/// A seated player. `hand` is only ever sent to its own seat; other seats
/// only ever see `card_count`.
#[derive(Debug, Clone)]
pub struct Player {
    pub user_id: i64,
    pub username: String,
    pub hand: Vec<Card>,
    pub seat: Seat,
    pub is_ready: bool,
    pub is_bot: bool,
}

impl Player {
    pub fn new(user_id: i64, username: impl Into<String>, seat: Seat, is_bot: bool) -> Self {
        Self {
            user_id,
            username: username.into(),
            hand: Vec::new(),
            seat,
            is_ready: false,
            is_bot,
        }
    }

    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            seat: self.seat,
            user_id: self.user_id,
            username: self.username.clone(),
            card_count: self.hand.len(),
            is_ready: self.is_ready,
            is_bot: self.is_bot,
        }
    }
}

/// A seated player's shape as broadcast to every other seat: never the hand.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PlayerInfo {
    pub seat: Seat,
    pub user_id: i64,
    pub username: String,
    pub card_count: usize,
    pub is_ready: bool,
    pub is_bot: bool,
}

#[derive(Debug, Clone)]
pub struct Spectator {
    pub user_id: i64,
    pub username: String,
}

/// The combination currently standing on the table, or none if the table
/// was just cleared and the next turn must lead.
#[derive(Debug, Clone)]
pub struct TablePlay {
    pub player_index: Seat,
    pub cards: Vec<Card>,
    pub combo: Combination,
}

/// Snapshot used for lobby listings. Deliberately owned, not borrowed:
/// the lobby list is materialized fresh on every request rather than
/// cached, so a stale snapshot can never outlive the room it describes.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RoomInfo {
    pub id: RoomId,
    pub name: String,
    pub ante_amount: Chips,
    pub phase: RoomPhase,
    pub player_count: usize,
    pub spectator_count: usize,
    pub has_bots: bool,
}

/// One table. Holds its own data; the lock guarding concurrent access is
/// held by the caller (the hub), not by the room itself.
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub ante_amount: Chips,
    pub phase: RoomPhase,
    pub players: [Option<Player>; SEATS],
    pub spectators: Vec<Spectator>,
    pub current_turn: Option<Seat>,
    pub table_play: Option<TablePlay>,
    pub pass_count: u8,
    pub winner: Option<Seat>,
    pub has_bots: bool,
    /// Set the moment the room holds at least one human and fewer than
    /// four players; cleared once full or reset to lobby. Bot auto-fill
    /// only considers rooms that have waited past the threshold.
    pub waiting_since: Option<Instant>,
}

impl Room {
    pub fn new(id: RoomId, name: impl Into<String>, ante_amount: Chips) -> Self {
        Self {
            id,
            name: name.into(),
            ante_amount,
            phase: RoomPhase::Lobby,
            players: Default::default(),
            spectators: Vec::new(),
            current_turn: None,
            table_play: None,
            pass_count: 0,
            winner: None,
            has_bots: false,
            waiting_since: None,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_some()).count()
    }

    pub fn human_player_count(&self) -> usize {
        self.players
            .iter()
            .filter(|p| matches!(p, Some(p) if !p.is_bot))
            .count()
    }

    pub fn find_empty_seat(&self) -> Option<Seat> {
        self.players.iter().position(|p| p.is_none())
    }

    pub fn find_player_by_user_id(&self, user_id: i64) -> Option<Seat> {
        self.players
            .iter()
            .position(|p| matches!(p, Some(p) if p.user_id == user_id))
    }

    pub fn all_players_ready(&self) -> bool {
        self.player_count() == SEATS && self.players.iter().all(|p| matches!(p, Some(p) if p.is_ready))
    }

    pub fn add_spectator(&mut self, user_id: i64, username: impl Into<String>) -> bool {
        if self.spectators.len() >= MAX_SPECTATORS {
            return false;
        }
        self.spectators.push(Spectator {
            user_id,
            username: username.into(),
        });
        true
    }

    pub fn remove_spectator(&mut self, user_id: i64) {
        self.spectators.retain(|s| s.user_id != user_id);
    }

    pub fn to_info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            name: self.name.clone(),
            ante_amount: self.ante_amount,
            phase: self.phase,
            player_count: self.player_count(),
            spectator_count: self.spectators.len(),
            has_bots: self.has_bots,
        }
    }

    /// Resets a room back to an empty lobby, clearing every stateful
    /// field a finished or abandoned round leaves behind.
    pub fn reset_to_lobby(&mut self) {
        self.phase = RoomPhase::Lobby;
        self.current_turn = None;
        self.table_play = None;
        self.pass_count = 0;
        self.winner = None;
        self.waiting_since = None;
        for seat in self.players.iter_mut() {
            if let Some(player) = seat {
                player.hand.clear();
                player.is_ready = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::new(1, "Room 1 (100G)", 100)
    }

    #[test]
    fn seats_fill_in_order() {
        let mut r = room();
        for i in 0..4 {
            let seat = r.find_empty_seat().unwrap();
            r.players[seat] = Some(Player::new(i, format!("p{i}"), seat, false));
        }
        assert_eq!(r.player_count(), 4);
        assert!(r.find_empty_seat().is_none());
    }

    #[test]
    fn all_ready_requires_full_table() {
        let mut r = room();
        r.players[0] = Some(Player::new(1, "a", 0, false));
        assert!(!r.all_players_ready());
    }

    #[test]
    fn spectators_are_capped() {
        let mut r = room();
        assert!(r.add_spectator(1, "a"));
        assert!(r.add_spectator(2, "b"));
        assert!(r.add_spectator(3, "c"));
        assert!(!r.add_spectator(4, "d"));
    }

    #[test]
    fn reset_clears_hands_and_readiness() {
        let mut r = room();
        let mut p = Player::new(1, "a", 0, false);
        p.is_ready = true;
        p.hand.push(Card::three_of_spades());
        r.players[0] = Some(p);
        r.phase = RoomPhase::Settlement;
        r.reset_to_lobby();
        assert_eq!(r.phase, RoomPhase::Lobby);
        let p = r.players[0].as_ref().unwrap();
        assert!(!p.is_ready);
        assert!(p.hand.is_empty());
    }
}
