use std::collections::HashMap;

use tokio::sync::mpsc::Sender;

use tl_core::{RoomId, Seat, SEATS};

/// A room's fan-out registry: one outbound channel per seated player, plus
/// one per spectator keyed by user id. Holds no game state of its own —
/// just where to send the next frame, and what to do when nobody's there
/// to receive it. Channels are bounded (`SEND_QUEUE_DEPTH`) so a client
/// that stops reading can't let its backlog grow without limit; a full
/// queue drops the frame the same way a gone receiver does.
pub struct Table {
    room_id: RoomId,
    seats: Vec<Option<Sender<String>>>,
    spectators: HashMap<i64, Sender<String>>,
}

impl Table {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            seats: (0..SEATS).map(|_| None).collect(),
            spectators: HashMap::new(),
        }
    }

    pub fn seat(&mut self, seat: Seat, sender: Sender<String>) {
        self.seats[seat] = Some(sender);
        log::debug!("[room {}] seat {seat} connected", self.room_id);
    }

    pub fn vacate(&mut self, seat: Seat) {
        self.seats[seat] = None;
        log::debug!("[room {}] seat {seat} disconnected", self.room_id);
    }

    pub fn watch(&mut self, user_id: i64, sender: Sender<String>) {
        self.spectators.insert(user_id, sender);
    }

    pub fn unwatch(&mut self, user_id: i64) {
        self.spectators.remove(&user_id);
    }

    /// Sends to exactly one seat. Silently drops if the seat is empty, its
    /// receiver has gone away, or its queue is full — the client already
    /// disconnected (or is too far behind to matter) and unregistration
    /// will clean this up shortly.
    pub fn unicast(&self, seat: Seat, frame: &str) {
        if let Some(Some(sender)) = self.seats.get(seat) {
            if sender.try_send(frame.to_string()).is_err() {
                log::warn!("[room {}] seat {seat} receiver gone or full, dropping frame", self.room_id);
            }
        }
    }

    /// Sends to every connected seat and every spectator.
    pub fn broadcast(&self, frame: &str) {
        for seat in self.seats.iter().flatten() {
            let _ = seat.try_send(frame.to_string());
        }
        for sender in self.spectators.values() {
            let _ = sender.try_send(frame.to_string());
        }
    }

    /// Sends to every spectator only — used for the spectator-facing
    /// `game_state` view, which seated players get their own `card_dealt`
    /// variant of instead.
    pub fn broadcast_to_spectators(&self, frame: &str) {
        for sender in self.spectators.values() {
            let _ = sender.try_send(frame.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_core::SEND_QUEUE_DEPTH;

    #[test]
    fn broadcast_reaches_every_seated_receiver() {
        let mut table = Table::new(1);
        let mut rxs = Vec::new();
        for seat in 0..4 {
            let (tx, rx) = tokio::sync::mpsc::channel(SEND_QUEUE_DEPTH);
            table.seat(seat, tx);
            rxs.push(rx);
        }
        table.broadcast("hello");
        for mut rx in rxs {
            assert_eq!(rx.try_recv().unwrap(), "hello");
        }
    }

    #[test]
    fn vacating_a_seat_stops_delivery() {
        let mut table = Table::new(1);
        let (tx, mut rx) = tokio::sync::mpsc::channel(SEND_QUEUE_DEPTH);
        table.seat(0, tx);
        table.vacate(0);
        table.unicast(0, "hello");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn a_full_queue_drops_the_frame_instead_of_blocking() {
        let mut table = Table::new(1);
        let (tx, mut rx) = tokio::sync::mpsc::channel(1);
        table.seat(0, tx);
        table.unicast(0, "first");
        table.unicast(0, "second");
        assert_eq!(rx.try_recv().unwrap(), "first");
        assert!(rx.try_recv().is_err());
    }
}
