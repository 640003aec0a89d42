use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{Sender, UnboundedSender};
use tokio::sync::{Mutex, RwLock};

use tl_cards::Standing;
use tl_core::{Chips, RoomId, Seat, ANTE_TIERS, ROOMS_PER_ANTE, SEATS, SEND_QUEUE_DEPTH};
use tl_gameroom::players::bot::BotPlayer;
use tl_gameroom::room::Player as SeatedPlayer;
use tl_gameroom::{
    engine, ClientMessage, Decision, EngineError, Event, Player, Recipient, Room, RoomInfo,
    RoomPhase, ServerMessage, SettlementResult, Table, TimerAction,
};

use crate::matchmaking::MatchRequest;
use crate::settlement::{LoggingSink, SettlementSink};

/// A connected socket's routing state: where to send frames, and which
/// room (if any) it currently occupies. Room membership lives here, not
/// duplicated per room.
struct ClientHandle {
    username: String,
    sender: Sender<String>,
    room_id: Option<RoomId>,
}

struct RoomSlot {
    room: Mutex<Room>,
    table: Mutex<Table>,
}

/// The central registry: every connected client, the fixed pool of
/// rooms, and the bots seated across them. One `Hub` is shared (via
/// `Arc`) across every connection task and the bot manager.
pub struct Hub {
    clients: RwLock<HashMap<i64, ClientHandle>>,
    rooms: Vec<RoomSlot>,
    bots: Mutex<HashMap<(RoomId, Seat), Arc<BotPlayer>>>,
    /// Producer side of the matchmaking queue. `None` until
    /// `set_matchmaker` is called at startup; `auto_match` requests that
    /// arrive before wiring are told to retry rather than silently
    /// dropped. Kept as a channel rather than a direct `Arc<Matchmaking>`
    /// to avoid a cyclic reference between the hub and the matchmaking
    /// service.
    match_tx: Mutex<Option<UnboundedSender<MatchRequest>>>,
    /// Where settlement results go once a round ends. Defaults to a
    /// log-only sink; `Hub::with_sink` swaps in a durable one.
    sink: Arc<dyn SettlementSink>,
}

impl Hub {
    /// Builds the fixed 1000-room pool split across the three ante tiers,
    /// densely numbered starting at 1, settling rounds into a log-only
    /// sink. Use `with_sink` to back settlement with something durable.
    pub fn new() -> Arc<Self> {
        Self::with_sink(Arc::new(LoggingSink))
    }

    pub fn with_sink(sink: Arc<dyn SettlementSink>) -> Arc<Self> {
        let mut rooms = Vec::with_capacity(ROOMS_PER_ANTE.iter().sum());
        let mut id: RoomId = 1;
        for (tier, &ante) in ANTE_TIERS.iter().enumerate() {
            for _ in 0..ROOMS_PER_ANTE[tier] {
                let name = format!("Room {id} ({ante}G)");
                rooms.push(RoomSlot {
                    room: Mutex::new(Room::new(id, name, ante)),
                    table: Mutex::new(Table::new(id)),
                });
                id += 1;
            }
        }
        Arc::new(Self {
            clients: RwLock::new(HashMap::new()),
            rooms,
            bots: Mutex::new(HashMap::new()),
            match_tx: Mutex::new(None),
            sink,
        })
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Wires the matchmaking queue's producer side. Called once at
    /// startup after both the hub and the matchmaking service exist.
    pub async fn set_matchmaker(&self, tx: UnboundedSender<MatchRequest>) {
        *self.match_tx.lock().await = Some(tx);
    }

    pub fn is_valid_ante(ante: Chips) -> bool {
        ANTE_TIERS.contains(&ante)
    }

    /// True if `user_id` is already seated or spectating somewhere.
    pub async fn is_in_room(&self, user_id: i64) -> bool {
        let clients = self.clients.read().await;
        matches!(clients.get(&user_id), Some(c) if c.room_id.is_some())
    }

    /// First lobby room at `ante` with an open seat, if any.
    pub async fn find_open_room(&self, ante: Chips) -> Option<RoomId> {
        for slot in &self.rooms {
            let room = slot.room.lock().await;
            if room.ante_amount == ante && room.phase == RoomPhase::Lobby && room.player_count() < SEATS {
                return Some(room.id);
            }
        }
        None
    }

    pub async fn room_name(&self, room_id: RoomId) -> Option<String> {
        let slot = self.slot(room_id)?;
        Some(slot.room.lock().await.name.clone())
    }

    pub async fn seat_of(&self, room_id: RoomId, user_id: i64) -> Option<Seat> {
        let slot = self.slot(room_id)?;
        slot.room.lock().await.find_player_by_user_id(user_id)
    }

    fn slot(&self, room_id: RoomId) -> Option<&RoomSlot> {
        room_id.checked_sub(1).and_then(|i| self.rooms.get(i))
    }

    /// Registers a freshly authenticated connection. A second connection
    /// for the same user id replaces the first one's sender — last
    /// writer wins, matching a browser refresh replacing a stale tab.
    pub async fn register(&self, user_id: i64, username: String, sender: Sender<String>) {
        let mut clients = self.clients.write().await;
        clients.insert(
            user_id,
            ClientHandle {
                username,
                sender,
                room_id: None,
            },
        );
    }

    /// Drops a connection and, if it was seated or spectating, removes
    /// it from its room and resets an in-progress round to lobby.
    pub async fn unregister(self: Arc<Self>, user_id: i64) {
        let room_id = {
            let mut clients = self.clients.write().await;
            clients.remove(&user_id).and_then(|c| c.room_id)
        };
        if let Some(room_id) = room_id {
            self.leave_room(user_id, room_id).await;
        }
    }

    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut out = Vec::with_capacity(self.rooms.len());
        for slot in &self.rooms {
            out.push(slot.room.lock().await.to_info());
        }
        out
    }

    /// Lobby rooms with at least one human, no bots yet, an open seat,
    /// and a wait older than `threshold` — exactly the rooms auto-fill
    /// should top up. `waiting_since` lives on `Room`, not the public
    /// `RoomInfo` snapshot, so this walks the rooms directly.
    pub async fn rooms_needing_autofill(&self, threshold: std::time::Duration) -> Vec<(RoomId, usize)> {
        let mut out = Vec::new();
        for slot in &self.rooms {
            let room = slot.room.lock().await;
            if room.phase != RoomPhase::Lobby || room.has_bots || room.human_player_count() == 0 {
                continue;
            }
            let missing = SEATS - room.player_count();
            if missing == 0 {
                continue;
            }
            let waited_long_enough =
                matches!(room.waiting_since, Some(since) if since.elapsed() >= threshold);
            if waited_long_enough {
                out.push((room.id, missing));
            }
        }
        out
    }

    async fn send_to(&self, user_id: i64, frame: &str) {
        let clients = self.clients.read().await;
        if let Some(client) = clients.get(&user_id) {
            let _ = client.sender.try_send(frame.to_string());
        }
    }

    /// Unicasts a single server message to one client. Used by the
    /// matchmaking service to deliver `match_found` outside the usual
    /// room-scoped dispatch path.
    pub async fn send_message(&self, user_id: i64, message: &ServerMessage) {
        self.send_to(user_id, &message.to_json()).await;
    }

    /// Applies an `Outcome`'s dispatches against the room's fan-out table
    /// and arms/cancels whatever timer it asked for.
    async fn apply(self: Arc<Self>, room_id: RoomId, outcome: engine::Outcome) {
        let slot = self.slot(room_id).expect("room exists");
        log::debug!("[room {room_id}] {:?}", outcome.event);
        {
            let table = slot.table.lock().await;
            for dispatch in &outcome.dispatches {
                if let ServerMessage::Settlement { results, .. } = &dispatch.message {
                    self.sink.record(room_id, results);
                }
                let frame = dispatch.message.to_json();
                match dispatch.to {
                    Recipient::All => table.broadcast(&frame),
                    Recipient::Spectators => table.broadcast_to_spectators(&frame),
                    Recipient::Seat(seat) => table.unicast(seat, &frame),
                }
            }
        }
        if let Some(action) = outcome.timer {
            self.clone().schedule_timer(room_id, action).await;
        }
        self.drive_bot_if_needed(room_id).await;
    }

    async fn schedule_timer(self: Arc<Self>, room_id: RoomId, action: TimerAction) {
        match action {
            TimerAction::CancelTurn => {}
            TimerAction::ArmTurn(seat, duration) => {
                tokio::spawn(async move {
                    tokio::time::sleep(duration).await;
                    self.on_turn_timeout(room_id, seat).await;
                });
            }
            TimerAction::ArmSettlementReset(duration) => {
                tokio::spawn(async move {
                    tokio::time::sleep(duration).await;
                    self.on_settlement_reset(room_id).await;
                });
            }
        }
    }

    /// A stale turn timer firing is a silent no-op if the room has moved
    /// on (the holder already played/passed, or the room isn't even in
    /// that phase anymore). On a genuine timeout, the seat is force-passed
    /// unconditionally via `handle_turn_timeout` — unlike a human's
    /// `pass_turn`, this also fires when the seat is leading (table
    /// clear), which is exactly the AFK-leader case the timer exists for.
    async fn on_turn_timeout(self: Arc<Self>, room_id: RoomId, seat: Seat) {
        let Some(slot) = self.slot(room_id) else { return };
        let outcome = {
            let mut room = slot.room.lock().await;
            if room.phase != RoomPhase::Playing || room.current_turn != Some(seat) {
                return;
            }
            engine::handle_turn_timeout(&mut room, seat)
        };
        self.apply(room_id, outcome).await;
    }

    async fn on_settlement_reset(self: Arc<Self>, room_id: RoomId) {
        let Some(slot) = self.slot(room_id) else { return };
        let outcome = {
            let mut room = slot.room.lock().await;
            if room.phase != RoomPhase::Settlement {
                return;
            }
            engine::handle_settlement_reset(&mut room)
        };
        self.apply(room_id, outcome).await;
    }

    /// After any mutation, checks whether the seat now on turn is a bot
    /// and, if so, drives its decision through the same handler path a
    /// human's message would take.
    async fn drive_bot_if_needed(self: Arc<Self>, room_id: RoomId) {
        let Some(slot) = self.slot(room_id) else { return };
        let (seat, hand, table, user_id) = {
            let room = slot.room.lock().await;
            let Some(seat) = room.current_turn else { return };
            let Some(player) = &room.players[seat] else { return };
            if !player.is_bot {
                return;
            }
            let table = room.table_play.as_ref().map(|tp| Standing {
                cards: tp.cards.clone(),
                combo: tp.combo,
            });
            (seat, player.hand.clone(), table, player.user_id)
        };
        let bot = {
            let bots = self.bots.lock().await;
            match bots.get(&(room_id, seat)) {
                Some(bot) => Arc::clone(bot),
                None => return,
            }
        };

        tokio::spawn(async move {
            let decision = bot.decide(&hand, table.as_ref()).await;
            let outcome = match decision {
                Decision::Play(cards, _) => {
                    let Some(slot) = self.slot(room_id) else { return };
                    let mut room = slot.room.lock().await;
                    engine::handle_play_cards(&mut room, user_id, &cards)
                }
                Decision::Pass => {
                    let Some(slot) = self.slot(room_id) else { return };
                    let mut room = slot.room.lock().await;
                    engine::handle_pass_turn(&mut room, user_id)
                }
            };
            if let Ok(outcome) = outcome {
                self.apply(room_id, outcome).await;
            }
        });
    }

    /// Seats a bot at an empty seat in `room_id` and registers it to
    /// drive its own turns via `drive_bot_if_needed`.
    pub async fn seat_bot(&self, room_id: RoomId, bot: Arc<BotPlayer>) -> Result<Seat, EngineError> {
        let Some(slot) = self.slot(room_id) else {
            return Err(EngineError::RoomNotFound);
        };
        let seat = {
            let mut room = slot.room.lock().await;
            let seat = room.find_empty_seat().ok_or(EngineError::RoomFull)?;
            room.players[seat] = Some(SeatedPlayer::new(bot.user_id, bot.username.clone(), seat, true));
            room.has_bots = true;
            seat
        };
        // A bot never reads its own frames — it decides from the hand and
        // table state passed directly to `Player::decide` — so its sender
        // side of the channel is left to drop immediately. It still needs
        // a `clients` entry so `dispatch` can resolve its current room
        // the same way it would for a human's `ready`/`play_cards` frames.
        let (sender, _receiver) = tokio::sync::mpsc::channel(SEND_QUEUE_DEPTH);
        self.clients.write().await.insert(
            bot.user_id,
            ClientHandle {
                username: bot.username.clone(),
                sender,
                room_id: Some(room_id),
            },
        );
        self.bots.lock().await.insert((room_id, seat), bot);
        Ok(seat)
    }

    /// Routes one raw text frame from an already-registered client.
    pub async fn dispatch(self: Arc<Self>, user_id: i64, raw: &str) {
        let message = match ClientMessage::decode(raw) {
            Ok(m) => m,
            Err(e) => {
                self.send_to(user_id, &e.to_message().to_json()).await;
                return;
            }
        };

        let current_room = {
            let clients = self.clients.read().await;
            clients.get(&user_id).and_then(|c| c.room_id)
        };

        let result = self.clone().route(user_id, current_room, message).await;

        if let Err(e) = result {
            self.send_to(user_id, &e.to_message().to_json()).await;
        }
    }

    async fn route(
        self: Arc<Self>,
        user_id: i64,
        current_room: Option<RoomId>,
        message: ClientMessage,
    ) -> Result<(), EngineError> {
        match message {
            ClientMessage::JoinRoom { room_id } => self.join_room(user_id, room_id).await,
            ClientMessage::LeaveRoom => {
                let room_id = current_room.ok_or(EngineError::RoomNotFound)?;
                self.leave_room(user_id, room_id).await;
                Ok(())
            }
            ClientMessage::Ready => {
                let room_id = current_room.ok_or(EngineError::RoomNotFound)?;
                let outcome = {
                    let slot = self.slot(room_id).expect("room exists");
                    let mut room = slot.room.lock().await;
                    engine::handle_ready(&mut room, user_id)?
                };
                self.apply(room_id, outcome).await;
                Ok(())
            }
            ClientMessage::PlayCards { cards } => {
                let room_id = current_room.ok_or(EngineError::RoomNotFound)?;
                let cards: Vec<tl_cards::Card> = cards
                    .iter()
                    .map(|p| tl_cards::Card::try_from(p).map_err(EngineError::InvalidCard))
                    .collect::<Result<_, _>>()?;
                let outcome = {
                    let slot = self.slot(room_id).expect("room exists");
                    let mut room = slot.room.lock().await;
                    engine::handle_play_cards(&mut room, user_id, &cards)?
                };
                self.apply(room_id, outcome).await;
                Ok(())
            }
            ClientMessage::PassTurn => {
                let room_id = current_room.ok_or(EngineError::RoomNotFound)?;
                let outcome = {
                    let slot = self.slot(room_id).expect("room exists");
                    let mut room = slot.room.lock().await;
                    engine::handle_pass_turn(&mut room, user_id)?
                };
                self.apply(room_id, outcome).await;
                Ok(())
            }
            ClientMessage::Chat { message } => {
                if let Some(room_id) = current_room {
                    let sender = {
                        let clients = self.clients.read().await;
                        clients.get(&user_id).map(|c| c.username.clone()).unwrap_or_default()
                    };
                    let outcome = engine::handle_chat(&sender, &message);
                    self.apply(room_id, outcome).await;
                }
                Ok(())
            }
            ClientMessage::AutoMatch { ante_level } => {
                if !Self::is_valid_ante(ante_level) {
                    return Err(EngineError::InvalidPayload);
                }
                if current_room.is_some() {
                    return Err(EngineError::AlreadyInRoom);
                }
                let tx = self.match_tx.lock().await.clone();
                match tx {
                    Some(tx) => {
                        let _ = tx.send(MatchRequest { user_id, ante_level });
                        Ok(())
                    }
                    None => Err(EngineError::RoomNotFound),
                }
            }
        }
    }

    /// Seats or spectates `user_id` into `room_id`. Public because the
    /// matchmaking service drives the same path once it has picked a
    /// room for a queued `auto_match` request.
    pub async fn join_room(self: Arc<Self>, user_id: i64, room_id: RoomId) -> Result<(), EngineError> {
        {
            let clients = self.clients.read().await;
            if matches!(clients.get(&user_id), Some(c) if c.room_id.is_some()) {
                return Err(EngineError::AlreadyInRoom);
            }
        }
        let Some(slot) = self.slot(room_id) else {
            return Err(EngineError::RoomNotFound);
        };
        let (username, sender) = {
            let clients = self.clients.read().await;
            let client = clients.get(&user_id).ok_or(EngineError::RoomNotFound)?;
            (client.username.clone(), client.sender.clone())
        };
        let outcome = {
            let mut room = slot.room.lock().await;
            engine::handle_join_room(&mut room, user_id, &username)?
        };
        {
            let mut clients = self.clients.write().await;
            if let Some(client) = clients.get_mut(&user_id) {
                client.room_id = Some(room_id);
            }
        }
        {
            let mut table = slot.table.lock().await;
            let room = slot.room.lock().await;
            match room.find_player_by_user_id(user_id) {
                Some(seat) => table.seat(seat, sender),
                None => table.watch(user_id, sender),
            }
        }
        self.apply(room_id, outcome).await;
        Ok(())
    }

    async fn leave_room(self: Arc<Self>, user_id: i64, room_id: RoomId) {
        let Some(slot) = self.slot(room_id) else { return };
        let outcome = {
            let mut room = slot.room.lock().await;
            engine::handle_leave_room(&mut room, user_id)
        };
        {
            let mut table = slot.table.lock().await;
            let room = slot.room.lock().await;
            if let Some(seat) = room.find_player_by_user_id(user_id) {
                table.vacate(seat);
            } else {
                table.unwatch(user_id);
            }
        }
        {
            let mut clients = self.clients.write().await;
            if let Some(client) = clients.get_mut(&user_id) {
                client.room_id = None;
            }
        }
        self.apply(room_id, outcome).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn room_pool_matches_the_thousand_room_split() {
        let hub = Hub::new();
        assert_eq!(hub.room_count(), 1000);
        let rooms = hub.list_rooms().await;
        assert_eq!(rooms[0].ante_amount, 100);
        assert_eq!(rooms[999].ante_amount, 1000);
    }

    #[tokio::test]
    async fn register_replaces_a_stale_connection_for_the_same_user() {
        let hub = Hub::new();
        let (tx1, mut rx1) = tokio::sync::mpsc::channel(SEND_QUEUE_DEPTH);
        let (tx2, _rx2) = tokio::sync::mpsc::channel(SEND_QUEUE_DEPTH);
        hub.register(1, "alice".into(), tx1).await;
        hub.register(1, "alice".into(), tx2).await;
        drop(hub);
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn join_then_ready_from_four_seats_starts_a_round() {
        let hub = Hub::new();
        for uid in 1..=4i64 {
            let (tx, _rx) = tokio::sync::mpsc::channel(SEND_QUEUE_DEPTH);
            hub.register(uid, format!("p{uid}"), tx).await;
        }
        for uid in 1..=4i64 {
            Arc::clone(&hub).dispatch(uid, r#"{"type":"join_room","payload":{"room_id":1}}"#).await;
        }
        for uid in 1..=4i64 {
            Arc::clone(&hub).dispatch(uid, r#"{"type":"ready","payload":{}}"#).await;
        }
        let rooms = hub.list_rooms().await;
        assert_eq!(rooms[0].phase, RoomPhase::Playing);
    }

    #[tokio::test]
    async fn a_settlement_dispatch_is_handed_to_the_configured_sink() {
        struct CapturingSink(std::sync::Mutex<Vec<(RoomId, Chips)>>);
        impl SettlementSink for CapturingSink {
            fn record(&self, room_id: RoomId, results: &[SettlementResult]) {
                let total: Chips = results.iter().map(|r| r.gold_delta).sum();
                self.0.lock().unwrap().push((room_id, total));
            }
        }

        let captured = Arc::new(CapturingSink(std::sync::Mutex::new(Vec::new())));
        let hub = Hub::with_sink(captured.clone());
        let outcome = engine::Outcome {
            dispatches: vec![engine::Dispatch {
                to: Recipient::All,
                message: ServerMessage::Settlement {
                    winner: 0,
                    total_pot: 100,
                    server_fee: 10,
                    results: vec![SettlementResult {
                        seat: 0,
                        user_id: 1,
                        username: "alice".into(),
                        cards_left: 0,
                        twos_held: 0,
                        penalty_multiplier: 0,
                        gold_delta: 90,
                        is_bot: false,
                    }],
                },
            }],
            timer: None,
            event: Event::RoomReset,
        };

        Arc::clone(&hub).apply(1, outcome).await;
        assert_eq!(captured.0.lock().unwrap().as_slice(), &[(1, 90)]);
    }
}
