use std::time::Duration;

use tl_cards::{beats, classify, enumerate_beats, owns, remove, Card, Combination, Standing};
use tl_core::{Chips, Seat, SEATS, SERVER_FEE_DENOM, SETTLEMENT_RESET_SECS, TURN_TIMEOUT_SECS};

use crate::error::EngineError;
use crate::event::Event;
use crate::message::{ServerMessage, SettlementResult, TablePlayView};
use crate::room::{PlayerInfo, Player, Room, RoomPhase, TablePlay};

/// Who a dispatch is addressed to. The hub resolves this against its own
/// connection registry (`Table`) — the engine only decides, it never
/// touches a socket.
#[derive(Debug, Clone, Copy)]
pub enum Recipient {
    Seat(Seat),
    Spectators,
    All,
}

#[derive(Debug, Clone)]
pub struct Dispatch {
    pub to: Recipient,
    pub message: ServerMessage,
}

/// A timer action the hub must schedule. The engine decides when a timer
/// should be (re)armed or cancelled; actually sleeping is the hub's job
/// since only it owns a `tokio::time::sleep` task per room.
#[derive(Debug, Clone, Copy)]
pub enum TimerAction {
    ArmTurn(Seat, Duration),
    CancelTurn,
    ArmSettlementReset(Duration),
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub dispatches: Vec<Dispatch>,
    pub timer: Option<TimerAction>,
    pub event: Event,
}

impl Outcome {
    fn new(event: Event) -> Self {
        Self {
            dispatches: Vec::new(),
            timer: None,
            event,
        }
    }

    fn with(mut self, to: Recipient, message: ServerMessage) -> Self {
        self.dispatches.push(Dispatch { to, message });
        self
    }

    fn timered(mut self, action: TimerAction) -> Self {
        self.timer = Some(action);
        self
    }
}

fn room_update(room: &Room) -> ServerMessage {
    let info = room.to_info();
    ServerMessage::RoomUpdate {
        id: info.id,
        name: info.name,
        ante_amount: info.ante_amount,
        phase: info.phase,
        player_count: info.player_count,
        spectator_count: info.spectator_count,
        has_bots: info.has_bots,
    }
}

fn player_infos(room: &Room) -> Vec<PlayerInfo> {
    room.players.iter().flatten().map(Player::to_info).collect()
}

fn table_play_view(room: &Room) -> Option<TablePlayView> {
    room.table_play.as_ref().map(|tp| TablePlayView {
        player_index: tp.player_index,
        cards: tp.cards.iter().map(|&c| c.into()).collect(),
        combo_type: tp.combo,
    })
}

fn game_state(room: &Room) -> ServerMessage {
    ServerMessage::GameState {
        room_id: room.id,
        phase: room.phase,
        current_turn: room.current_turn,
        players: player_infos(room),
        table_play: table_play_view(room),
        ante_amount: room.ante_amount,
    }
}

fn standing(room: &Room) -> Option<Standing> {
    room.table_play.as_ref().map(|tp| Standing {
        cards: tp.cards.clone(),
        combo: tp.combo,
    })
}

/// `join_room`: seats the player if the table is open and in lobby,
/// otherwise adds them as a spectator up to the spectator cap.
pub fn handle_join_room(room: &mut Room, user_id: i64, username: &str) -> Result<Outcome, EngineError> {
    if room.phase == RoomPhase::Lobby && room.player_count() < SEATS {
        let seat = room.find_empty_seat().expect("lobby with an open seat");
        room.players[seat] = Some(Player::new(user_id, username, seat, false));
        if room.human_player_count() == 1 && room.waiting_since.is_none() {
            room.waiting_since = Some(std::time::Instant::now());
        }
        return Ok(Outcome::new(Event::RoomUpdated).with(Recipient::All, room_update(room)));
    }

    if room.add_spectator(user_id, username) {
        return Ok(Outcome::new(Event::SpectatorJoined).with(Recipient::All, room_update(room)));
    }

    Err(EngineError::RoomFull)
}

/// `leave_room`: vacates a seat or removes a spectator. A seat vacated
/// mid-round knocks the room back to lobby — Tien Len needs all four
/// seats to continue, so a missing player ends the round for everyone.
pub fn handle_leave_room(room: &mut Room, user_id: i64) -> Outcome {
    if let Some(seat) = room.find_player_by_user_id(user_id) {
        room.players[seat] = None;
        if room.phase != RoomPhase::Lobby {
            room.reset_to_lobby();
        }
        Outcome::new(Event::PlayerLeft { seat }).with(Recipient::All, room_update(room))
    } else {
        room.remove_spectator(user_id);
        Outcome::new(Event::SpectatorLeft).with(Recipient::All, room_update(room))
    }
}

/// `ready`: toggles a seated player's readiness; once all four seats are
/// ready the round deals itself in.
pub fn handle_ready(room: &mut Room, user_id: i64) -> Result<Outcome, EngineError> {
    let seat = room
        .find_player_by_user_id(user_id)
        .ok_or(EngineError::RoomNotFound)?;
    {
        let player = room.players[seat].as_mut().expect("seat occupied");
        player.is_ready = !player.is_ready;
    }

    if room.all_players_ready() {
        return Ok(start_game(room));
    }
    Ok(Outcome::new(Event::RoomUpdated).with(Recipient::All, room_update(room)))
}

fn start_game(room: &mut Room) -> Outcome {
    let hands = tl_cards::Deck::new().deal_four_hands();
    let mut first_player = 0;
    for (seat, hand) in hands.iter().enumerate() {
        if hand.iter().any(|c| *c == Card::three_of_spades()) {
            first_player = seat;
        }
    }

    room.phase = RoomPhase::Dealing;
    for (seat, hand) in hands.iter().enumerate() {
        if let Some(player) = room.players[seat].as_mut() {
            player.hand = hand.clone();
            player.is_ready = false;
        }
    }
    room.phase = RoomPhase::Playing;
    room.current_turn = Some(first_player);
    room.table_play = None;
    room.pass_count = 0;
    room.winner = None;
    room.waiting_since = None;

    let mut outcome = Outcome::new(Event::GameStarted {
        hands: hands.clone(),
        first_player,
    });

    for seat in 0..SEATS {
        if let Some(player) = &room.players[seat] {
            let msg = ServerMessage::CardDealt {
                room_id: room.id,
                phase: room.phase,
                current_turn: room.current_turn,
                hand: player.hand.iter().map(|&c| c.into()).collect(),
                players: player_infos(room),
                table_play: None,
                ante_amount: room.ante_amount,
            };
            outcome = outcome.with(Recipient::Seat(seat), msg);
        }
    }
    if !room.spectators.is_empty() {
        outcome = outcome.with(Recipient::Spectators, game_state(room));
    }

    outcome.timered(TimerAction::ArmTurn(first_player, Duration::from_secs(TURN_TIMEOUT_SECS)))
}

/// `play_cards`: validates phase, turn, ownership and the beat relation,
/// then removes the cards from the hand and advances play.
pub fn handle_play_cards(room: &mut Room, user_id: i64, cards: &[Card]) -> Result<Outcome, EngineError> {
    if room.phase != RoomPhase::Playing {
        return Err(EngineError::WrongPhase("the game hasn't started yet"));
    }
    let seat = room
        .find_player_by_user_id(user_id)
        .ok_or(EngineError::RoomNotFound)?;
    if room.current_turn != Some(seat) {
        return Err(EngineError::NotYourTurn);
    }

    let hand = &room.players[seat].as_ref().expect("seat occupied").hand;
    if !owns(hand, cards) {
        return Err(EngineError::NotOwned);
    }
    let combo = classify(cards).ok_or(EngineError::InvalidCombination)?;

    let table = standing(room);
    if !beats(table.as_ref(), cards, combo) {
        return Err(EngineError::CannotBeat);
    }

    let remaining = remove(hand, cards);
    let hand_emptied = remaining.is_empty();
    room.players[seat].as_mut().expect("seat occupied").hand = remaining;
    room.table_play = Some(TablePlay {
        player_index: seat,
        cards: cards.to_vec(),
        combo,
    });
    room.pass_count = 0;

    let move_msg = ServerMessage::MovePlayed {
        player_index: seat,
        cards: cards.iter().map(|&c| c.into()).collect(),
        combo_type: combo,
    };
    let mut outcome = Outcome::new(Event::CardsPlayed {
        seat,
        cards: cards.to_vec(),
        combo,
    })
    .with(Recipient::All, move_msg);

    if hand_emptied {
        outcome.dispatches.extend(end_game(room, seat).dispatches);
        outcome.timer = Some(TimerAction::CancelTurn);
        return Ok(outcome);
    }

    let advance = advance_turn(room);
    outcome.dispatches.extend(advance.dispatches);
    outcome.timer = advance.timer;
    Ok(outcome)
}

/// `pass_turn`: only legal while a standing play exists on the table and
/// it isn't this seat's own play to pass on. A full round of three passes
/// clears the table back to an open lead.
pub fn handle_pass_turn(room: &mut Room, user_id: i64) -> Result<Outcome, EngineError> {
    if room.phase != RoomPhase::Playing {
        return Err(EngineError::WrongPhase("the game hasn't started yet"));
    }
    let seat = room
        .find_player_by_user_id(user_id)
        .ok_or(EngineError::RoomNotFound)?;
    if room.current_turn != Some(seat) {
        return Err(EngineError::NotYourTurn);
    }
    let Some(table) = &room.table_play else {
        return Err(EngineError::MustLead);
    };
    if table.player_index == seat {
        return Err(EngineError::CannotPassOwn);
    }

    room.pass_count += 1;
    if room.pass_count >= 3 {
        room.table_play = None;
        room.pass_count = 0;
    }

    let mut outcome = Outcome::new(Event::TurnPassed { seat });
    let advance = advance_turn(room);
    outcome.dispatches.extend(advance.dispatches);
    outcome.timer = advance.timer;
    Ok(outcome)
}

/// Fired by the hub's turn timer once a seat's 30s clock runs out.
/// Unconditional, unlike `handle_pass_turn`: an AFK leader (table clear,
/// nothing to pass on) is force-passed the same as anyone else, rather
/// than rejected with `MustLead` — the caller has already re-verified
/// `current_turn == seat` under the room lock, so this never fails.
pub fn handle_turn_timeout(room: &mut Room, seat: Seat) -> Outcome {
    room.pass_count += 1;
    if room.pass_count >= 3 {
        room.table_play = None;
        room.pass_count = 0;
    }

    let timeout_msg = ServerMessage::TurnChange {
        current_turn: None,
        table_clear: None,
        action: Some("timeout"),
        player_index: Some(seat),
    };
    let mut outcome = Outcome::new(Event::TurnPassed { seat }).with(Recipient::All, timeout_msg);
    let advance = advance_turn(room);
    outcome.dispatches.extend(advance.dispatches);
    outcome.timer = advance.timer;
    outcome
}

/// Moves `current_turn` to the next occupied, non-empty-handed seat. If
/// that seat already owns the standing play (everyone else passed on
/// them), the table clears for a fresh lead.
fn advance_turn(room: &mut Room) -> Outcome {
    let Some(current) = room.current_turn else {
        return Outcome::new(Event::RoomUpdated);
    };

    let mut next = current;
    for _ in 0..SEATS {
        next = (next + 1) % SEATS;
        let occupied_and_in_hand = matches!(&room.players[next], Some(p) if !p.hand.is_empty());
        if occupied_and_in_hand {
            break;
        }
    }

    let table_cleared = matches!(&room.table_play, Some(tp) if tp.player_index == next);
    if table_cleared {
        room.table_play = None;
        room.pass_count = 0;
    }
    room.current_turn = Some(next);

    let msg = ServerMessage::TurnChange {
        current_turn: Some(next),
        table_clear: Some(table_cleared),
        action: None,
        player_index: None,
    };

    Outcome::new(Event::TurnAdvanced {
        current_turn: next,
        table_cleared,
    })
    .with(Recipient::All, msg)
    .timered(TimerAction::ArmTurn(next, Duration::from_secs(TURN_TIMEOUT_SECS)))
}

fn count_twos(hand: &[Card]) -> usize {
    hand.iter().filter(|c| c.rank() == tl_cards::Rank::Two).count()
}

/// Settlement penalty multiplier for a losing seat: holding all four twos
/// (and nobody could chop them) is the worst outcome, an untouched
/// 13-card hand is the next worst, any single two held is mild, and a
/// clean hand carries no penalty. These do not stack — the highest
/// applicable multiplier wins.
fn dead_pig_multiplier(hand: &[Card]) -> Chips {
    if count_twos(hand) == 4 {
        4
    } else if hand.len() == 13 {
        3
    } else if count_twos(hand) > 0 {
        2
    } else {
        1
    }
}

fn end_game(room: &mut Room, winner: Seat) -> Outcome {
    room.phase = RoomPhase::Settlement;
    room.winner = Some(winner);

    let ante = room.ante_amount;
    let mut total_pot: Chips = 0;
    let mut results = Vec::new();
    for seat in 0..SEATS {
        let Some(player) = &room.players[seat] else { continue };
        let is_winner = seat == winner;
        let multiplier = if is_winner { 0 } else { dead_pig_multiplier(&player.hand) };
        let loser_pays = ante * multiplier;
        total_pot += loser_pays;
        results.push((seat, player.user_id, player.username.clone(), player.hand.len(), count_twos(&player.hand), multiplier, player.is_bot));
    }
    let server_fee = total_pot / SERVER_FEE_DENOM;
    let winner_receives = total_pot - server_fee;

    let results = results
        .into_iter()
        .map(|(seat, user_id, username, cards_left, twos_held, multiplier, is_bot)| {
            let gold_delta = if seat == winner { winner_receives } else { -(ante * multiplier) };
            SettlementResult {
                seat,
                user_id,
                username,
                cards_left,
                twos_held,
                penalty_multiplier: multiplier,
                gold_delta,
                is_bot,
            }
        })
        .collect();

    let msg = ServerMessage::Settlement {
        winner,
        total_pot,
        server_fee,
        results,
    };

    Outcome::new(Event::RoundSettled { winner })
        .with(Recipient::All, msg)
        .timered(TimerAction::ArmSettlementReset(Duration::from_secs(SETTLEMENT_RESET_SECS)))
}

/// Fired by the hub's settlement-reset timer once it has confirmed the
/// generation is still current. Clears the table back to an open lobby.
pub fn handle_settlement_reset(room: &mut Room) -> Outcome {
    room.reset_to_lobby();
    Outcome::new(Event::RoomReset).with(Recipient::All, room_update(room))
}

/// `chat`: relayed verbatim, no room-state mutation.
pub fn handle_chat(sender: &str, message: &str) -> Outcome {
    Outcome::new(Event::ChatRelayed {
        sender: sender.to_string(),
        message: message.to_string(),
    })
    .with(
        Recipient::All,
        ServerMessage::ChatRelay {
            message: message.to_string(),
            sender: sender.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_cards::{Rank, Suit};

    fn seat_four(room: &mut Room) {
        for i in 0..4 {
            room.players[i] = Some(Player::new(i as i64, format!("p{i}"), i, false));
        }
    }

    #[test]
    fn ready_from_all_four_seats_deals_a_round() {
        let mut room = Room::new(1, "Room 1 (100G)", 100);
        seat_four(&mut room);
        room.waiting_since = Some(std::time::Instant::now());
        for i in 0..3 {
            handle_ready(&mut room, i as i64).unwrap();
            assert_eq!(room.phase, RoomPhase::Lobby);
        }
        handle_ready(&mut room, 3).unwrap();
        assert_eq!(room.phase, RoomPhase::Playing);
        assert!(room.current_turn.is_some());
        assert!(room.waiting_since.is_none());
        for seat in 0..4 {
            let player = room.players[seat].as_ref().unwrap();
            assert_eq!(player.hand.len(), 13);
            assert!(!player.is_ready);
        }
    }

    #[test]
    fn three_of_spades_holder_leads() {
        let mut room = Room::new(1, "Room 1 (100G)", 100);
        seat_four(&mut room);
        for i in 0..4 {
            handle_ready(&mut room, i as i64).unwrap();
        }
        let leader = room.current_turn.unwrap();
        assert!(room.players[leader]
            .as_ref()
            .unwrap()
            .hand
            .contains(&Card::three_of_spades()));
    }

    #[test]
    fn play_cards_out_of_turn_is_rejected() {
        let mut room = Room::new(1, "Room 1 (100G)", 100);
        seat_four(&mut room);
        for i in 0..4 {
            handle_ready(&mut room, i as i64).unwrap();
        }
        let not_turn = (room.current_turn.unwrap() + 1) % 4;
        let card = room.players[not_turn].as_ref().unwrap().hand[0];
        let err = handle_play_cards(&mut room, not_turn as i64, &[card]).unwrap_err();
        assert_eq!(err, EngineError::NotYourTurn);
    }

    #[test]
    fn pass_on_own_standing_play_is_rejected() {
        let mut room = Room::new(1, "Room 1 (100G)", 100);
        seat_four(&mut room);
        for i in 0..4 {
            handle_ready(&mut room, i as i64).unwrap();
        }
        let leader = room.current_turn.unwrap();
        let lead_card = *room.players[leader]
            .as_ref()
            .unwrap()
            .hand
            .iter()
            .find(|c| **c == Card::three_of_spades())
            .unwrap();
        handle_play_cards(&mut room, leader as i64, &[lead_card]).unwrap();
        let err = handle_pass_turn(&mut room, leader as i64).unwrap_err();
        assert_eq!(err, EngineError::CannotPassOwn);
    }

    #[test]
    fn turn_timeout_force_passes_an_afk_leader() {
        // A leader (table clear) has nothing to pass on, so
        // `handle_pass_turn` would reject this with `MustLead` — the
        // dedicated timeout path must advance the turn anyway.
        let mut room = Room::new(1, "Room 1 (100G)", 100);
        seat_four(&mut room);
        for i in 0..4 {
            handle_ready(&mut room, i as i64).unwrap();
        }
        let leader = room.current_turn.unwrap();
        assert!(room.table_play.is_none());

        let outcome = handle_turn_timeout(&mut room, leader);
        assert_ne!(room.current_turn, Some(leader));
        let timeout_msg = outcome
            .dispatches
            .iter()
            .find_map(|d| match &d.message {
                ServerMessage::TurnChange { action: Some("timeout"), player_index, .. } => {
                    Some(*player_index)
                }
                _ => None,
            })
            .expect("expected a timeout turn_change dispatch");
        assert_eq!(timeout_msg, Some(leader));
    }

    #[test]
    fn turn_timeout_on_a_standing_play_still_advances() {
        let mut room = Room::new(1, "Room 1 (100G)", 100);
        seat_four(&mut room);
        for i in 0..4 {
            handle_ready(&mut room, i as i64).unwrap();
        }
        let leader = room.current_turn.unwrap();
        let lead_card = *room.players[leader]
            .as_ref()
            .unwrap()
            .hand
            .iter()
            .find(|c| **c == Card::three_of_spades())
            .unwrap();
        handle_play_cards(&mut room, leader as i64, &[lead_card]).unwrap();
        let next = room.current_turn.unwrap();

        handle_turn_timeout(&mut room, next);
        assert_eq!(room.pass_count, 1);
        assert!(room.table_play.is_some());
        assert_ne!(room.current_turn, Some(next));
    }

    #[test]
    fn dead_pig_multiplier_ranks_from_worst_to_clean() {
        let all_twos = vec![
            Card::new(Rank::Two, Suit::Spades),
            Card::new(Rank::Two, Suit::Clubs),
            Card::new(Rank::Two, Suit::Diamonds),
            Card::new(Rank::Two, Suit::Hearts),
        ];
        assert_eq!(dead_pig_multiplier(&all_twos), 4);
        assert_eq!(dead_pig_multiplier(&vec![Card::new(Rank::Three, Suit::Spades); 13]), 3);
        assert_eq!(dead_pig_multiplier(&[Card::new(Rank::Two, Suit::Spades)]), 2);
        assert_eq!(dead_pig_multiplier(&[Card::new(Rank::Three, Suit::Spades)]), 1);
    }

    #[test]
    fn settlement_fee_is_ten_percent_of_the_pot() {
        let mut room = Room::new(1, "Room 1 (100G)", 100);
        seat_four(&mut room);
        room.players[1].as_mut().unwrap().hand = vec![Card::new(Rank::Three, Suit::Spades)];
        room.players[2].as_mut().unwrap().hand = vec![Card::new(Rank::Four, Suit::Spades)];
        room.players[3].as_mut().unwrap().hand = vec![Card::new(Rank::Five, Suit::Spades)];
        let outcome = end_game(&mut room, 0);
        match &outcome.dispatches[0].message {
            ServerMessage::Settlement { total_pot, server_fee, .. } => {
                assert_eq!(*total_pot, 300);
                assert_eq!(*server_fee, 30);
            }
            _ => panic!("expected settlement message"),
        }
    }
}
