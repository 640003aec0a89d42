use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tl_core::{
    RoomId, ANTE_TIERS, BOT_AUTOFILL_INTERVAL_SECS, BOT_AUTOFILL_WAIT_SECS, BOT_AUTO_READY_MS,
    BOT_DEDICATED_ROOMS_PER_ANTE, BOT_DEDICATED_ROOM_SIZE,
};
use tl_gameroom::players::bot::BotPlayer;
use tl_gameroom::players::bot::{Difficulty, BOT_NAMES};
use tl_gameroom::RoomPhase;

use crate::hub::Hub;

/// Negative, monotonically decreasing bot identity space — disjoint from
/// any real (positive) user id issued by the credential layer.
static NEXT_BOT_ID: AtomicI64 = AtomicI64::new(-1);

fn next_bot_id() -> i64 {
    NEXT_BOT_ID.fetch_sub(1, Ordering::SeqCst)
}

fn bot_name(id: i64) -> String {
    let idx = (id.unsigned_abs() as usize - 1) % BOT_NAMES.len();
    BOT_NAMES[idx].to_string()
}

/// Seeds a handful of always-bots-present rooms per ante tier at startup,
/// and periodically tops up lobbies that have been waiting on a human
/// with nobody joining. Dedicated rooms give new players something to
/// join immediately; auto-fill rescues a lone human after a wait
/// threshold rather than leaving them stranded in an empty lobby.
pub struct BotManager {
    hub: Arc<Hub>,
}

impl BotManager {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }

    pub async fn run(self) {
        self.setup_dedicated_rooms().await;
        let mut ticker = tokio::time::interval(Duration::from_secs(BOT_AUTOFILL_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            self.autofill_rooms().await;
        }
    }

    async fn setup_dedicated_rooms(&self) {
        for &ante in ANTE_TIERS.iter() {
            let rooms = self.hub.list_rooms().await;
            let mut taken = 0;
            for room in rooms {
                if taken >= BOT_DEDICATED_ROOMS_PER_ANTE {
                    break;
                }
                if room.ante_amount != ante || room.phase != RoomPhase::Lobby || room.player_count > 0 {
                    continue;
                }
                self.add_bots_to_room(room.id, BOT_DEDICATED_ROOM_SIZE).await;
                taken += 1;
            }
        }
    }

    async fn add_bots_to_room(&self, room_id: RoomId, count: usize) {
        for _ in 0..count {
            let id = next_bot_id();
            let bot = Arc::new(BotPlayer::new(id, bot_name(id), Difficulty::random()));
            if self.hub.seat_bot(room_id, Arc::clone(&bot)).await.is_err() {
                break;
            }
            let hub = Arc::clone(&self.hub);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(BOT_AUTO_READY_MS)).await;
                hub.dispatch(bot.user_id, r#"{"type":"ready","payload":{}}"#).await;
            });
        }
    }

    /// Tops up a lobby that has a lone human waiting past the threshold
    /// and isn't already a dedicated bot room, bringing it up to four.
    async fn autofill_rooms(&self) {
        let stale = self
            .hub
            .rooms_needing_autofill(Duration::from_secs(BOT_AUTOFILL_WAIT_SECS))
            .await;
        for (room_id, missing) in stale {
            self.add_bots_to_room(room_id, missing).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_ids_are_negative_and_decreasing() {
        let a = next_bot_id();
        let b = next_bot_id();
        assert!(a < 0);
        assert!(b < a);
    }

    #[test]
    fn bot_names_cycle_through_the_pool() {
        let names: Vec<String> = (1..=BOT_NAMES.len() as i64 + 3)
            .map(|i| bot_name(-i))
            .collect();
        assert_eq!(names[0], names[BOT_NAMES.len()]);
    }
}
