use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use tl_core::{Chips, MATCHMAKING_TICK_SECS};
use tl_gameroom::ServerMessage;

use crate::hub::Hub;

/// A thin producer of "seat this client into a room of ante A" requests.
/// The queue itself — wait lists plus a periodic retry tick — is the
/// entire surface this crate owns; a shared occupancy store backing
/// cross-instance matchmaking would be an external collaborator, not
/// core logic.
#[derive(Debug, Clone, Copy)]
pub struct MatchRequest {
    pub user_id: i64,
    pub ante_level: Chips,
}

/// Periodically tries to seat queued `auto_match` requests into an open
/// room at their requested ante: a bounded incoming queue plus a ticking
/// reconciliation pass. No occupancy-tracking side-channel backs this —
/// there's nothing upstream of the in-process wait lists to invoke it.
pub struct MatchmakingService {
    hub: Arc<Hub>,
    rx: UnboundedReceiver<MatchRequest>,
    wait_lists: HashMap<Chips, Vec<i64>>,
}

impl MatchmakingService {
    pub fn new(hub: Arc<Hub>, rx: UnboundedReceiver<MatchRequest>) -> Self {
        Self {
            hub,
            rx,
            wait_lists: HashMap::new(),
        }
    }

    pub async fn run(mut self) {
        log::info!("matchmaking service started");
        let mut ticker = tokio::time::interval(Duration::from_secs(MATCHMAKING_TICK_SECS));
        loop {
            tokio::select! {
                req = self.rx.recv() => match req {
                    Some(req) => self.enqueue(req),
                    None => return,
                },
                _ = ticker.tick() => self.process_wait_lists().await,
            }
        }
    }

    fn enqueue(&mut self, req: MatchRequest) {
        self.wait_lists.entry(req.ante_level).or_default().push(req.user_id);
    }

    async fn process_wait_lists(&mut self) {
        for (&ante, waiters) in self.wait_lists.iter_mut() {
            let mut remaining = Vec::with_capacity(waiters.len());
            for user_id in waiters.drain(..) {
                if self.hub.is_in_room(user_id).await {
                    // Seated by some other path (e.g. manual join_room)
                    // since being queued; drop the stale request.
                    continue;
                }
                let Some(room_id) = self.hub.find_open_room(ante).await else {
                    remaining.push(user_id);
                    continue;
                };
                if Arc::clone(&self.hub).join_room(user_id, room_id).await.is_err() {
                    remaining.push(user_id);
                    continue;
                }
                let (name, seat) = tokio::join!(
                    self.hub.room_name(room_id),
                    self.hub.seat_of(room_id, user_id),
                );
                if let (Some(room_name), Some(seat)) = (name, seat) {
                    self.hub
                        .send_message(
                            user_id,
                            &ServerMessage::MatchFound {
                                room_id,
                                room_name,
                                seat,
                            },
                        )
                        .await;
                }
            }
            *waiters = remaining;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_request_seats_once_a_room_opens() {
        let hub = Hub::new();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        hub.set_matchmaker(tx.clone()).await;
        let (client_tx, mut client_rx) = tokio::sync::mpsc::channel(tl_core::SEND_QUEUE_DEPTH);
        hub.register(7, "alice".into(), client_tx).await;

        let mut service = MatchmakingService::new(Arc::clone(&hub), rx);
        tx.send(MatchRequest { user_id: 7, ante_level: 100 }).unwrap();
        // Drain exactly one queued request without running the full
        // ticker loop, so the test doesn't depend on wall-clock timing.
        if let Some(req) = service.rx.recv().await {
            service.enqueue(req);
        }
        service.process_wait_lists().await;

        assert!(hub.is_in_room(7).await);
        let frame = client_rx.try_recv().unwrap();
        assert!(frame.contains("match_found"));
    }
}
