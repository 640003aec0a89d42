use std::sync::Arc;

use tokio::sync::mpsc::Receiver;

use tl_core::SEND_QUEUE_DEPTH;

use crate::hub::Hub;

/// Registers a newly authenticated connection and returns the receiver
/// half the per-connection bridge task should drain onto the socket.
pub async fn connect(
    hub: &Arc<Hub>,
    user_id: i64,
    username: String,
) -> Receiver<String> {
    let (sender, receiver) = tokio::sync::mpsc::channel(SEND_QUEUE_DEPTH);
    hub.register(user_id, username, sender).await;
    receiver
}

/// Feeds one inbound text frame from the socket into the hub's dispatch
/// path. Called once per message the reader loop receives.
pub async fn on_message(hub: &Arc<Hub>, user_id: i64, raw: &str) {
    Arc::clone(hub).dispatch(user_id, raw).await;
}

/// Called when the reader loop observes the socket close.
pub async fn on_disconnect(hub: &Arc<Hub>, user_id: i64) {
    Arc::clone(hub).unregister(user_id).await;
}
