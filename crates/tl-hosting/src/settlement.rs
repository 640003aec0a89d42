use tl_core::RoomId;
use tl_gameroom::SettlementResult;

/// The persistence boundary for settlement outcomes. Applying gold
/// deltas to a durable balance store is an external collaborator's
/// job — this trait is the seam a real implementation (a Postgres
/// repository, say) would sit behind. The hub only ever calls `record`;
/// it never assumes one is wired, which is why `Hub::new` defaults to
/// `LoggingSink` rather than requiring a caller to supply one.
pub trait SettlementSink: Send + Sync {
    fn record(&self, room_id: RoomId, results: &[SettlementResult]);
}

/// Default sink: logs the settlement and keeps no record. Matches the
/// documented non-goal of balance persistence — gold deltas are computed
/// and broadcast, but nothing durable backs them unless a real sink is
/// wired in its place.
pub struct LoggingSink;

impl SettlementSink for LoggingSink {
    fn record(&self, room_id: RoomId, results: &[SettlementResult]) {
        for result in results {
            log::info!(
                "[room {room_id}] settlement: seat {} ({}) delta {}",
                result.seat,
                result.username,
                result.gold_delta,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_sink_does_not_panic_on_an_empty_settlement() {
        LoggingSink.record(1, &[]);
    }
}
