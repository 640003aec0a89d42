//! Core type aliases and tuning constants shared across the Tien Len
//! workspace.

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Gold amounts: ante stakes, settlement deltas, server fees.
pub type Chips = i64;
/// Seat index around a table, 0..=3.
pub type Seat = usize;
/// Dense room identifier, starting at 1.
pub type RoomId = usize;

// ============================================================================
// TABLE PARAMETERS
// ============================================================================
/// Seats at a Tien Len table.
pub const SEATS: usize = 4;
/// Ante tiers a room can be configured with.
pub const ANTE_TIERS: [Chips; 3] = [100, 500, 1000];
/// Rooms pre-allocated per ante tier at startup (334, 334, 332 = 1000 total).
pub const ROOMS_PER_ANTE: [usize; 3] = [334, 334, 332];
/// Maximum spectators admitted into a single room.
pub const MAX_SPECTATORS: usize = 3;

/// Per-turn decision timeout.
pub const TURN_TIMEOUT_SECS: u64 = 30;
/// Delay between settlement broadcast and automatic reset to LOBBY.
pub const SETTLEMENT_RESET_SECS: u64 = 5;
/// Server's cut of the total pot at settlement (integer division).
pub const SERVER_FEE_DENOM: Chips = 10;

/// Bounded depth of each client's outbound send queue.
pub const SEND_QUEUE_DEPTH: usize = 256;
/// Interval between keepalive pings sent to an idle connection.
pub const WS_PING_INTERVAL_SECS: u64 = 54;
/// A connection that hasn't answered a ping within this long is considered
/// dead and dropped.
pub const WS_PONG_TIMEOUT_SECS: u64 = 60;
/// Deadline for a single outbound socket write; a write that can't
/// complete within this long indicates a stalled client and closes the
/// session rather than blocking the bridge task indefinitely.
pub const WS_WRITE_TIMEOUT_SECS: u64 = 10;
/// Largest text frame accepted from a client; longer frames close the
/// connection rather than being buffered or truncated.
pub const WS_MAX_FRAME_BYTES: usize = 4 * 1024;
/// Bot decision delay lower/upper bounds, in milliseconds.
pub const BOT_DECISION_DELAY_MS: (u64, u64) = (1000, 3000);
/// Delay before a freshly seated bot auto-readies.
pub const BOT_AUTO_READY_MS: u64 = 500;
/// Dedicated bot rooms set up per ante tier at startup.
pub const BOT_DEDICATED_ROOMS_PER_ANTE: usize = 10;
/// Bots seated in each dedicated bot room.
pub const BOT_DEDICATED_ROOM_SIZE: usize = 3;
/// Interval between auto-fill scans of lobby rooms.
pub const BOT_AUTOFILL_INTERVAL_SECS: u64 = 30;
/// How long a lobby must wait with a human seated before auto-fill kicks in.
pub const BOT_AUTOFILL_WAIT_SECS: u64 = 30;

/// Interval at which the matchmaking queue retries seating waiters.
pub const MATCHMAKING_TICK_SECS: u64 = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ante_tiers_match_room_pool_split() {
        assert_eq!(ANTE_TIERS.len(), ROOMS_PER_ANTE.len());
        assert_eq!(ROOMS_PER_ANTE.iter().sum::<usize>(), 1000);
    }
}
