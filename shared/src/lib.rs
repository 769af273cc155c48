use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const MAP_SIZE: f32 = 3000.0;

pub const PLAYER_RADIUS: f32 = 20.0;
pub const PLAYER_MAX_HP: f32 = 100.0;
pub const PLAYER_SPEED: f32 = 400.0;
pub const PLAYER_FIRE_COOLDOWN: f32 = 0.25;

pub const BULLET_RADIUS: f32 = 3.0;
pub const BULLET_SPEED: f32 = 800.0;
pub const BULLET_DAMAGE: f32 = 10.0;

pub const SCORE_BULLET_HIT: f32 = 20.0;
pub const SCORE_PER_SECOND: f32 = 1.0;

/// Entities further than this from a player are left out of its snapshot.
pub const VIEW_RADIUS: f32 = MAP_SIZE / 2.0;
pub const LEADERBOARD_SIZE: usize = 5;

/// How far behind the reconstructed server clock the client renders.
pub const RENDER_DELAY_MS: u64 = 100;

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_USERNAME_LEN: usize = 16;
/// Largest payload a single UDP datagram can carry.
pub const MAX_PACKET_SIZE: usize = 65_507;

pub type ClientId = u32;
pub type EntityId = u32;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    JoinGame {
        username: String,
    },
    Input {
        direction: f32,
    },
    Heartbeat,
    Disconnect,

    Connected {
        client_id: ClientId,
    },
    Update(GameUpdate),
    GameOver,
    Disconnected {
        reason: String,
    },
}

/// Wire state of any moving object.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ObjectUpdate {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub direction: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct PlayerUpdate {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub direction: f32,
    pub hp: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: u32,
}

/// Personalized snapshot of the world, built once per recipient per broadcast.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GameUpdate {
    /// Server wall-clock time in epoch milliseconds.
    pub t: u64,
    pub me: PlayerUpdate,
    pub others: Vec<PlayerUpdate>,
    pub bullets: Vec<ObjectUpdate>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

pub fn encode_packet(packet: &Packet) -> Result<Vec<u8>, bincode::Error> {
    bincode::serialize(packet)
}

pub fn decode_packet(data: &[u8]) -> Result<Packet, bincode::Error> {
    bincode::deserialize(data)
}

/// Current wall-clock time in milliseconds since the unix epoch.
pub fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

/// Rejects directions that would poison the simulation (NaN, infinities).
pub fn sanitize_direction(direction: f32) -> Option<f32> {
    if direction.is_finite() {
        Some(direction)
    } else {
        None
    }
}

pub fn sanitize_username(username: &str) -> String {
    let trimmed: String = username.trim().chars().take(MAX_USERNAME_LEN).collect();
    if trimmed.is_empty() {
        "Anonymous".to_string()
    } else {
        trimmed
    }
}
