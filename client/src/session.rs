//! Connection and game lifecycle as seen by the client
//!
//! Lifecycle packets travel as single datagrams, so any of them can be lost.
//! The session resends `Connect` and `JoinGame` until the server answers, and
//! treats a long silence while playing as the end of the game.

use log::{info, warn};
use shared::{Packet, PROTOCOL_VERSION};
use std::time::{Duration, Instant};

/// Delay between `Connect` attempts while waiting for `Connected`.
pub const CONNECT_RETRY: Duration = Duration::from_secs(1);
/// Delay between `JoinGame` attempts while waiting for the first `Update`.
pub const JOIN_RETRY: Duration = Duration::from_millis(500);
/// Silence after which a running game is considered over.
pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Connecting,
    Menu,
    /// `JoinGame` sent, no snapshot yet.
    Joining,
    Playing,
    GameOver,
    Disconnected(String),
}

pub struct Session {
    phase: Phase,
    username: String,
    last_sent: Instant,
    last_update: Instant,
}

impl Session {
    /// Starts in `Connecting`; the transport has just sent the first `Connect` at `now`.
    pub fn new(username: String, now: Instant) -> Self {
        Self {
            phase: Phase::Connecting,
            username,
            last_sent: now,
            last_update: now,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn on_connected(&mut self) {
        if self.phase == Phase::Connecting {
            self.phase = Phase::Menu;
        }
    }

    /// Records a snapshot arrival. Returns true if the snapshot should be buffered.
    pub fn on_update(&mut self, now: Instant) -> bool {
        match self.phase {
            Phase::Joining => {
                info!("Joined the game as {}", self.username);
                self.phase = Phase::Playing;
            }
            Phase::Playing => {}
            _ => return false,
        }

        self.last_update = now;
        true
    }

    pub fn on_game_over(&mut self) {
        if matches!(self.phase, Phase::Joining | Phase::Playing) {
            self.phase = Phase::GameOver;
        }
    }

    pub fn on_disconnected(&mut self, reason: String) {
        self.phase = Phase::Disconnected(reason);
    }

    /// Requests a (re)join from the menu or game-over screen.
    pub fn join(&mut self, now: Instant) -> Option<Packet> {
        if !matches!(self.phase, Phase::Menu | Phase::GameOver) {
            return None;
        }

        self.phase = Phase::Joining;
        self.last_sent = now;
        Some(self.join_packet())
    }

    /// Advances timers. Returns a packet to resend, if one is due.
    pub fn poll(&mut self, now: Instant) -> Option<Packet> {
        let since_sent = now.saturating_duration_since(self.last_sent);

        match self.phase {
            Phase::Connecting if since_sent >= CONNECT_RETRY => {
                self.last_sent = now;
                Some(Packet::Connect {
                    client_version: PROTOCOL_VERSION,
                })
            }
            Phase::Joining if since_sent >= JOIN_RETRY => {
                self.last_sent = now;
                Some(self.join_packet())
            }
            Phase::Playing
                if now.saturating_duration_since(self.last_update) >= UPDATE_TIMEOUT =>
            {
                warn!("No update for {:?}, assuming the game is over", UPDATE_TIMEOUT);
                self.phase = Phase::GameOver;
                None
            }
            _ => None,
        }
    }

    fn join_packet(&self) -> Packet {
        Packet::JoinGame {
            username: self.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn join_packet() -> Packet {
        Packet::JoinGame {
            username: "ace".to_string(),
        }
    }

    fn menu_session(start: Instant) -> Session {
        let mut session = Session::new("ace".to_string(), start);
        session.on_connected();
        session
    }

    #[test]
    fn test_connect_resent_until_connected() {
        let start = Instant::now();
        let mut session = Session::new("ace".to_string(), start);

        assert_eq!(session.poll(start + ms(500)), None);
        assert_eq!(
            session.poll(start + ms(1_000)),
            Some(Packet::Connect {
                client_version: PROTOCOL_VERSION
            })
        );
        assert_eq!(session.poll(start + ms(1_500)), None);

        session.on_connected();
        assert_eq!(session.phase(), &Phase::Menu);
        assert_eq!(session.poll(start + ms(5_000)), None);
    }

    #[test]
    fn test_join_resent_until_first_update() {
        let start = Instant::now();
        let mut session = menu_session(start);

        assert_eq!(session.join(start), Some(join_packet()));
        assert_eq!(session.phase(), &Phase::Joining);
        assert_eq!(session.poll(start + ms(499)), None);
        assert_eq!(session.poll(start + ms(500)), Some(join_packet()));
        assert_eq!(session.poll(start + ms(700)), None);
        assert_eq!(session.poll(start + ms(1_000)), Some(join_packet()));

        assert!(session.on_update(start + ms(1_100)));
        assert!(session.is_playing());
        assert_eq!(session.poll(start + ms(1_600)), None);
    }

    #[test]
    fn test_join_only_from_menu_or_game_over() {
        let start = Instant::now();
        let mut session = Session::new("ace".to_string(), start);
        assert_eq!(session.join(start), None);

        session.on_connected();
        assert!(session.join(start).is_some());
        assert_eq!(session.join(start), None);
    }

    #[test]
    fn test_silence_while_playing_ends_game() {
        let start = Instant::now();
        let mut session = menu_session(start);
        session.join(start);
        session.on_update(start + ms(100));

        assert!(session.on_update(start + ms(1_000)));
        assert_eq!(session.poll(start + ms(2_900)), None);
        assert!(session.is_playing());

        assert_eq!(session.poll(start + ms(3_000)), None);
        assert_eq!(session.phase(), &Phase::GameOver);

        // Late snapshots from the previous life are not buffered.
        assert!(!session.on_update(start + ms(3_100)));
        assert_eq!(session.join(start + ms(4_000)), Some(join_packet()));
    }

    #[test]
    fn test_game_over_packet() {
        let start = Instant::now();
        let mut session = menu_session(start);
        session.join(start);
        session.on_update(start);

        session.on_game_over();
        assert_eq!(session.phase(), &Phase::GameOver);

        // Duplicate notices are harmless.
        session.on_game_over();
        assert_eq!(session.phase(), &Phase::GameOver);
    }

    #[test]
    fn test_updates_ignored_outside_a_game() {
        let start = Instant::now();
        let mut session = menu_session(start);
        assert!(!session.on_update(start));
        assert_eq!(session.phase(), &Phase::Menu);
    }

    #[test]
    fn test_disconnect_is_terminal_for_timers() {
        let start = Instant::now();
        let mut session = menu_session(start);
        session.join(start);
        session.on_disconnected("Server full".to_string());

        assert_eq!(session.poll(start + ms(10_000)), None);
        assert_eq!(
            session.phase(),
            &Phase::Disconnected("Server full".to_string())
        );
    }
}
