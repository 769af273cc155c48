//! Authoritative simulation: owns every live player and bullet and advances them each tick

use crate::collisions::apply_collisions;
use crate::entity::{Bullet, GameObject, Player};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    timestamp_ms, ClientId, GameUpdate, LeaderboardEntry, LEADERBOARD_SIZE, VIEW_RADIUS,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Instant;

/// Ticks slower than this are logged; they are still simulated in full.
const LARGE_DELTA_WARNING: f32 = 0.1;

/// Decides which ticks carry a snapshot broadcast.
///
/// Phase follows tick parity, not wall-clock time: with an interval of 2 the
/// 2nd, 4th, 6th... ticks broadcast.
#[derive(Debug, Clone)]
pub struct BroadcastCadence {
    ticks_since_broadcast: u32,
    interval: u32,
}

impl BroadcastCadence {
    pub fn new(interval: u32) -> Self {
        Self {
            ticks_since_broadcast: 0,
            interval: interval.max(1),
        }
    }

    /// Registers a tick and reports whether it should broadcast.
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_broadcast += 1;
        if self.ticks_since_broadcast >= self.interval {
            self.ticks_since_broadcast = 0;
            true
        } else {
            false
        }
    }
}

/// Everything a tick wants delivered to connections, in delivery order.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Players killed this tick. They have already been removed.
    pub game_over: Vec<ClientId>,
    pub updates: Vec<(ClientId, GameUpdate)>,
}

pub struct Game {
    pub tick: u64,
    /// Keyed by owning connection; iteration order is the collision scan order.
    players: BTreeMap<ClientId, Player>,
    bullets: Vec<Bullet>,
    cadence: BroadcastCadence,
    last_update: Instant,
    rng: StdRng,
}

impl Game {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            tick: 0,
            players: BTreeMap::new(),
            bullets: Vec::new(),
            cadence: BroadcastCadence::new(snapshot_interval),
            last_update: Instant::now(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Spawns a player for a connection that has not joined yet.
    ///
    /// Returns false and leaves the existing player alone if the connection
    /// already controls one.
    pub fn add_player(&mut self, client_id: ClientId, username: String) -> bool {
        if self.players.contains_key(&client_id) {
            debug!("Client {} tried to join twice", client_id);
            return false;
        }

        let player = Player::spawn(client_id, username, &mut self.rng);
        info!(
            "Player {} ({}) joined at ({:.0}, {:.0})",
            client_id, player.username, player.body.x, player.body.y
        );
        self.players.insert(client_id, player);
        true
    }

    /// Drops the connection's player. Safe to call repeatedly.
    pub fn remove_player(&mut self, client_id: ClientId) -> bool {
        match self.players.remove(&client_id) {
            Some(player) => {
                info!("Removed player {} ({})", client_id, player.username);
                true
            }
            None => false,
        }
    }

    /// Points the connection's player in a new direction. Ignored if it has no player.
    pub fn handle_input(&mut self, client_id: ClientId, direction: f32) {
        if let Some(player) = self.player_mut(client_id) {
            player.body.direction = direction;
        }
    }

    pub fn is_joined(&self, client_id: ClientId) -> bool {
        self.players.contains_key(&client_id)
    }

    pub fn player(&self, client_id: ClientId) -> Option<&Player> {
        self.players.get(&client_id)
    }

    pub(crate) fn player_mut(&mut self, client_id: ClientId) -> Option<&mut Player> {
        self.players.get_mut(&client_id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn bullet_count(&self) -> usize {
        self.bullets.len()
    }

    /// Advances the world by the wall-clock time elapsed since the previous call.
    pub fn update(&mut self) -> TickReport {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f32();
        self.last_update = now;

        if dt > LARGE_DELTA_WARNING {
            warn!("Large delta time detected ({:.3}s)", dt);
        }

        self.tick(dt)
    }

    /// Advances the world by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        self.tick += 1;
        let mut report = TickReport::default();

        self.bullets.retain_mut(|bullet| !bullet.update(dt));

        for player in self.players.values_mut() {
            if let Some(bullet) = player.update(dt) {
                self.bullets.push(bullet);
            }
        }

        self.resolve_collisions();

        let dead: Vec<ClientId> = self
            .players
            .iter()
            .filter(|(_, player)| player.is_dead())
            .map(|(id, _)| *id)
            .collect();
        for client_id in dead {
            if let Some(player) = self.players.remove(&client_id) {
                info!(
                    "Player {} ({}) died with score {:.0}",
                    client_id, player.username, player.score
                );
            }
            report.game_over.push(client_id);
        }

        if self.cadence.should_send() {
            let leaderboard = self.leaderboard();
            let t = timestamp_ms();
            report.updates = self
                .players
                .iter()
                .map(|(id, player)| (*id, self.create_update(player, &leaderboard, t)))
                .collect();
        }

        report
    }

    fn resolve_collisions(&mut self) {
        let hits = {
            let mut players: Vec<&mut Player> = self.players.values_mut().collect();
            apply_collisions(&mut players, &self.bullets)
        };

        if hits.is_empty() {
            return;
        }

        for hit in &hits {
            if let Some(shooter) = self.players.get_mut(&hit.parent_id) {
                shooter.on_dealt_damage();
            }
        }

        self.bullets
            .retain(|bullet| !hits.iter().any(|hit| hit.bullet_id == bullet.id()));
        debug!("Tick {}: {} bullet hits", self.tick, hits.len());
    }

    /// Top players by score, highest first.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut ranked: Vec<&Player> = self.players.values().collect();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        ranked
            .into_iter()
            .take(LEADERBOARD_SIZE)
            .map(|player| LeaderboardEntry {
                username: player.username.clone(),
                score: player.score.round() as u32,
            })
            .collect()
    }

    /// Builds `player`'s snapshot, leaving out anything beyond its view radius.
    pub fn create_update(
        &self,
        player: &Player,
        leaderboard: &[LeaderboardEntry],
        t: u64,
    ) -> GameUpdate {
        let others = self
            .players
            .values()
            .filter(|other| other.id() != player.id() && other.distance_to(player) <= VIEW_RADIUS)
            .map(|other| other.serialize())
            .collect();

        let bullets = self
            .bullets
            .iter()
            .filter(|bullet| bullet.distance_to(player) <= VIEW_RADIUS)
            .map(|bullet| bullet.serialize())
            .collect();

        GameUpdate {
            t,
            me: player.serialize(),
            others,
            bullets,
            leaderboard: leaderboard.to_vec(),
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::{BULLET_DAMAGE, MAP_SIZE, PLAYER_MAX_HP, SCORE_BULLET_HIT};

    fn place(game: &mut Game, client_id: ClientId, x: f32, y: f32) {
        let player = game.players.get_mut(&client_id).unwrap();
        player.body.x = x;
        player.body.y = y;
    }

    #[test]
    fn test_add_player() {
        let mut game = Game::default();
        assert!(game.add_player(1, "alice".to_string()));
        assert!(game.is_joined(1));
        assert_eq!(game.player_count(), 1);
        assert_eq!(game.player(1).unwrap().username, "alice");
    }

    #[test]
    fn test_add_player_twice_keeps_first() {
        let mut game = Game::default();
        game.add_player(1, "alice".to_string());
        game.players.get_mut(&1).unwrap().score = 12.0;

        assert!(!game.add_player(1, "mallory".to_string()));
        assert_eq!(game.player(1).unwrap().username, "alice");
        assert_eq!(game.player(1).unwrap().score, 12.0);
    }

    #[test]
    fn test_remove_player_is_idempotent() {
        let mut game = Game::default();
        game.add_player(1, "alice".to_string());

        assert!(game.remove_player(1));
        assert!(!game.remove_player(1));
        assert!(!game.remove_player(99));
        assert_eq!(game.player_count(), 0);
    }

    #[test]
    fn test_handle_input() {
        let mut game = Game::default();
        game.add_player(1, "alice".to_string());

        game.handle_input(1, 1.5);
        assert_eq!(game.player(1).unwrap().body.direction, 1.5);

        // Unknown or removed connections are ignored.
        game.handle_input(2, 0.3);
        game.remove_player(1);
        game.handle_input(1, 0.3);
        assert_eq!(game.player_count(), 0);
    }

    #[test]
    fn test_broadcast_cadence_alternates() {
        let mut cadence = BroadcastCadence::new(2);
        let pattern: Vec<bool> = (0..6).map(|_| cadence.should_send()).collect();
        assert_eq!(pattern, vec![false, true, false, true, false, true]);

        let mut every_tick = BroadcastCadence::new(0);
        assert!(every_tick.should_send());
        assert!(every_tick.should_send());
    }

    #[test]
    fn test_tick_broadcasts_every_other_tick() {
        let mut game = Game::default();
        game.add_player(1, "alice".to_string());
        game.add_player(2, "bob".to_string());

        let first = game.tick(0.016);
        assert!(first.updates.is_empty());

        let second = game.tick(0.016);
        assert_eq!(second.updates.len(), 2);
        for (client_id, update) in &second.updates {
            assert_eq!(update.me.id, *client_id);
        }
    }

    #[test]
    fn test_tick_moves_players_and_fires() {
        let mut game = Game::default();
        game.add_player(1, "alice".to_string());
        place(&mut game, 1, 1500.0, 1500.0);
        game.handle_input(1, 0.0);

        game.tick(0.1);

        let player = game.player(1).unwrap();
        assert_approx_eq!(player.body.x, 1500.0, 1e-2);
        assert_approx_eq!(player.body.y, 1460.0, 1e-2);
        assert_eq!(game.bullet_count(), 1);
    }

    #[test]
    fn test_expired_bullets_are_removed() {
        let mut game = Game::default();
        game.bullets.push(Bullet::new(42, 1.0, 1.0, 0.0));
        game.bullets.push(Bullet::new(42, 1500.0, 1500.0, 0.0));

        game.tick(0.01);

        assert_eq!(game.bullet_count(), 1);
        assert_approx_eq!(game.bullets[0].body.x, 1500.0, 1e-3);
    }

    #[test]
    fn test_two_shooters_hit_same_victim() {
        let mut game = Game::default();
        game.add_player(1, "victim".to_string());
        game.add_player(2, "shooter_a".to_string());
        game.add_player(3, "shooter_b".to_string());
        place(&mut game, 1, 1500.0, 1500.0);
        place(&mut game, 2, 200.0, 200.0);
        place(&mut game, 3, 2800.0, 2800.0);

        game.bullets.push(Bullet::new(2, 1500.0, 1500.0, 0.0));
        game.bullets.push(Bullet::new(3, 1505.0, 1500.0, 0.0));

        let report = game.tick(0.0);

        assert!(report.game_over.is_empty());
        assert_approx_eq!(game.player(1).unwrap().hp, PLAYER_MAX_HP - 2.0 * BULLET_DAMAGE);
        assert_approx_eq!(game.player(2).unwrap().score, SCORE_BULLET_HIT);
        assert_approx_eq!(game.player(3).unwrap().score, SCORE_BULLET_HIT);
        assert_eq!(game.player(1).unwrap().score, 0.0);
        // Only the three freshly fired bullets remain.
        assert_eq!(game.bullet_count(), 3);
    }

    #[test]
    fn test_hit_from_departed_shooter_is_not_credited() {
        let mut game = Game::default();
        game.add_player(1, "victim".to_string());
        place(&mut game, 1, 1500.0, 1500.0);
        game.bullets.push(Bullet::new(77, 1500.0, 1500.0, 0.0));

        game.tick(0.0);

        assert_approx_eq!(game.player(1).unwrap().hp, PLAYER_MAX_HP - BULLET_DAMAGE);
        assert_eq!(game.bullet_count(), 1);
    }

    #[test]
    fn test_dead_player_removed_before_broadcast() {
        let mut game = Game::default();
        game.add_player(1, "victim".to_string());
        game.add_player(2, "shooter".to_string());
        place(&mut game, 1, 1500.0, 1500.0);
        place(&mut game, 2, 1600.0, 1600.0);

        // First tick fires the opening shots, which land nowhere.
        assert!(game.tick(0.0).game_over.is_empty());

        game.players.get_mut(&1).unwrap().hp = BULLET_DAMAGE;
        game.bullets.clear();
        game.bullets.push(Bullet::new(2, 1500.0, 1500.0, 0.0));

        let report = game.tick(0.0);
        assert_eq!(report.game_over, vec![1]);
        assert!(!game.is_joined(1));
        assert_eq!(report.updates.len(), 1);

        let (recipient, update) = &report.updates[0];
        assert_eq!(*recipient, 2);
        assert!(update.others.is_empty());
        assert!(update.leaderboard.iter().all(|entry| entry.username != "victim"));
    }

    #[test]
    fn test_leaderboard_sorted_truncated_rounded() {
        let mut game = Game::default();
        let scores = [3.4, 10.6, 0.0, 7.5, 1.2, 99.49, 5.0];
        for (i, score) in scores.iter().enumerate() {
            let id = i as ClientId + 1;
            game.add_player(id, format!("p{}", id));
            game.players.get_mut(&id).unwrap().score = *score;
        }

        let leaderboard = game.leaderboard();
        assert_eq!(leaderboard.len(), LEADERBOARD_SIZE);
        let values: Vec<u32> = leaderboard.iter().map(|entry| entry.score).collect();
        assert_eq!(values, vec![99, 11, 8, 5, 3]);
        assert_eq!(leaderboard[0].username, "p6");
    }

    #[test]
    fn test_create_update_culls_by_distance() {
        let mut game = Game::default();
        game.add_player(1, "me".to_string());
        game.add_player(2, "near".to_string());
        game.add_player(3, "far".to_string());
        place(&mut game, 1, 100.0, 100.0);
        place(&mut game, 2, 100.0 + VIEW_RADIUS, 100.0);
        place(&mut game, 3, MAP_SIZE, MAP_SIZE);

        game.bullets.push(Bullet::new(3, 200.0, 200.0, 0.0));
        game.bullets.push(Bullet::new(3, 2900.0, 2900.0, 0.0));

        let me = game.player(1).unwrap();
        let update = game.create_update(me, &game.leaderboard(), 1234);

        assert_eq!(update.t, 1234);
        assert_eq!(update.me.id, 1);
        assert_eq!(update.others.len(), 1);
        assert_eq!(update.others[0].id, 2);
        assert_eq!(update.bullets.len(), 1);
        assert_eq!(update.bullets[0].x, 200.0);
        assert_eq!(update.leaderboard.len(), 3);
    }

    #[test]
    fn test_update_measures_elapsed_time() {
        let mut game = Game::default();
        game.add_player(1, "alice".to_string());
        std::thread::sleep(std::time::Duration::from_millis(20));

        game.update();

        let score = game.player(1).unwrap().score;
        assert!(score >= 0.019, "score {} should reflect measured dt", score);
        assert!(score < 1.0);
    }
}
