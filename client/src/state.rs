//! Snapshot buffering and time-shifted interpolation
//!
//! Snapshots arrive at the server's broadcast rate, delayed and slightly
//! irregular. Rendering them as they arrive looks choppy, so the client keeps
//! a short history and renders the world as it was `RENDER_DELAY_MS` ago,
//! blending between the two snapshots that bracket that moment.
//!
//! The reconstructed server clock is anchored to the first snapshot ever
//! received: `first_server_ts + (local_now - local_start) - RENDER_DELAY_MS`.

use shared::{timestamp_ms, GameUpdate, ObjectUpdate, PlayerUpdate, RENDER_DELAY_MS};
use std::f32::consts::PI;

const TAU: f32 = 2.0 * PI;

#[derive(Debug, Default)]
pub struct StateBuffer {
    /// Retained snapshots, oldest first, ordered by `t`.
    updates: Vec<GameUpdate>,
    /// Server time of the first snapshot and the local time it arrived.
    anchor: Option<(u64, u64)>,
}

impl StateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything, as if no snapshot had ever arrived.
    pub fn reset(&mut self) {
        self.updates.clear();
        self.anchor = None;
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn ingest(&mut self, update: GameUpdate) {
        self.ingest_at(update, timestamp_ms());
    }

    /// Stores a snapshot received at local time `now_ms`.
    ///
    /// Everything older than the current interpolation base is discarded.
    pub fn ingest_at(&mut self, update: GameUpdate, now_ms: u64) {
        if self.anchor.is_none() {
            self.anchor = Some((update.t, now_ms));
        }

        // Datagrams can be reordered in flight.
        let index = self.updates.partition_point(|existing| existing.t <= update.t);
        self.updates.insert(index, update);

        if let Some(base) = self.base_index(self.server_time(now_ms)) {
            if base > 0 {
                self.updates.drain(..base);
            }
        }
    }

    pub fn current_view(&self) -> Option<GameUpdate> {
        self.current_view_at(timestamp_ms())
    }

    /// Reconstructs the world at `now_ms - RENDER_DELAY_MS` in server time.
    ///
    /// Returns `None` until the first snapshot arrives. Without a later
    /// snapshot to blend towards, the newest one is returned unchanged.
    pub fn current_view_at(&self, now_ms: u64) -> Option<GameUpdate> {
        let newest = self.updates.last()?;
        let server_time = self.server_time(now_ms);

        let base = match self.base_index(server_time) {
            Some(base) if base + 1 < self.updates.len() => base,
            _ => return Some(newest.clone()),
        };

        let base_update = &self.updates[base];
        let next = &self.updates[base + 1];

        let span = next.t.saturating_sub(base_update.t);
        let ratio = if span > 0 {
            (server_time - base_update.t as i64) as f32 / span as f32
        } else {
            1.0
        };

        Some(interpolate_update(base_update, next, ratio, server_time as u64))
    }

    fn server_time(&self, now_ms: u64) -> i64 {
        match self.anchor {
            Some((first_server_ts, local_start)) => {
                first_server_ts as i64 + (now_ms as i64 - local_start as i64)
                    - RENDER_DELAY_MS as i64
            }
            None => 0,
        }
    }

    /// Index of the newest snapshot at or before `server_time`.
    fn base_index(&self, server_time: i64) -> Option<usize> {
        self.updates
            .iter()
            .rposition(|update| update.t as i64 <= server_time)
    }
}

/// Blends two snapshots. `ratio` 0 yields `base`, 1 yields `next`.
///
/// Scalars that change in steps (hp) and the leaderboard always come from
/// `next`. Entities are matched by id; anything not present in both is left out.
pub fn interpolate_update(base: &GameUpdate, next: &GameUpdate, ratio: f32, t: u64) -> GameUpdate {
    GameUpdate {
        t,
        me: interpolate_player(&base.me, &next.me, ratio),
        others: base
            .others
            .iter()
            .filter_map(|player| {
                next.others
                    .iter()
                    .find(|candidate| candidate.id == player.id)
                    .map(|upcoming| interpolate_player(player, upcoming, ratio))
            })
            .collect(),
        bullets: base
            .bullets
            .iter()
            .filter_map(|bullet| {
                next.bullets
                    .iter()
                    .find(|candidate| candidate.id == bullet.id)
                    .map(|upcoming| interpolate_object(bullet, upcoming, ratio))
            })
            .collect(),
        leaderboard: next.leaderboard.clone(),
    }
}

pub fn interpolate_object(from: &ObjectUpdate, to: &ObjectUpdate, ratio: f32) -> ObjectUpdate {
    ObjectUpdate {
        id: to.id,
        x: lerp(from.x, to.x, ratio),
        y: lerp(from.y, to.y, ratio),
        direction: interpolate_direction(from.direction, to.direction, ratio),
    }
}

pub fn interpolate_player(from: &PlayerUpdate, to: &PlayerUpdate, ratio: f32) -> PlayerUpdate {
    PlayerUpdate {
        id: to.id,
        x: lerp(from.x, to.x, ratio),
        y: lerp(from.y, to.y, ratio),
        direction: interpolate_direction(from.direction, to.direction, ratio),
        hp: to.hp,
    }
}

/// Interpolates a heading along the shorter arc.
///
/// Going from 3.0 to -3.0 passes through pi rather than 0. When the arc wraps,
/// `to` is shifted by a full turn so the result moves continuously away from
/// `from`; at `ratio` 1 the unshifted `to` is returned.
pub fn interpolate_direction(from: f32, to: f32, ratio: f32) -> f32 {
    let delta = to - from;
    if delta.abs() <= PI {
        return lerp(from, to, ratio);
    }
    if ratio >= 1.0 {
        return to;
    }

    let turn = if delta > 0.0 { TAU } else { -TAU };
    lerp(from, to - turn, ratio)
}

fn lerp(from: f32, to: f32, ratio: f32) -> f32 {
    from * (1.0 - ratio) + to * ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::LeaderboardEntry;

    fn player(id: u32, x: f32, y: f32, direction: f32, hp: f32) -> PlayerUpdate {
        PlayerUpdate {
            id,
            x,
            y,
            direction,
            hp,
        }
    }

    fn bullet(id: u32, x: f32, y: f32) -> ObjectUpdate {
        ObjectUpdate {
            id,
            x,
            y,
            direction: 0.0,
        }
    }

    fn snapshot(t: u64, x: f32) -> GameUpdate {
        GameUpdate {
            t,
            me: player(1, x, 100.0, 0.5, 100.0),
            others: vec![player(2, x + 50.0, 200.0, 1.0, 100.0)],
            bullets: vec![bullet(10, x, 0.0)],
            leaderboard: vec![LeaderboardEntry {
                username: format!("score-at-{}", t),
                score: t as u32,
            }],
        }
    }

    #[test]
    fn test_empty_buffer_has_no_view() {
        let buffer = StateBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.current_view_at(5_000), None);
    }

    #[test]
    fn test_single_snapshot_returned_verbatim() {
        let mut buffer = StateBuffer::new();
        let only = snapshot(1000, 10.0);
        buffer.ingest_at(only.clone(), 50_000);

        for elapsed in [0, 50, 100, 150, 10_000] {
            assert_eq!(buffer.current_view_at(50_000 + elapsed), Some(only.clone()));
        }
    }

    #[test]
    fn test_interpolates_between_bracketing_snapshots() {
        let mut buffer = StateBuffer::new();
        // Server t=1000 arrives at local 0, so server time = local - 100 + 1000.
        buffer.ingest_at(snapshot(1000, 0.0), 0);
        buffer.ingest_at(snapshot(1100, 100.0), 100);

        // Server time 1025 is a quarter of the way from 1000 to 1100.
        let view = buffer.current_view_at(125).unwrap();
        assert_eq!(view.t, 1025);
        assert_approx_eq!(view.me.x, 25.0, 1e-3);
        assert_approx_eq!(view.others[0].x, 75.0, 1e-3);
        assert_approx_eq!(view.bullets[0].x, 25.0, 1e-3);
        assert_eq!(view.leaderboard[0].username, "score-at-1100");
    }

    #[test]
    fn test_ratio_zero_reproduces_base() {
        let mut buffer = StateBuffer::new();
        let base = snapshot(1000, 0.0);
        buffer.ingest_at(base.clone(), 0);
        buffer.ingest_at(snapshot(1100, 100.0), 100);

        // Server time is exactly 1000.
        let view = buffer.current_view_at(100).unwrap();
        assert_eq!(view.t, base.t);
        assert_eq!(view.me.x, base.me.x);
        assert_eq!(view.me.direction, base.me.direction);
        assert_eq!(view.others[0].x, base.others[0].x);
        assert_eq!(view.bullets, base.bullets);
    }

    #[test]
    fn test_ratio_one_reproduces_next() {
        let base = snapshot(1000, 0.0);
        let mut next = snapshot(1100, 100.0);
        next.me.direction = -3.0;
        next.me.hp = 60.0;

        let view = interpolate_update(&base, &next, 1.0, next.t);
        assert_eq!(view, next);
    }

    #[test]
    fn test_hp_and_leaderboard_taken_from_next() {
        let base = snapshot(1000, 0.0);
        let mut next = snapshot(1100, 100.0);
        next.me.hp = 70.0;
        next.others[0].hp = 10.0;

        let view = interpolate_update(&base, &next, 0.1, 1010);
        assert_eq!(view.me.hp, 70.0);
        assert_eq!(view.others[0].hp, 10.0);
        assert_eq!(view.leaderboard, next.leaderboard);
    }

    #[test]
    fn test_entities_missing_from_either_side_are_omitted() {
        let mut base = snapshot(1000, 0.0);
        let mut next = snapshot(1100, 100.0);
        base.bullets.push(bullet(11, 5.0, 5.0));
        next.bullets.push(bullet(12, 6.0, 6.0));
        next.others.clear();

        let view = interpolate_update(&base, &next, 0.5, 1050);
        assert!(view.others.is_empty());
        assert_eq!(view.bullets.len(), 1);
        assert_eq!(view.bullets[0].id, 10);
    }

    #[test]
    fn test_direction_takes_short_way_around() {
        let halfway = interpolate_direction(3.0, -3.0, 0.5);
        assert_approx_eq!(halfway.abs(), PI, 1e-3);

        let halfway = interpolate_direction(-3.0, 3.0, 0.5);
        assert_approx_eq!(halfway.abs(), PI, 1e-3);

        // Just past the start of the wrapped arc, still beyond +3.0 rather than heading to 0.
        let early = interpolate_direction(3.0, -3.0, 0.25);
        assert!(early > 3.0);
    }

    #[test]
    fn test_direction_plain_lerp_for_small_turns() {
        assert_approx_eq!(interpolate_direction(0.0, 1.0, 0.5), 0.5);
        assert_approx_eq!(interpolate_direction(1.0, -1.0, 0.25), 0.5);
    }

    #[test]
    fn test_direction_continuous_across_wrapped_arc() {
        for (from, to) in [(3.0f32, -3.0f32), (-3.0, 3.0), (2.9, -2.5)] {
            let mut previous = interpolate_direction(from, to, 0.0);
            for step in 1..100 {
                let current = interpolate_direction(from, to, step as f32 / 100.0);
                assert!(
                    (current - previous).abs() < 0.05,
                    "jump from {} to {} at step {}",
                    previous,
                    current,
                    step
                );
                previous = current;
            }
        }
    }

    #[test]
    fn test_direction_endpoints_exact() {
        for (from, to) in [(3.0, -3.0), (-3.0, 3.0), (0.2, 0.9), (-2.5, 2.9)] {
            assert_eq!(interpolate_direction(from, to, 0.0), from);
            assert_eq!(interpolate_direction(from, to, 1.0), to);
        }
    }

    #[test]
    fn test_old_snapshots_pruned_keeping_base() {
        let mut buffer = StateBuffer::new();
        buffer.ingest_at(snapshot(1000, 0.0), 0);
        buffer.ingest_at(snapshot(1033, 1.0), 33);
        buffer.ingest_at(snapshot(1066, 2.0), 66);
        buffer.ingest_at(snapshot(1100, 3.0), 100);
        assert_eq!(buffer.len(), 4);

        // Local 200 -> server time 1100, so t=1100 becomes the base.
        buffer.ingest_at(snapshot(1133, 4.0), 200);
        assert_eq!(buffer.len(), 2);

        let view = buffer.current_view_at(200).unwrap();
        assert_eq!(view.me.x, 3.0);
    }

    #[test]
    fn test_outrunning_the_buffer_freezes_on_newest() {
        let mut buffer = StateBuffer::new();
        buffer.ingest_at(snapshot(1000, 0.0), 0);
        buffer.ingest_at(snapshot(1100, 100.0), 100);

        let view = buffer.current_view_at(10_000).unwrap();
        assert_eq!(view, snapshot(1100, 100.0));
    }

    #[test]
    fn test_out_of_order_snapshot_inserted_in_place() {
        let mut buffer = StateBuffer::new();
        buffer.ingest_at(snapshot(1000, 0.0), 0);
        buffer.ingest_at(snapshot(1200, 200.0), 20);
        buffer.ingest_at(snapshot(1100, 100.0), 30);
        assert_eq!(buffer.len(), 3);

        // Server time 1150 falls between 1100 and 1200.
        let view = buffer.current_view_at(250).unwrap();
        assert_approx_eq!(view.me.x, 150.0, 1e-3);
    }

    #[test]
    fn test_reset_forgets_history() {
        let mut buffer = StateBuffer::new();
        buffer.ingest_at(snapshot(1000, 0.0), 0);
        buffer.reset();

        assert!(buffer.is_empty());
        assert_eq!(buffer.current_view_at(100), None);

        // A fresh anchor is latched after the reset.
        buffer.ingest_at(snapshot(9000, 5.0), 500);
        buffer.ingest_at(snapshot(9100, 15.0), 600);
        let view = buffer.current_view_at(650).unwrap();
        assert_approx_eq!(view.me.x, 10.0, 1e-3);
    }
}
