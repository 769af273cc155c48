//! Bullet versus player hit detection

use crate::entity::{Bullet, GameObject, Player};
use shared::{EntityId, BULLET_RADIUS, PLAYER_RADIUS};

/// A bullet that landed this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub bullet_id: EntityId,
    /// Shooter to credit, if still alive.
    pub parent_id: EntityId,
    pub victim_id: EntityId,
}

/// Applies bullet damage to players and returns the bullets that must be destroyed.
///
/// Players are scanned in the order given. Each bullet hits at most the first
/// eligible player in range, and never the player that fired it.
pub fn apply_collisions(players: &mut [&mut Player], bullets: &[Bullet]) -> Vec<Hit> {
    let mut hits = Vec::new();

    for bullet in bullets {
        for player in players.iter_mut() {
            if bullet.parent_id == player.id() {
                continue;
            }

            if player.distance_to(bullet) <= PLAYER_RADIUS + BULLET_RADIUS {
                player.take_bullet_damage();
                hits.push(Hit {
                    bullet_id: bullet.id(),
                    parent_id: bullet.parent_id,
                    victim_id: player.id(),
                });
                break;
            }
        }
    }

    hits
}
