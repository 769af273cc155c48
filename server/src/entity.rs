//! Simulated objects: the shared kinematic body plus players and bullets

use rand::Rng;
use shared::{
    EntityId, ObjectUpdate, PlayerUpdate, BULLET_DAMAGE, BULLET_SPEED, MAP_SIZE, PLAYER_FIRE_COOLDOWN,
    PLAYER_MAX_HP, PLAYER_SPEED, SCORE_BULLET_HIT, SCORE_PER_SECOND,
};
use std::f32::consts::PI;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_BULLET_ID: AtomicU32 = AtomicU32::new(1);

/// Position and heading of anything that moves in the arena.
///
/// Direction 0 faces "up" (towards negative y) and grows clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub direction: f32,
    pub speed: f32,
}

impl Body {
    pub fn new(id: EntityId, x: f32, y: f32, direction: f32, speed: f32) -> Self {
        debug_assert!(
            speed.is_finite() && speed >= 0.0,
            "entity {} created with invalid speed {}",
            id,
            speed
        );

        Self {
            id,
            x,
            y,
            direction,
            speed,
        }
    }

    /// Moves the body along its heading for `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.x += dt * self.speed * self.direction.sin();
        self.y -= dt * self.speed * self.direction.cos();
    }

    pub fn distance_to(&self, other: &Body) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_out_of_bounds(&self) -> bool {
        self.x < 0.0 || self.x > MAP_SIZE || self.y < 0.0 || self.y > MAP_SIZE
    }
}

/// Behaviour shared by every simulated object.
pub trait GameObject {
    type Update;

    fn body(&self) -> &Body;

    /// Wire representation sent to clients.
    fn serialize(&self) -> Self::Update;

    fn id(&self) -> EntityId {
        self.body().id
    }

    fn distance_to<O: GameObject + ?Sized>(&self, other: &O) -> f32 {
        self.body().distance_to(other.body())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub body: Body,
    /// Player that fired this bullet. Never hit by it, credited when it lands.
    pub parent_id: EntityId,
}

impl Bullet {
    pub fn new(parent_id: EntityId, x: f32, y: f32, direction: f32) -> Self {
        let id = NEXT_BULLET_ID.fetch_add(1, Ordering::Relaxed);

        Self {
            body: Body::new(id, x, y, direction, BULLET_SPEED),
            parent_id,
        }
    }

    /// Advances the bullet. Returns true once it has left the map and must be destroyed.
    pub fn update(&mut self, dt: f32) -> bool {
        self.body.advance(dt);
        self.body.is_out_of_bounds()
    }
}

impl GameObject for Bullet {
    type Update = ObjectUpdate;

    fn body(&self) -> &Body {
        &self.body
    }

    fn serialize(&self) -> ObjectUpdate {
        ObjectUpdate {
            id: self.body.id,
            x: self.body.x,
            y: self.body.y,
            direction: self.body.direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub body: Body,
    pub username: String,
    pub hp: f32,
    /// Seconds until the next shot. May go negative between ticks.
    pub fire_cooldown: f32,
    pub score: f32,
}

impl Player {
    pub fn new(id: EntityId, username: String, x: f32, y: f32, direction: f32) -> Self {
        Self {
            body: Body::new(id, x, y, direction, PLAYER_SPEED),
            username,
            hp: PLAYER_MAX_HP,
            fire_cooldown: 0.0,
            score: 0.0,
        }
    }

    /// Creates a player somewhere in the central half of the map with a random heading.
    pub fn spawn<R: Rng + ?Sized>(id: EntityId, username: String, rng: &mut R) -> Self {
        let x = MAP_SIZE * (0.25 + rng.gen::<f32>() * 0.5);
        let y = MAP_SIZE * (0.25 + rng.gen::<f32>() * 0.5);
        let direction = rng.gen::<f32>() * 2.0 * PI;

        Self::new(id, username, x, y, direction)
    }

    /// Advances the player by `dt` seconds, returning a bullet if one was fired.
    pub fn update(&mut self, dt: f32) -> Option<Bullet> {
        self.body.advance(dt);

        self.score += dt * SCORE_PER_SECOND;

        self.body.x = self.body.x.clamp(0.0, MAP_SIZE);
        self.body.y = self.body.y.clamp(0.0, MAP_SIZE);

        // Accumulate rather than reset: overshoot carries into the next cooldown.
        self.fire_cooldown -= dt;
        if self.fire_cooldown <= 0.0 {
            self.fire_cooldown += PLAYER_FIRE_COOLDOWN;
            return Some(Bullet::new(
                self.body.id,
                self.body.x,
                self.body.y,
                self.body.direction,
            ));
        }

        None
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.hp -= amount;
    }

    pub fn take_bullet_damage(&mut self) {
        self.take_damage(BULLET_DAMAGE);
    }

    pub fn on_dealt_damage(&mut self) {
        self.score += SCORE_BULLET_HIT;
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}

impl GameObject for Player {
    type Update = PlayerUpdate;

    fn body(&self) -> &Body {
        &self.body
    }

    fn serialize(&self) -> PlayerUpdate {
        PlayerUpdate {
            id: self.body.id,
            x: self.body.x,
            y: self.body.y,
            direction: self.body.direction,
            hp: self.hp,
        }
    }
}
