//! Pointer steering with send throttling

use macroquad::prelude::*;
use std::time::{Duration, Instant};

/// Minimum spacing between direction changes sent to the server.
pub const INPUT_THROTTLE: Duration = Duration::from_millis(20);
/// The current direction is re-sent at least this often, even when unchanged.
pub const INPUT_KEEP_ALIVE: Duration = Duration::from_millis(250);

/// Heading that points from the screen centre towards the pointer.
///
/// 0 is straight up and angles grow clockwise, matching the server's
/// `x += sin(d)`, `y -= cos(d)` movement convention.
pub fn direction_from_pointer(x: f32, y: f32, width: f32, height: f32) -> f32 {
    (x - width / 2.0).atan2(height / 2.0 - y)
}

/// Edge-triggered keyboard actions sampled once per frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct InputActions {
    pub join: bool,
    pub quit: bool,
}

/// Turns pointer samples into `Input` packets at a bounded rate.
pub struct InputManager {
    last_direction: Option<f32>,
    last_sent: Option<Instant>,

    // Previous frame key state for edge detection
    prev_enter: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            last_direction: None,
            last_sent: None,
            prev_enter: false,
        }
    }

    /// Samples the pointer and keyboard for this frame.
    ///
    /// Returns the actions triggered this frame and a direction to send, if any.
    pub fn update(&mut self) -> (InputActions, Option<f32>) {
        let enter = is_key_down(KeyCode::Enter);
        let actions = InputActions {
            join: enter && !self.prev_enter,
            quit: is_key_pressed(KeyCode::Escape),
        };
        self.prev_enter = enter;

        let (mouse_x, mouse_y) = mouse_position();
        let direction = direction_from_pointer(mouse_x, mouse_y, screen_width(), screen_height());

        (actions, self.update_at(direction, Instant::now()))
    }

    /// Decides whether `direction`, sampled at `now`, should go out.
    pub fn update_at(&mut self, direction: f32, now: Instant) -> Option<f32> {
        let since_last = self
            .last_sent
            .map(|sent| now.saturating_duration_since(sent));

        let changed = self.last_direction != Some(direction);
        let should_send = match since_last {
            None => true,
            Some(elapsed) => {
                (changed && elapsed >= INPUT_THROTTLE) || elapsed >= INPUT_KEEP_ALIVE
            }
        };

        if should_send {
            self.last_direction = Some(direction);
            self.last_sent = Some(now);
            Some(direction)
        } else {
            None
        }
    }

    /// Forgets send history so the next sample goes out immediately.
    pub fn reset(&mut self) {
        self.last_direction = None;
        self.last_sent = None;
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
