use macroquad::prelude::*;
use shared::{
    GameUpdate, LeaderboardEntry, ObjectUpdate, PlayerUpdate, BULLET_RADIUS, MAP_SIZE,
    PLAYER_MAX_HP, PLAYER_RADIUS,
};

const GRID_SPACING: f32 = 100.0;
const BACKGROUND: Color = Color::new(0.10, 0.10, 0.10, 1.0);
const GRID_COLOR: Color = Color::new(0.18, 0.18, 0.18, 1.0);
const ENEMY_COLOR: Color = Color::new(1.0, 0.27, 0.27, 1.0);
/// Distance of the menu camera from the map centre.
const MENU_ORBIT_RADIUS: f32 = 800.0;
/// Seconds per radian of the menu camera's orbit.
const MENU_ORBIT_PERIOD: f64 = 7.5;

/// Maps a world position to screen space with `centre` in the middle of the window.
pub fn world_to_screen(centre: (f32, f32), point: (f32, f32), width: f32, height: f32) -> (f32, f32) {
    (
        width / 2.0 + (point.0 - centre.0),
        height / 2.0 + (point.1 - centre.1),
    )
}

/// Unit vector for a heading; 0 points up the screen.
pub fn heading(direction: f32) -> (f32, f32) {
    (direction.sin(), -direction.cos())
}

/// Camera position for the menu backdrop, slowly circling the map centre.
pub fn menu_camera(seconds: f64) -> (f32, f32) {
    let angle = (seconds / MENU_ORBIT_PERIOD) as f32;
    (
        MAP_SIZE / 2.0 + MENU_ORBIT_RADIUS * angle.cos(),
        MAP_SIZE / 2.0 + MENU_ORBIT_RADIUS * angle.sin(),
    )
}

/// What to draw over the world, if anything.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Connecting,
    Menu,
    Joining,
    GameOver,
    Disconnected(String),
}

pub struct Renderer {
    username: String,
}

impl Renderer {
    pub fn new(username: &str) -> Self {
        Renderer {
            username: username.to_string(),
        }
    }

    /// Draws one interpolated view of the arena, camera centred on `me`.
    pub fn render(&self, view: &GameUpdate) {
        clear_background(BACKGROUND);

        let width = screen_width();
        let height = screen_height();
        let centre = (view.me.x, view.me.y);

        self.draw_grid(centre, width, height);
        self.draw_boundary(centre, width, height);

        for bullet in &view.bullets {
            self.draw_bullet(bullet, centre, width, height);
        }
        for other in &view.others {
            self.draw_player(other, centre, width, height, ENEMY_COLOR, None);
        }
        self.draw_player(&view.me, centre, width, height, GREEN, Some(&self.username));

        self.draw_leaderboard(&view.leaderboard, width);
    }

    /// Empty arena backdrop for the menu screens, `seconds` since startup.
    pub fn render_backdrop(&self, seconds: f64) {
        clear_background(BACKGROUND);

        let width = screen_width();
        let height = screen_height();
        let centre = menu_camera(seconds);
        self.draw_grid(centre, width, height);
        self.draw_boundary(centre, width, height);
    }

    pub fn render_overlay(&self, overlay: &Overlay) {
        let width = screen_width();
        let height = screen_height();
        draw_rectangle(0.0, 0.0, width, height, Color::new(0.0, 0.0, 0.0, 0.5));

        let (title, hint) = match overlay {
            Overlay::Connecting => ("Connecting...".to_string(), String::new()),
            Overlay::Menu => (
                format!("Playing as {}", self.username),
                "Press Enter to join".to_string(),
            ),
            Overlay::Joining => ("Joining...".to_string(), String::new()),
            Overlay::GameOver => ("Game over".to_string(), "Press Enter to play again".to_string()),
            Overlay::Disconnected(reason) => (
                format!("Disconnected: {}", reason),
                "Press Escape to quit".to_string(),
            ),
        };

        self.draw_centered_text(&title, height / 2.0 - 10.0, 32.0, width);
        if !hint.is_empty() {
            self.draw_centered_text(&hint, height / 2.0 + 25.0, 20.0, width);
        }
    }

    fn draw_centered_text(&self, text: &str, y: f32, size: f32, width: f32) {
        let dimensions = measure_text(text, None, size as u16, 1.0);
        draw_text(text, (width - dimensions.width) / 2.0, y, size, WHITE);
    }

    fn draw_grid(&self, centre: (f32, f32), width: f32, height: f32) {
        let lines = (MAP_SIZE / GRID_SPACING) as usize;
        for i in 0..=lines {
            let offset = i as f32 * GRID_SPACING;

            let (x, _) = world_to_screen(centre, (offset, 0.0), width, height);
            if (0.0..=width).contains(&x) {
                draw_line(x, 0.0, x, height, 1.0, GRID_COLOR);
            }

            let (_, y) = world_to_screen(centre, (0.0, offset), width, height);
            if (0.0..=height).contains(&y) {
                draw_line(0.0, y, width, y, 1.0, GRID_COLOR);
            }
        }
    }

    fn draw_boundary(&self, centre: (f32, f32), width: f32, height: f32) {
        let (x, y) = world_to_screen(centre, (0.0, 0.0), width, height);
        draw_rectangle_lines(x, y, MAP_SIZE, MAP_SIZE, 3.0, GRAY);
    }

    fn draw_bullet(&self, bullet: &ObjectUpdate, centre: (f32, f32), width: f32, height: f32) {
        let (x, y) = world_to_screen(centre, (bullet.x, bullet.y), width, height);
        draw_circle(x, y, BULLET_RADIUS, YELLOW);
    }

    fn draw_player(
        &self,
        player: &PlayerUpdate,
        centre: (f32, f32),
        width: f32,
        height: f32,
        color: Color,
        label: Option<&str>,
    ) {
        let (x, y) = world_to_screen(centre, (player.x, player.y), width, height);
        if x < -PLAYER_RADIUS * 3.0
            || x > width + PLAYER_RADIUS * 3.0
            || y < -PLAYER_RADIUS * 3.0
            || y > height + PLAYER_RADIUS * 3.0
        {
            return;
        }

        draw_circle(x, y, PLAYER_RADIUS, color);
        draw_circle_lines(x, y, PLAYER_RADIUS, 2.0, WHITE);

        let (hx, hy) = heading(player.direction);
        draw_line(
            x,
            y,
            x + hx * PLAYER_RADIUS * 1.5,
            y + hy * PLAYER_RADIUS * 1.5,
            3.0,
            WHITE,
        );

        // hp bar
        let bar_width = PLAYER_RADIUS * 2.0;
        let bar_y = y + PLAYER_RADIUS + 8.0;
        let fraction = (player.hp / PLAYER_MAX_HP).clamp(0.0, 1.0);
        draw_rectangle(x - PLAYER_RADIUS, bar_y, bar_width, 4.0, DARKGRAY);
        draw_rectangle(x - PLAYER_RADIUS, bar_y, bar_width * fraction, 4.0, RED);

        let text = match label {
            Some(name) => name.to_string(),
            None => format!("#{}", player.id),
        };
        let dimensions = measure_text(&text, None, 14, 1.0);
        draw_text(&text, x - dimensions.width / 2.0, y - PLAYER_RADIUS - 6.0, 14.0, WHITE);
    }

    fn draw_leaderboard(&self, leaderboard: &[LeaderboardEntry], width: f32) {
        let panel_width = 180.0;
        let x = width - panel_width - 10.0;
        let y = 10.0;
        let row_height = 18.0;

        draw_rectangle(
            x,
            y,
            panel_width,
            28.0 + row_height * leaderboard.len() as f32,
            Color::new(0.0, 0.0, 0.0, 0.4),
        );
        draw_text("Leaderboard", x + 8.0, y + 18.0, 18.0, WHITE);

        for (rank, entry) in leaderboard.iter().enumerate() {
            let row_y = y + 36.0 + rank as f32 * row_height;
            let color = if entry.username == self.username { GREEN } else { WHITE };
            draw_text(
                &format!("{}. {}", rank + 1, entry.username),
                x + 8.0,
                row_y,
                16.0,
                color,
            );
            let score = entry.score.to_string();
            let dimensions = measure_text(&score, None, 16, 1.0);
            draw_text(&score, x + panel_width - 8.0 - dimensions.width, row_y, 16.0, color);
        }
    }
}
