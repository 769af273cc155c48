use clap::Parser;
use client::input::InputManager;
use client::network::NetworkHandle;
use client::rendering::{Overlay, Renderer};
use client::session::{Phase, Session};
use client::state::StateBuffer;
use log::{error, info, warn};
use macroquad::prelude::*;
use shared::{sanitize_username, Packet};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Name shown on the leaderboard
    #[arg(short = 'u', long, default_value = "")]
    username: String,

    /// Simulate network latency in milliseconds
    #[arg(short = 'l', long, default_value = "0")]
    fake_ping: u64,

    /// Window width
    #[arg(short = 'w', long, default_value = "1024")]
    width: i32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "768")]
    height: i32,
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "arena.io".to_string(),
        window_width: args.width,
        window_height: args.height,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let username = sanitize_username(&args.username);

    info!("Starting client as {}", username);
    info!("Connecting to: {}", args.server);
    if args.fake_ping > 0 {
        info!("Simulating {}ms latency", args.fake_ping);
    }
    info!("Controls: steer with the mouse, Enter to join, Escape to quit");

    let mut network = match NetworkHandle::spawn(&args.server, args.fake_ping) {
        Ok(network) => network,
        Err(e) => {
            error!("Failed to start networking: {}", e);
            return;
        }
    };

    let mut session = Session::new(username.clone(), Instant::now());
    let mut buffer = StateBuffer::new();
    let mut input = InputManager::new();
    let renderer = Renderer::new(&username);

    loop {
        while let Some(packet) = network.try_recv() {
            match packet {
                Packet::Connected { client_id } => {
                    info!("Connected! Client ID: {}", client_id);
                    session.on_connected();
                }
                Packet::Update(update) => {
                    if session.on_update(Instant::now()) {
                        buffer.ingest(update);
                    }
                }
                Packet::GameOver => {
                    info!("Destroyed");
                    session.on_game_over();
                }
                Packet::Disconnected { reason } => {
                    warn!("Disconnected: {}", reason);
                    session.on_disconnected(reason);
                }
                other => warn!("Unexpected packet: {:?}", other),
            }
        }

        let now = Instant::now();
        if let Some(packet) = session.poll(now) {
            network.send(packet);
        }

        let (actions, direction) = input.update();

        if actions.quit {
            break;
        }

        if actions.join {
            if let Some(packet) = session.join(now) {
                buffer.reset();
                input.reset();
                network.send(packet);
            }
        }

        if session.is_playing() {
            if let Some(direction) = direction {
                network.send(Packet::Input { direction });
            }
        }

        let overlay = match session.phase() {
            Phase::Playing => None,
            Phase::Joining => Some(Overlay::Joining),
            Phase::GameOver => Some(Overlay::GameOver),
            Phase::Connecting => Some(Overlay::Connecting),
            Phase::Menu => Some(Overlay::Menu),
            Phase::Disconnected(reason) => Some(Overlay::Disconnected(reason.clone())),
        };

        // Game over keeps showing the last known arena behind the overlay.
        let show_arena = matches!(session.phase(), Phase::Playing | Phase::GameOver);
        match buffer.current_view() {
            Some(view) if show_arena => renderer.render(&view),
            _ => renderer.render_backdrop(get_time()),
        }
        if let Some(overlay) = overlay {
            renderer.render_overlay(&overlay);
        }

        next_frame().await;
    }

    network.send(Packet::Disconnect);
    // Give the transport thread a moment to flush the datagram.
    std::thread::sleep(Duration::from_millis(50));
}
