//! Headless bot that joins the arena and steers randomly.
//!
//! Useful for filling a server with moving targets while testing the real client.

use clap::Parser;
use log::{info, warn};
use rand::Rng;
use shared::{decode_packet, encode_packet, Packet, MAX_PACKET_SIZE, PROTOCOL_VERSION};
use std::f32::consts::PI;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, Instant};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Name shown on the leaderboard
    #[arg(short = 'u', long, default_value = "bot")]
    username: String,

    /// Seconds to play before leaving; 0 plays until killed
    #[arg(short = 'd', long, default_value = "0")]
    duration: u64,
}

async fn send(socket: &UdpSocket, packet: &Packet, addr: SocketAddr) -> Result<(), BoxError> {
    let data = encode_packet(packet)?;
    socket.send_to(&data, addr).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::init();

    let args = Args::parse();
    let server_addr: SocketAddr = args.server.parse()?;

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    info!("Bot socket bound to {}", socket.local_addr()?);

    send(
        &socket,
        &Packet::Connect {
            client_version: PROTOCOL_VERSION,
        },
        server_addr,
    )
    .await?;

    let started = Instant::now();
    let mut rng = rand::thread_rng();
    let mut steer_interval = interval(Duration::from_millis(500));
    let mut buffer = vec![0u8; MAX_PACKET_SIZE];
    let mut updates_received: u64 = 0;
    let mut direction: f32 = 0.0;

    loop {
        if args.duration > 0 && started.elapsed() >= Duration::from_secs(args.duration) {
            break;
        }

        tokio::select! {
            result = socket.recv_from(&mut buffer) => {
                let (len, _) = result?;
                let packet = match decode_packet(&buffer[..len]) {
                    Ok(packet) => packet,
                    Err(e) => {
                        warn!("Failed to decode packet: {}", e);
                        continue;
                    }
                };

                match packet {
                    Packet::Connected { client_id } => {
                        info!("Connected as client {}", client_id);
                        send(&socket, &Packet::JoinGame { username: args.username.clone() }, server_addr).await?;
                    }
                    Packet::Update(update) => {
                        updates_received += 1;
                        if updates_received % 150 == 0 {
                            let board: Vec<String> = update
                                .leaderboard
                                .iter()
                                .map(|entry| format!("{}:{}", entry.username, entry.score))
                                .collect();
                            info!(
                                "hp {:.0}, {} players and {} bullets in view, leaderboard [{}]",
                                update.me.hp,
                                update.others.len(),
                                update.bullets.len(),
                                board.join(", ")
                            );
                        }
                    }
                    Packet::GameOver => {
                        info!("Bot was destroyed, rejoining");
                        send(&socket, &Packet::JoinGame { username: args.username.clone() }, server_addr).await?;
                    }
                    Packet::Disconnected { reason } => {
                        warn!("Disconnected: {}", reason);
                        return Ok(());
                    }
                    _ => warn!("Unexpected packet type"),
                }
            }

            _ = steer_interval.tick() => {
                direction += rng.gen_range(-PI / 2.0..PI / 2.0);
                send(&socket, &Packet::Input { direction }, server_addr).await?;
            }
        }
    }

    send(&socket, &Packet::Disconnect, server_addr).await?;
    info!("Bot left after {} updates", updates_received);

    Ok(())
}
