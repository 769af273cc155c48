//! UDP transport running beside the render loop
//!
//! macroquad owns the main thread, so the socket lives on a dedicated thread
//! with its own tokio runtime. The two sides talk over unbounded channels:
//! packets to send go in, decoded server packets come out and are drained by
//! the render loop once per frame.

use log::{debug, error, info, warn};
use shared::{decode_packet, encode_packet, Packet, MAX_PACKET_SIZE, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::thread;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, MissedTickBehavior};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Render-side end of the transport.
pub struct NetworkHandle {
    outgoing: mpsc::UnboundedSender<Packet>,
    incoming: mpsc::UnboundedReceiver<Packet>,
}

impl NetworkHandle {
    /// Starts the transport thread and sends `Connect` to `server`.
    ///
    /// `fake_ping_ms` delays each direction by half the value.
    pub fn spawn(server: &str, fake_ping_ms: u64) -> Result<Self, BoxError> {
        let server_addr: SocketAddr = server.parse()?;
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("network".to_string())
            .spawn(move || {
                let result: Result<(), BoxError> = runtime.block_on(async move {
                    let socket = UdpSocket::bind("0.0.0.0:0").await?;
                    run_transport(socket, server_addr, fake_ping_ms, out_rx, in_tx).await
                });
                if let Err(e) = result {
                    error!("Network thread stopped: {}", e);
                }
            })?;

        Ok(Self {
            outgoing: out_tx,
            incoming: in_rx,
        })
    }

    pub fn send(&self, packet: Packet) {
        if self.outgoing.send(packet).is_err() {
            error!("Network thread is gone, dropping packet");
        }
    }

    /// Next received packet, without blocking.
    pub fn try_recv(&mut self) -> Option<Packet> {
        self.incoming.try_recv().ok()
    }
}

/// Shuttles packets between `socket` and the channels until the render side
/// hangs up.
pub async fn run_transport(
    socket: UdpSocket,
    server_addr: SocketAddr,
    fake_ping_ms: u64,
    mut outgoing: mpsc::UnboundedReceiver<Packet>,
    incoming: mpsc::UnboundedSender<Packet>,
) -> Result<(), BoxError> {
    info!(
        "Connecting to {} from {}",
        server_addr,
        socket.local_addr()?
    );

    let one_way_delay = Duration::from_millis(fake_ping_ms / 2);
    send_packet(
        &socket,
        &Packet::Connect {
            client_version: PROTOCOL_VERSION,
        },
        server_addr,
    )
    .await?;

    let mut heartbeat = interval(HEARTBEAT_INTERVAL);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut buffer = vec![0u8; MAX_PACKET_SIZE];

    loop {
        tokio::select! {
            result = socket.recv_from(&mut buffer) => {
                let (len, addr) = match result {
                    Ok(received) => received,
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        continue;
                    }
                };
                if addr != server_addr {
                    debug!("Ignoring datagram from {}", addr);
                    continue;
                }

                let packet = match decode_packet(&buffer[..len]) {
                    Ok(packet) => packet,
                    Err(e) => {
                        warn!("Failed to decode packet from server: {}", e);
                        continue;
                    }
                };

                if one_way_delay.is_zero() {
                    if incoming.send(packet).is_err() {
                        break;
                    }
                } else {
                    let incoming = incoming.clone();
                    tokio::spawn(async move {
                        sleep(one_way_delay).await;
                        let _ = incoming.send(packet);
                    });
                }
            }

            packet = outgoing.recv() => {
                let Some(packet) = packet else {
                    break;
                };
                if !one_way_delay.is_zero() {
                    sleep(one_way_delay).await;
                }
                let is_disconnect = packet == Packet::Disconnect;
                if let Err(e) = send_packet(&socket, &packet, server_addr).await {
                    error!("Failed to send packet: {}", e);
                }
                if is_disconnect {
                    break;
                }
            }

            _ = heartbeat.tick() => {
                if let Err(e) = send_packet(&socket, &Packet::Heartbeat, server_addr).await {
                    error!("Failed to send heartbeat: {}", e);
                }
            }
        }
    }

    info!("Network transport shut down");
    Ok(())
}

async fn send_packet(socket: &UdpSocket, packet: &Packet, addr: SocketAddr) -> Result<(), BoxError> {
    let data = encode_packet(packet)?;
    socket.send_to(&data, addr).await?;
    Ok(())
}
