//! # Arena Server Library
//!
//! This library provides the authoritative server for the arena shooter. It owns
//! the only real copy of the world, advances it on a fixed cadence, and sends
//! every connected player a personalized snapshot of what is around them.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Players steer by sending a facing direction and fire automatically. All
//! movement, firing, hit detection and scoring happens here; clients only
//! render what they are told.
//!
//! ### Client Management
//! Handles the lifecycle of connections:
//! - Connection establishment and client ID assignment
//! - Joining and leaving the arena
//! - Timeout detection and cleanup
//!
//! ### State Broadcasting
//! Every other tick the server builds one snapshot per player, culled to the
//! entities within that player's view radius, and sends it with the
//! leaderboard attached.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! Packet handling and simulation ticks run sequentially from one
//! `tokio::select!` loop, so the world needs no locking. Helper tasks only
//! move datagrams and timeout notices over channels.
//!
//! ### Measured Time Steps
//! Each tick advances the world by the wall-clock time that actually elapsed
//! since the previous one, so scheduler jitter changes step size, not speed.
//!
//! ## Module Organization
//!
//! ### Entity Module (`entity`)
//! Kinematic body shared by all objects, plus players and bullets.
//!
//! ### Collisions Module (`collisions`)
//! Bullet against player hit detection and damage.
//!
//! ### Game Module (`game`)
//! The simulation loop, leaderboard and snapshot construction.
//!
//! ### Client Manager Module (`client_manager`)
//! Address to client ID mapping, capacity limits and timeouts.
//!
//! ### Network Module (`network`)
//! UDP socket tasks and the main server loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::{BoxError, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BoxError> {
//!     let config = ServerConfig {
//!         bind_addr: "127.0.0.1:8080".to_string(),
//!         ..ServerConfig::default()
//!     };
//!
//!     let mut server = Server::new(config).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod collisions;
pub mod config;
pub mod entity;
pub mod game;
pub mod network;
