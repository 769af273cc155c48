//! # Arena Client Library
//!
//! Client-side pieces of the arena shooter. The client never simulates the
//! world itself: it renders whatever the server says, smoothed over time.
//!
//! ## Architecture Overview
//!
//! ### Snapshot Interpolation
//! Snapshots arrive roughly every other server tick with network jitter on
//! top. The [`state::StateBuffer`] keeps a short history and reconstructs the
//! world as it was a fixed render delay ago, blending positions linearly and
//! headings along the shorter arc.
//!
//! ### Threading
//! macroquad drives rendering from the main thread. The UDP socket runs on a
//! separate thread with its own tokio runtime and exchanges packets with the
//! render loop over channels, so the snapshot buffer is only ever touched by
//! the render loop.
//!
//! ## Module Organization
//!
//! - `state`: snapshot buffer and interpolation
//! - `session`: connect/join retries and the menu, playing and game-over phases
//! - `input`: pointer steering and send throttling
//! - `network`: UDP transport thread, heartbeats, simulated latency
//! - `rendering`: macroquad drawing of the arena, hp bars and leaderboard

pub mod input;
pub mod network;
pub mod rendering;
pub mod session;
pub mod state;
