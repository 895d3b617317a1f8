//! # Farm Server Library
//!
//! This library provides the authoritative server for the multiplayer farming
//! game. Every player owns a small grid of plots that move through an
//! empty, growing and ripe lifecycle. Players harvest their own ripe crops
//! and may steal single yield units from other players' ripe crops.
//!
//! ## Core Responsibilities
//!
//! ### Per-Player State
//! Each player's coins and plots live in one [`engine::PlotEngine`]. All
//! operations on an engine are serialized behind a single lock, so the
//! effect of concurrent commands against one farm always matches some
//! serial order.
//!
//! ### Timed Growth
//! Planting schedules a one-shot ripen on the shared
//! [`scheduler::GrowthScheduler`]. Timers are tagged with the growth cycle
//! they belong to and re-check the plot before changing it, so a stale timer
//! can never touch a newer crop.
//!
//! ### Connections
//! The [`network::FarmServer`] accepts TCP connections and spawns one
//! [`session::Session`] task per client. Sessions speak a newline-delimited
//! text protocol (see the `shared` crate) and process their own commands
//! strictly in arrival order.
//!
//! ## Module Organization
//!
//! - `config`: server settings and their defaults
//! - `engine`: plot state machine, yield accounting and coin balance
//! - `scheduler`: bounded pool driving delayed growth transitions
//! - `registry`: username to engine mapping with create-on-first-use
//! - `session`: per-connection command parsing and dispatch
//! - `network`: the TCP accept loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::FarmServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = FarmServer::bind(&ServerConfig::default()).await?;
//!
//!     // Runs forever, one task per connected client.
//!     server.run().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Known Gaps
//!
//! A steal removes the unit from the victim and credits the thief in two
//! separate steps. Nothing is persisted, so a crash between them loses the
//! stolen coins along with everything else.

pub mod config;
pub mod engine;
pub mod network;
pub mod registry;
pub mod scheduler;
pub mod session;
