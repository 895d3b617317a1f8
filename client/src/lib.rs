//! # Farm Client Library
//!
//! A headless client for the farm server's line protocol. It handles the
//! connection, formats requests with the shared `Command` type and sorts
//! incoming lines into full farm snapshots and status messages.
//!
//! ## Protocol Contract
//!
//! A client logs in once per connection, then may poll `QUERY` as often as
//! it likes. Any line starting with `STATE ` replaces the local view of the
//! farm being looked at; every other line is a human-readable status.
//!
//! ## Module Organization
//!
//! - `network`: connection, command sending, message classification and
//!   matching replies to the requests they answer
//! - `board`: plain-text rendering of a farm snapshot
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::{FarmClient, ServerMessage};
//! use shared::Command;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = FarmClient::connect("127.0.0.1:8888").await?;
//!     client.request(&Command::Login { user: "alice".to_string() }).await?;
//!
//!     if let ServerMessage::State(farm) = client.request(&Command::Query { target: None }).await? {
//!         println!("{}", client::render_board(&farm, "alice"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod board;
pub mod network;

pub use board::render_board;
pub use network::{CommandSender, FarmClient, MessageStream, ReplyQueue, ServerMessage};
