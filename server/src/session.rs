//! Per-connection command handling.
//!
//! A session reads one line at a time, runs the command to completion and
//! writes exactly one response line before reading the next. Errors raised
//! by a command become an `ERROR` line; only a failed read or write ends the
//! session. A request line longer than `MAX_LINE_LEN` counts as a failed
//! read.

use crate::engine::{FarmError, PlotEngine};
use crate::registry::PlayerRegistry;
use log::{debug, info, warn};
use shared::{Command, ProtocolError, Response, Verb, MAX_LINE_LEN};
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Everything that can go wrong while executing a single command.
///
/// The display text is what follows `ERROR ` on the wire.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Farm(#[from] FarmError),

    #[error("Please login first")]
    NotLoggedIn,

    #[error("Not logged in and no target specified")]
    NoQueryTarget,

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Cannot steal from yourself")]
    SelfSteal,

    #[error("Target user not found")]
    UnknownTarget,
}

pub struct Session {
    registry: Arc<PlayerRegistry>,
    peer: String,
    user: Option<String>,
}

impl Session {
    pub fn new(registry: Arc<PlayerRegistry>, peer: impl Into<String>) -> Self {
        Self {
            registry,
            peer: peer.into(),
            user: None,
        }
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Serves the connection until the peer closes it or I/O fails.
    pub async fn run<R, W>(mut self, reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            // Room for a full-length line plus CRLF; anything longer is cut
            // short and fails the length check below.
            let read = (&mut reader)
                .take(MAX_LINE_LEN as u64 + 2)
                .read_line(&mut line)
                .await?;
            if read == 0 {
                break;
            }

            let request = line.trim_end_matches(['\r', '\n']);
            if request.len() > MAX_LINE_LEN {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("request line longer than {} bytes", MAX_LINE_LEN),
                ));
            }
            let response = self.handle_line(request);
            writer
                .write_all(format!("{}\n", response).as_bytes())
                .await?;
            writer.flush().await?;
        }

        Ok(())
    }

    /// Runs one protocol line and returns the response to send back.
    pub fn handle_line(&mut self, line: &str) -> Response {
        debug!("{} <- {}", self.peer, line);
        match self.execute(line) {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "Command from {} ({}) failed: {}",
                    self.peer,
                    self.user.as_deref().unwrap_or("anonymous"),
                    e
                );
                Response::Error(e.to_string())
            }
        }
    }

    fn execute(&mut self, line: &str) -> Result<Response, CommandError> {
        let (verb, args) = Command::split(line)?;
        if verb.requires_login() && self.user.is_none() {
            return Err(CommandError::NotLoggedIn);
        }
        // Stealing from yourself is refused before the coordinates are read.
        if verb == Verb::Steal && args.len() >= 3 && self.user.as_deref() == Some(args[0]) {
            return Err(CommandError::SelfSteal);
        }

        match Command::from_parts(verb, &args)? {
            Command::Login { user } => {
                self.registry.get_or_create(&user);
                info!("{} logged in as {}", self.peer, user);
                let response = Response::Success(format!("Logged in as {}", user));
                self.user = Some(user);
                Ok(response)
            }

            Command::Plant { row, col } => {
                self.own_engine()?.plant(row, col)?;
                Ok(Response::Success(format!("Planted at {},{}", row, col)))
            }

            Command::Harvest { row, col } => {
                let reward = self.own_engine()?.harvest(row, col)?;
                Ok(Response::Success(format!(
                    "Harvested at {},{}. Gained {}",
                    row, col, reward
                )))
            }

            Command::Query { target } => {
                let target = target
                    .or_else(|| self.user.clone())
                    .ok_or(CommandError::NoQueryTarget)?;
                let engine = self
                    .registry
                    .get(&target)
                    .ok_or(CommandError::UserNotFound(target))?;
                Ok(Response::State(engine.snapshot()))
            }

            Command::Steal { target, row, col } => {
                let victim = self
                    .registry
                    .get(&target)
                    .ok_or(CommandError::UnknownTarget)?;

                // Debit and credit are separate atomic steps on separate engines.
                let stolen = victim.steal(row, col)?;
                if stolen == 0 {
                    return Ok(Response::Fail(
                        "Could not steal (not ripe or already stolen)".to_string(),
                    ));
                }

                self.own_engine()?.add_coins(stolen);
                info!(
                    "{} stole {} from {} at {},{}",
                    self.user.as_deref().unwrap_or_default(),
                    stolen,
                    target,
                    row,
                    col
                );
                Ok(Response::Success(format!("Stole {} from {}", stolen, target)))
            }
        }
    }

    fn own_engine(&self) -> Result<Arc<PlotEngine>, CommandError> {
        let user = self.user.as_deref().ok_or(CommandError::NotLoggedIn)?;
        Ok(self.registry.get_or_create(user))
    }
}
