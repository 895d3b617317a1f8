//! Client side of the farm line protocol.

use log::debug;
use shared::{Command, FarmSnapshot, Response};
use std::collections::VecDeque;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// A line received from the server, classified the way a UI consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Full snapshot replacing whatever farm view the client holds.
    State(FarmSnapshot),
    /// Anything else, shown to the player as-is.
    Status(String),
}

impl ServerMessage {
    pub fn from_line(line: &str) -> Self {
        match line.parse::<Response>() {
            Ok(Response::State(snapshot)) => ServerMessage::State(snapshot),
            _ => ServerMessage::Status(line.to_string()),
        }
    }
}

/// Reading half of a connection.
pub struct MessageStream<R = OwnedReadHalf> {
    lines: Lines<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> MessageStream<R> {
    pub fn new(reader: R) -> Self {
        MessageStream {
            lines: BufReader::new(reader).lines(),
        }
    }

    /// Waits for the next server line. `None` means the server hung up.
    pub async fn next_message(&mut self) -> io::Result<Option<ServerMessage>> {
        let line = self.lines.next_line().await?;
        Ok(line.map(|line| {
            debug!("< {}", line);
            ServerMessage::from_line(&line)
        }))
    }
}

/// Writing half of a connection.
pub struct CommandSender<W = OwnedWriteHalf> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> CommandSender<W> {
    pub fn new(writer: W) -> Self {
        CommandSender { writer }
    }

    pub async fn send(&mut self, command: &Command) -> io::Result<()> {
        self.send_raw(&command.to_string()).await
    }

    /// Sends a line exactly as typed; the server does the validation.
    pub async fn send_raw(&mut self, line: &str) -> io::Result<()> {
        debug!("> {}", line);
        self.writer
            .write_all(format!("{}\n", line.trim_end()).as_bytes())
            .await?;
        self.writer.flush().await
    }

    pub async fn login(&mut self, user: &str) -> io::Result<()> {
        self.send(&Command::Login {
            user: user.to_string(),
        })
        .await
    }

    pub async fn plant(&mut self, row: i32, col: i32) -> io::Result<()> {
        self.send(&Command::Plant { row, col }).await
    }

    pub async fn harvest(&mut self, row: i32, col: i32) -> io::Result<()> {
        self.send(&Command::Harvest { row, col }).await
    }

    pub async fn steal(&mut self, target: &str, row: i32, col: i32) -> io::Result<()> {
        self.send(&Command::Steal {
            target: target.to_string(),
            row,
            col,
        })
        .await
    }

    pub async fn query(&mut self, target: Option<&str>) -> io::Result<()> {
        self.send(&Command::Query {
            target: target.map(str::to_string),
        })
        .await
    }
}

/// A connected farm client.
///
/// Used directly for request/response exchanges, or split so one task can
/// keep reading while another sends.
pub struct FarmClient {
    messages: MessageStream,
    sender: CommandSender,
}

impl FarmClient {
    pub async fn connect(addr: &str) -> io::Result<Self> {
        let (reader, writer) = TcpStream::connect(addr).await?.into_split();
        Ok(FarmClient {
            messages: MessageStream::new(reader),
            sender: CommandSender::new(writer),
        })
    }

    pub fn into_split(self) -> (MessageStream, CommandSender) {
        (self.messages, self.sender)
    }

    pub fn sender(&mut self) -> &mut CommandSender {
        &mut self.sender
    }

    pub async fn next_message(&mut self) -> io::Result<Option<ServerMessage>> {
        self.messages.next_message().await
    }

    /// Sends one command and waits for its reply.
    pub async fn request(&mut self, command: &Command) -> io::Result<ServerMessage> {
        self.sender.send(command).await?;
        self.next_message().await?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "server closed the connection")
        })
    }
}

/// Requests still waiting for their reply, oldest first.
///
/// The server answers every line with exactly one line, in order, so the
/// front entry always belongs to the next reply. Queries remember the farm
/// they asked for, which is how a `STATE` reply is labelled after the
/// player has already switched to viewing another farm.
#[derive(Debug, Default)]
pub struct ReplyQueue {
    pending: VecDeque<Option<String>>,
}

impl ReplyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_query(&mut self, target: &str) {
        self.pending.push_back(Some(target.to_string()));
    }

    pub fn push_other(&mut self) {
        self.pending.push_back(None);
    }

    /// Consumes the entry answered by the reply just received.
    ///
    /// Returns the queried farm when that request was a query.
    pub fn pop(&mut self) -> Option<String> {
        self.pending.pop_front().flatten()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
