//! Scripted smoke run against a live server.
//!
//! Plays the basic round trip: log in two farmers, plant, wait for the crop,
//! harvest, then steal from the neighbour. Start the server with a short
//! growth time, e.g. `server --growth-secs 2`, and pass the same value here.

use shared::{Command, Response};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::sleep;

struct Farmer {
    name: String,
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Farmer {
    async fn connect(addr: &str, name: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let (reader, writer) = TcpStream::connect(addr).await?.into_split();
        Ok(Farmer {
            name: name.to_string(),
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    async fn send(&mut self, command: Command) -> Result<Response, Box<dyn std::error::Error>> {
        println!("[{}] > {}", self.name, command);
        self.writer
            .write_all(format!("{}\n", command).as_bytes())
            .await?;

        let line = self
            .lines
            .next_line()
            .await?
            .ok_or("server closed the connection")?;
        println!("[{}] < {}", self.name, line);
        Ok(line.parse()?)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:8888".to_string());
    let growth_secs: u64 = match args.next() {
        Some(secs) => secs.parse()?,
        None => 10,
    };

    let mut alice = Farmer::connect(&addr, "alice").await?;
    let mut bob = Farmer::connect(&addr, "bob").await?;

    alice
        .send(Command::Login {
            user: "alice".to_string(),
        })
        .await?;
    bob.send(Command::Login {
        user: "bob".to_string(),
    })
    .await?;

    alice.send(Command::Plant { row: 0, col: 0 }).await?;
    bob.send(Command::Plant { row: 1, col: 1 }).await?;

    let early = alice
        .send(Command::Steal {
            target: "bob".to_string(),
            row: 1,
            col: 1,
        })
        .await?;
    if !matches!(early, Response::Fail(_)) {
        println!("Unexpected: stealing an unripe crop did not fail");
    }

    println!("Waiting {}s for crops to ripen...", growth_secs + 1);
    sleep(Duration::from_secs(growth_secs + 1)).await;

    alice.send(Command::Harvest { row: 0, col: 0 }).await?;
    alice
        .send(Command::Steal {
            target: "bob".to_string(),
            row: 1,
            col: 1,
        })
        .await?;

    if let Response::State(snapshot) = bob.send(Command::Query { target: None }).await? {
        if let Some(plot) = snapshot.plot(1, 1) {
            println!("bob's plot 1,1 is {} with {} units left", plot.state, plot.yield_units);
        }
    }
    if let Response::State(snapshot) = alice.send(Command::Query { target: None }).await? {
        println!("alice finished with {} coins", snapshot.coins);
    }

    println!("Test client finished");
    Ok(())
}
