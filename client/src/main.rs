use clap::Parser;
use client::{render_board, FarmClient, ReplyQueue, ServerMessage};
use log::{error, info};
use shared::DEFAULT_PORT;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, Duration, MissedTickBehavior};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
    server: String,

    /// Username to log in as
    #[arg(short = 'u', long)]
    user: String,

    /// How often to refresh the viewed farm, 0 disables polling
    #[arg(long, default_value = "1000")]
    poll_ms: u64,

    /// Print farm snapshots as JSON lines instead of a grid
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    info!("Connecting to: {}", args.server);
    let (mut messages, mut sender) = FarmClient::connect(&args.server).await?.into_split();
    let mut replies = ReplyQueue::new();
    sender.login(&args.user).await?;
    replies.push_other();

    println!("Commands: PLANT r c, HARVEST r c, STEAL user r c, QUERY [user]");
    println!("Local: VIEW user, HOME, QUIT");

    let mut viewing = args.user.clone();
    sender.query(Some(&viewing)).await?;
    replies.push_query(&viewing);

    let mut poll = interval(Duration::from_millis(args.poll_ms.max(1)));
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            message = messages.next_message() => {
                let owner = match &message {
                    Ok(Some(_)) => replies.pop(),
                    _ => None,
                };
                match message {
                    Ok(Some(ServerMessage::State(farm))) => {
                        let owner = owner.unwrap_or_else(|| viewing.clone());
                        if args.json {
                            println!("{}", serde_json::to_string(&farm)?);
                        } else {
                            println!("{}", render_board(&farm, &owner));
                        }
                    }
                    Ok(Some(ServerMessage::Status(text))) => println!("{}", text),
                    Ok(None) => {
                        println!("Server closed the connection");
                        break;
                    }
                    Err(e) => {
                        error!("Connection lost: {}", e);
                        break;
                    }
                }
            },

            _ = poll.tick(), if args.poll_ms > 0 => {
                sender.query(Some(&viewing)).await?;
                replies.push_query(&viewing);
            },

            line = stdin.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let mut words = line.split_whitespace();
                match words.next().map(str::to_ascii_uppercase).as_deref() {
                    Some("QUIT") => break,
                    Some("HOME") => {
                        viewing = args.user.clone();
                        sender.query(Some(&viewing)).await?;
                        replies.push_query(&viewing);
                    }
                    Some("VIEW") | Some("QUERY") => {
                        viewing = words
                            .next()
                            .map(str::to_string)
                            .unwrap_or_else(|| args.user.clone());
                        sender.query(Some(&viewing)).await?;
                        replies.push_query(&viewing);
                    }
                    Some(_) => {
                        sender.send_raw(&line).await?;
                        replies.push_other();
                    }
                    None => {}
                }
            },
        }
    }

    Ok(())
}
