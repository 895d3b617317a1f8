//! Line protocol shared by the farm server and its clients.
//!
//! Every request is one line: a case-insensitive keyword followed by
//! whitespace-separated arguments. Every response is one line starting with
//! `SUCCESS`, `FAIL`, `ERROR` or `STATE`.

use crate::FarmSnapshot;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Unknown command")]
    UnknownCommand,

    #[error("Missing username")]
    MissingUsername,

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Malformed state: {0}")]
    MalformedState(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Request keyword, recognised before any argument is looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Login,
    Plant,
    Harvest,
    Query,
    Steal,
}

impl Verb {
    pub fn requires_login(self) -> bool {
        !matches!(self, Verb::Login | Verb::Query)
    }
}

impl FromStr for Verb {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOGIN" => Ok(Verb::Login),
            "PLANT" => Ok(Verb::Plant),
            "HARVEST" => Ok(Verb::Harvest),
            "QUERY" => Ok(Verb::Query),
            "STEAL" => Ok(Verb::Steal),
            _ => Err(ProtocolError::UnknownCommand),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { user: String },
    Plant { row: i32, col: i32 },
    Harvest { row: i32, col: i32 },
    Query { target: Option<String> },
    Steal { target: String, row: i32, col: i32 },
}

impl Command {
    /// Splits a raw line into its verb and argument tokens.
    pub fn split(line: &str) -> Result<(Verb, Vec<&str>), ProtocolError> {
        let mut tokens = line.split_whitespace();
        let verb = tokens
            .next()
            .ok_or(ProtocolError::UnknownCommand)?
            .parse::<Verb>()?;
        Ok((verb, tokens.collect()))
    }

    /// Builds a command from an already recognised verb. Extra trailing
    /// arguments are ignored.
    pub fn from_parts(verb: Verb, args: &[&str]) -> Result<Self, ProtocolError> {
        match verb {
            Verb::Login => {
                let user = args.first().ok_or(ProtocolError::MissingUsername)?;
                Ok(Command::Login {
                    user: user.to_string(),
                })
            }
            Verb::Plant => {
                let (row, col) = parse_coords(args, "PLANT <row> <col>")?;
                Ok(Command::Plant { row, col })
            }
            Verb::Harvest => {
                let (row, col) = parse_coords(args, "HARVEST <row> <col>")?;
                Ok(Command::Harvest { row, col })
            }
            Verb::Query => Ok(Command::Query {
                target: args.first().map(|target| target.to_string()),
            }),
            Verb::Steal => {
                const USAGE: &str = "STEAL <target_user> <row> <col>";
                if args.len() < 3 {
                    return Err(ProtocolError::Usage(USAGE));
                }
                let (row, col) = parse_coords(&args[1..], USAGE)?;
                Ok(Command::Steal {
                    target: args[0].to_string(),
                    row,
                    col,
                })
            }
        }
    }

    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let (verb, args) = Self::split(line)?;
        Self::from_parts(verb, &args)
    }

    pub fn verb(&self) -> Verb {
        match self {
            Command::Login { .. } => Verb::Login,
            Command::Plant { .. } => Verb::Plant,
            Command::Harvest { .. } => Verb::Harvest,
            Command::Query { .. } => Verb::Query,
            Command::Steal { .. } => Verb::Steal,
        }
    }
}

fn parse_coords(args: &[&str], usage: &'static str) -> Result<(i32, i32), ProtocolError> {
    match args {
        [row, col, ..] => Ok((parse_number(row)?, parse_number(col)?)),
        _ => Err(ProtocolError::Usage(usage)),
    }
}

fn parse_number(token: &str) -> Result<i32, ProtocolError> {
    token
        .parse::<i32>()
        .map_err(|_| ProtocolError::InvalidNumber(token.to_string()))
}

/// Formats the command as the line a client sends (without the newline).
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Login { user } => write!(f, "LOGIN {}", user),
            Command::Plant { row, col } => write!(f, "PLANT {} {}", row, col),
            Command::Harvest { row, col } => write!(f, "HARVEST {} {}", row, col),
            Command::Query { target: Some(target) } => write!(f, "QUERY {}", target),
            Command::Query { target: None } => write!(f, "QUERY"),
            Command::Steal { target, row, col } => {
                write!(f, "STEAL {} {} {}", target, row, col)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Success(String),
    Fail(String),
    Error(String),
    State(FarmSnapshot),
}

impl Response {
    pub fn is_state(&self) -> bool {
        matches!(self, Response::State(_))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Success(message) => write!(f, "SUCCESS {}", message),
            Response::Fail(message) => write!(f, "FAIL {}", message),
            Response::Error(message) => write!(f, "ERROR {}", message),
            Response::State(snapshot) => write!(f, "STATE {}", snapshot),
        }
    }
}

impl FromStr for Response {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']);
        let (keyword, rest) = line.split_once(' ').unwrap_or((line, ""));
        match keyword {
            "SUCCESS" => Ok(Response::Success(rest.to_string())),
            "FAIL" => Ok(Response::Fail(rest.to_string())),
            "ERROR" => Ok(Response::Error(rest.to_string())),
            "STATE" => Ok(Response::State(rest.parse()?)),
            _ => Err(ProtocolError::MalformedResponse(line.to_string())),
        }
    }
}
