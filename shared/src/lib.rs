use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

mod protocol;

pub use protocol::{Command, ProtocolError, Response, Verb};

pub const GRID_ROWS: usize = 4;
pub const GRID_COLS: usize = 4;
pub const STARTING_COINS: u32 = 40;
pub const PLANT_COST: u32 = 5;
pub const MAX_YIELD: u32 = 4;
pub const UNIT_REWARD: u32 = 3;
pub const STEAL_REWARD: u32 = 3;
pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_GROWTH_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_RIPEN_WORKERS: usize = 4;
/// Longest request line a server accepts, excluding the line terminator.
pub const MAX_LINE_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlotState {
    Empty,
    Growing,
    Ripe,
}

impl fmt::Display for PlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotState::Empty => write!(f, "EMPTY"),
            PlotState::Growing => write!(f, "GROWING"),
            PlotState::Ripe => write!(f, "RIPE"),
        }
    }
}

impl FromStr for PlotState {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EMPTY" => Ok(PlotState::Empty),
            "GROWING" => Ok(PlotState::Growing),
            "RIPE" => Ok(PlotState::Ripe),
            other => Err(ProtocolError::MalformedState(format!(
                "unknown plot state {}",
                other
            ))),
        }
    }
}

/// One cell of a player's grid as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plot {
    pub state: PlotState,
    pub yield_units: u32,
}

impl Plot {
    pub fn empty() -> Self {
        Self {
            state: PlotState::Empty,
            yield_units: 0,
        }
    }
}

/// Full snapshot of one farm: the payload of a `STATE` line.
///
/// Formats as `<coins>|<state>:<yield>,...` with plots in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmSnapshot {
    pub coins: u32,
    pub plots: Vec<Plot>,
}

impl FarmSnapshot {
    pub fn plot(&self, row: usize, col: usize) -> Option<&Plot> {
        if row >= GRID_ROWS || col >= GRID_COLS {
            return None;
        }
        self.plots.get(row * GRID_COLS + col)
    }

    pub fn ripe_count(&self) -> usize {
        self.plots
            .iter()
            .filter(|plot| plot.state == PlotState::Ripe)
            .count()
    }
}

impl fmt::Display for FarmSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|", self.coins)?;
        for (i, plot) in self.plots.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}:{}", plot.state, plot.yield_units)?;
        }
        Ok(())
    }
}

impl FromStr for FarmSnapshot {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (coins, grid) = s
            .split_once('|')
            .ok_or_else(|| ProtocolError::MalformedState("missing '|' separator".to_string()))?;

        let coins = coins
            .trim()
            .parse::<u32>()
            .map_err(|_| ProtocolError::MalformedState(format!("bad coin count {}", coins)))?;

        let mut plots = Vec::with_capacity(GRID_ROWS * GRID_COLS);
        for cell in grid.split(',') {
            let (state, yield_units) = cell.split_once(':').ok_or_else(|| {
                ProtocolError::MalformedState(format!("bad plot entry {}", cell))
            })?;
            let yield_units = yield_units.trim().parse::<u32>().map_err(|_| {
                ProtocolError::MalformedState(format!("bad yield {}", yield_units))
            })?;
            plots.push(Plot {
                state: state.trim().parse()?,
                yield_units,
            });
        }

        if plots.len() != GRID_ROWS * GRID_COLS {
            return Err(ProtocolError::MalformedState(format!(
                "expected {} plots, got {}",
                GRID_ROWS * GRID_COLS,
                plots.len()
            )));
        }

        Ok(FarmSnapshot { coins, plots })
    }
}
