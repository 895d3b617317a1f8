//! Per-player farm state.
//!
//! A `PlotEngine` owns one player's coins and plot grid. Every operation
//! takes the same mutex for its whole duration, so concurrent calls against
//! one engine behave as if they ran one after another. Cross-engine work
//! (a steal paying the thief) is two separate calls and never holds two
//! engine locks at once.

use crate::scheduler::GrowthScheduler;
use log::debug;
use shared::{
    FarmSnapshot, Plot, PlotState, GRID_COLS, GRID_ROWS, MAX_YIELD, PLANT_COST, STARTING_COINS,
    STEAL_REWARD, UNIT_REWARD,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FarmError {
    #[error("Invalid coordinate {row},{col}")]
    InvalidCoordinate { row: i32, col: i32 },

    #[error("Plot occupied")]
    PlotOccupied,

    #[error("Not enough coins")]
    InsufficientFunds,

    #[error("Crop not ripe")]
    CropNotRipe,
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    state: PlotState,
    yield_units: u32,
    /// Bumped on every plant; growth timers carry the value they were
    /// scheduled with.
    cycle: u64,
}

impl Cell {
    fn empty() -> Self {
        Self {
            state: PlotState::Empty,
            yield_units: 0,
            cycle: 0,
        }
    }

    fn clear(&mut self) {
        self.state = PlotState::Empty;
        self.yield_units = 0;
    }
}

#[derive(Debug)]
struct Farm {
    coins: u32,
    grid: [[Cell; GRID_COLS]; GRID_ROWS],
}

#[derive(Debug)]
pub struct PlotEngine {
    farm: Mutex<Farm>,
    scheduler: GrowthScheduler,
}

impl PlotEngine {
    pub fn new(scheduler: GrowthScheduler) -> Self {
        Self {
            farm: Mutex::new(Farm {
                coins: STARTING_COINS,
                grid: [[Cell::empty(); GRID_COLS]; GRID_ROWS],
            }),
            scheduler,
        }
    }

    // Every critical section leaves the farm consistent, so a panic in
    // another holder does not invalidate the data.
    fn lock(&self) -> MutexGuard<'_, Farm> {
        self.farm.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn index(row: i32, col: i32) -> Result<(usize, usize), FarmError> {
        match (usize::try_from(row), usize::try_from(col)) {
            (Ok(r), Ok(c)) if r < GRID_ROWS && c < GRID_COLS => Ok((r, c)),
            _ => Err(FarmError::InvalidCoordinate { row, col }),
        }
    }

    pub fn coins(&self) -> u32 {
        self.lock().coins
    }

    pub fn state(&self, row: i32, col: i32) -> Result<PlotState, FarmError> {
        let (r, c) = Self::index(row, col)?;
        Ok(self.lock().grid[r][c].state)
    }

    pub fn plot(&self, row: i32, col: i32) -> Result<Plot, FarmError> {
        let (r, c) = Self::index(row, col)?;
        let cell = self.lock().grid[r][c];
        Ok(Plot {
            state: cell.state,
            yield_units: cell.yield_units,
        })
    }

    /// Plants a crop and schedules it to ripen after the growth delay.
    pub fn plant(self: &Arc<Self>, row: i32, col: i32) -> Result<(), FarmError> {
        let (r, c) = Self::index(row, col)?;
        let mut farm = self.lock();

        if farm.grid[r][c].state != PlotState::Empty {
            return Err(FarmError::PlotOccupied);
        }
        if farm.coins < PLANT_COST {
            return Err(FarmError::InsufficientFunds);
        }

        farm.coins -= PLANT_COST;
        let cell = &mut farm.grid[r][c];
        cell.state = PlotState::Growing;
        cell.yield_units = 0;
        cell.cycle += 1;
        let cycle = cell.cycle;

        self.scheduler.schedule_ripen(
            Arc::clone(self),
            r,
            c,
            cycle,
            self.scheduler.growth_delay(),
        );
        Ok(())
    }

    /// Growth timer callback. Returns whether the plot actually ripened.
    ///
    /// A timer from an older cycle, or one that fires after the plot left
    /// the `Growing` state, is a no-op.
    pub(crate) fn ripen(&self, row: usize, col: usize, cycle: u64) -> bool {
        let mut farm = self.lock();
        let Some(cell) = farm.grid.get_mut(row).and_then(|cells| cells.get_mut(col)) else {
            return false;
        };

        if cell.state != PlotState::Growing || cell.cycle != cycle {
            debug!("Stale growth timer for plot {},{} ignored", row, col);
            return false;
        }

        cell.state = PlotState::Ripe;
        cell.yield_units = MAX_YIELD;
        true
    }

    #[cfg(test)]
    pub(crate) fn force_ripe(&self, row: i32, col: i32) -> bool {
        let Ok((r, c)) = Self::index(row, col) else {
            return false;
        };
        let cycle = self.lock().grid[r][c].cycle;
        self.ripen(r, c, cycle)
    }

    /// Harvests a ripe plot, returning the coins gained.
    pub fn harvest(&self, row: i32, col: i32) -> Result<u32, FarmError> {
        let (r, c) = Self::index(row, col)?;
        let mut farm = self.lock();

        let cell = &mut farm.grid[r][c];
        if cell.state != PlotState::Ripe {
            return Err(FarmError::CropNotRipe);
        }

        let reward = cell.yield_units * UNIT_REWARD;
        cell.clear();
        farm.coins = farm.coins.saturating_add(reward);
        Ok(reward)
    }

    /// Takes one yield unit from a ripe plot, returning the thief's reward.
    ///
    /// Returns 0 when the plot is not ripe or only one unit is left; the
    /// owner always keeps at least one unit.
    pub fn steal(&self, row: i32, col: i32) -> Result<u32, FarmError> {
        let (r, c) = Self::index(row, col)?;
        let mut farm = self.lock();

        let cell = &mut farm.grid[r][c];
        if cell.state != PlotState::Ripe || cell.yield_units <= 1 {
            return Ok(0);
        }

        cell.yield_units -= 1;
        Ok(STEAL_REWARD)
    }

    pub fn add_coins(&self, amount: u32) {
        let mut farm = self.lock();
        farm.coins = farm.coins.saturating_add(amount);
    }

    pub fn snapshot(&self) -> FarmSnapshot {
        let farm = self.lock();
        FarmSnapshot {
            coins: farm.coins,
            plots: farm
                .grid
                .iter()
                .flatten()
                .map(|cell| Plot {
                    state: cell.state,
                    yield_units: cell.yield_units,
                })
                .collect(),
        }
    }

    /// Wire form of the snapshot, as sent after `STATE `.
    pub fn serialize(&self) -> String {
        self.snapshot().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::runtime::Handle;

    fn engine_with_delay(delay: Duration) -> Arc<PlotEngine> {
        let scheduler = GrowthScheduler::new(Handle::current(), 4, delay);
        Arc::new(PlotEngine::new(scheduler))
    }

    // Growth never completes on its own within a test.
    fn slow_engine() -> Arc<PlotEngine> {
        engine_with_delay(Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_new_engine() {
        let engine = slow_engine();
        assert_eq!(engine.coins(), STARTING_COINS);
        assert_eq!(engine.state(3, 3).unwrap(), PlotState::Empty);
        assert_eq!(engine.plot(0, 0).unwrap(), Plot::empty());
    }

    #[tokio::test]
    async fn test_out_of_bounds() {
        let engine = slow_engine();
        assert_eq!(
            engine.state(4, 0).unwrap_err(),
            FarmError::InvalidCoordinate { row: 4, col: 0 }
        );
        assert!(engine.plant(-1, 0).is_err());
        assert!(engine.harvest(0, 99).is_err());
        assert!(engine.steal(7, 7).is_err());
        assert_eq!(engine.coins(), STARTING_COINS);
    }

    #[tokio::test]
    async fn test_plant_deducts_cost() {
        let engine = slow_engine();
        engine.plant(0, 0).unwrap();

        assert_eq!(engine.coins(), STARTING_COINS - PLANT_COST);
        let plot = engine.plot(0, 0).unwrap();
        assert_eq!(plot.state, PlotState::Growing);
        assert_eq!(plot.yield_units, 0);
    }

    #[tokio::test]
    async fn test_harvest_saturates_balance() {
        let engine = slow_engine();
        engine.plant(0, 0).unwrap();
        assert!(engine.force_ripe(0, 0));
        engine.add_coins(u32::MAX - 40);

        assert_eq!(engine.harvest(0, 0).unwrap(), MAX_YIELD * UNIT_REWARD);
        assert_eq!(engine.coins(), u32::MAX);
        assert_eq!(engine.plot(0, 0).unwrap(), Plot::empty());
    }

    #[tokio::test]
    async fn test_plant_occupied() {
        let engine = slow_engine();
        engine.plant(1, 2).unwrap();
        assert_eq!(engine.plant(1, 2).unwrap_err(), FarmError::PlotOccupied);
        assert_eq!(engine.coins(), STARTING_COINS - PLANT_COST);
    }

    #[tokio::test]
    async fn test_plant_insufficient_funds() {
        let engine = slow_engine();
        // 40 coins buys exactly eight crops.
        for i in 0..8 {
            engine.plant(i / 4, i % 4).unwrap();
        }
        assert_eq!(engine.coins(), 0);
        assert_eq!(
            engine.plant(2, 0).unwrap_err(),
            FarmError::InsufficientFunds
        );
        assert_eq!(engine.state(2, 0).unwrap(), PlotState::Empty);
    }

    #[tokio::test]
    async fn test_harvest_not_ripe() {
        let engine = slow_engine();
        assert_eq!(engine.harvest(0, 0).unwrap_err(), FarmError::CropNotRipe);

        engine.plant(0, 0).unwrap();
        assert_eq!(engine.harvest(0, 0).unwrap_err(), FarmError::CropNotRipe);
        assert_eq!(engine.state(0, 0).unwrap(), PlotState::Growing);
        assert_eq!(engine.coins(), STARTING_COINS - PLANT_COST);
    }

    #[tokio::test]
    async fn test_harvest_ripe() {
        let engine = slow_engine();
        engine.plant(0, 0).unwrap();
        assert!(engine.force_ripe(0, 0));

        let reward = engine.harvest(0, 0).unwrap();
        assert_eq!(reward, MAX_YIELD * UNIT_REWARD);
        assert_eq!(engine.coins(), 47);
        assert_eq!(engine.plot(0, 0).unwrap(), Plot::empty());
    }

    #[tokio::test]
    async fn test_harvest_after_steals() {
        let engine = slow_engine();
        engine.plant(2, 2).unwrap();
        assert!(engine.force_ripe(2, 2));
        engine.steal(2, 2).unwrap();

        assert_eq!(engine.harvest(2, 2).unwrap(), 3 * UNIT_REWARD);
    }

    #[tokio::test]
    async fn test_steal_converges_to_one_unit() {
        let engine = slow_engine();
        engine.plant(1, 1).unwrap();
        assert!(engine.force_ripe(1, 1));

        let mut stolen = Vec::new();
        for _ in 0..6 {
            stolen.push(engine.steal(1, 1).unwrap());
        }

        assert_eq!(stolen, vec![3, 3, 3, 0, 0, 0]);
        let plot = engine.plot(1, 1).unwrap();
        assert_eq!(plot.state, PlotState::Ripe);
        assert_eq!(plot.yield_units, 1);
    }

    #[tokio::test]
    async fn test_steal_not_ripe_is_zero() {
        let engine = slow_engine();
        assert_eq!(engine.steal(0, 0).unwrap(), 0);

        engine.plant(0, 0).unwrap();
        assert_eq!(engine.steal(0, 0).unwrap(), 0);
        assert_eq!(engine.plot(0, 0).unwrap().yield_units, 0);
    }

    #[tokio::test]
    async fn test_steal_does_not_pay_owner() {
        let engine = slow_engine();
        engine.plant(0, 0).unwrap();
        assert!(engine.force_ripe(0, 0));
        let coins = engine.coins();

        engine.steal(0, 0).unwrap();
        assert_eq!(engine.coins(), coins);
    }

    #[tokio::test]
    async fn test_add_coins() {
        let engine = slow_engine();
        engine.add_coins(STEAL_REWARD);
        assert_eq!(engine.coins(), STARTING_COINS + STEAL_REWARD);
    }

    #[tokio::test]
    async fn test_stale_timer_is_ignored() {
        let engine = slow_engine();
        engine.plant(0, 0).unwrap();
        let first_cycle = engine.lock().grid[0][0].cycle;
        assert!(engine.force_ripe(0, 0));
        engine.harvest(0, 0).unwrap();
        engine.plant(0, 0).unwrap();

        assert!(!engine.ripen(0, 0, first_cycle));
        assert_eq!(engine.state(0, 0).unwrap(), PlotState::Growing);
    }

    #[tokio::test]
    async fn test_ripen_only_once() {
        let engine = slow_engine();
        engine.plant(0, 0).unwrap();
        assert!(engine.force_ripe(0, 0));
        engine.steal(0, 0).unwrap();

        let cycle = engine.lock().grid[0][0].cycle;
        assert!(!engine.ripen(0, 0, cycle));
        assert_eq!(engine.plot(0, 0).unwrap().yield_units, MAX_YIELD - 1);
    }

    #[tokio::test]
    async fn test_natural_growth() {
        let engine = engine_with_delay(Duration::from_millis(50));
        engine.plant(3, 0).unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;
        let plot = engine.plot(3, 0).unwrap();
        assert_eq!(plot.state, PlotState::Ripe);
        assert_eq!(plot.yield_units, MAX_YIELD);
    }

    #[tokio::test]
    async fn test_serialize() {
        let engine = slow_engine();
        engine.plant(0, 1).unwrap();

        let text = engine.serialize();
        assert!(text.starts_with("35|EMPTY:0,GROWING:0,EMPTY:0"));
        assert_eq!(text.parse::<FarmSnapshot>().unwrap(), engine.snapshot());
    }
}
