use shared::{FarmSnapshot, PlotState, GRID_COLS, GRID_ROWS};
use std::fmt::Write;

/// Renders a snapshot as a small text grid.
///
/// Empty plots show `.`, growing plots `~`, ripe plots `*` followed by the
/// remaining yield units.
pub fn render_board(snapshot: &FarmSnapshot, owner: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}'s farm ({} coins)", owner, snapshot.coins);

    out.push_str("   ");
    for col in 0..GRID_COLS {
        let _ = write!(out, "{:<4}", col);
    }
    out.push('\n');

    for row in 0..GRID_ROWS {
        let _ = write!(out, "{:<3}", row);
        for col in 0..GRID_COLS {
            let cell = match snapshot.plot(row, col) {
                Some(plot) => match plot.state {
                    PlotState::Empty => ".".to_string(),
                    PlotState::Growing => "~".to_string(),
                    PlotState::Ripe => format!("*{}", plot.yield_units),
                },
                None => "?".to_string(),
            };
            let _ = write!(out, "{:<4}", cell);
        }
        out.push('\n');
    }

    out
}
