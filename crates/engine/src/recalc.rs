//! Full-grid recalculation.
//!
//! One pass over every cell in row-major order, deriving `value` from
//! `text`. There is no dependency ordering: a formula that refers to a cell
//! later in the pass sees that cell's value from the previous pass, and a
//! self-reference sees its own stale value. Repeating the pass is the only
//! way such values settle.

use std::time::{Duration, Instant};

use crate::cell::{Cell, FORMULA_MARKER};
use crate::formula::{evaluate, parse_number};
use crate::grid::Grid;

/// What one recalculation pass saw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecalcReport {
    /// Cells whose text starts with the formula marker.
    pub formulas: usize,
    /// Literal cells that parsed as a number.
    pub numbers: usize,
    /// Non-blank literal cells that are not numbers.
    pub texts: usize,
    pub duration: Duration,
}

impl RecalcReport {
    /// One-line summary for logging.
    pub fn summary(&self) -> String {
        format!(
            "{} formulas, {} numbers, {} text in {}us",
            self.formulas,
            self.numbers,
            self.texts,
            self.duration.as_micros()
        )
    }
}

enum Kind {
    Formula(f64),
    Number(f64),
    Text,
    Blank,
}

fn classify(cell: &Cell, grid: &Grid) -> Kind {
    if cell.is_blank() {
        return Kind::Blank;
    }
    if cell.is_formula() {
        let expr = &cell.text()[FORMULA_MARKER.len_utf8()..];
        return Kind::Formula(evaluate(expr, grid));
    }
    match parse_number(cell.text()) {
        Some(n) => Kind::Number(n),
        None => Kind::Text,
    }
}

/// Recompute every cell's derived value from its text.
pub fn recalc(grid: &mut Grid) -> RecalcReport {
    let start = Instant::now();
    let mut report = RecalcReport::default();

    for index in 0..grid.len() {
        let value = match classify(grid.cell_at(index), grid) {
            Kind::Formula(v) => {
                report.formulas += 1;
                Some(v)
            }
            Kind::Number(n) => {
                report.numbers += 1;
                Some(n)
            }
            Kind::Text => {
                report.texts += 1;
                None
            }
            Kind::Blank => None,
        };
        grid.cell_at_mut(index).set_value(value);
    }

    report.duration = start.elapsed();
    log::debug!("recalc: {}", report.summary());
    report
}
