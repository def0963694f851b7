pub mod address;
pub mod cell;
pub mod formula;
pub mod grid;
pub mod recalc;

pub use address::{AddressError, Bounds};
pub use cell::{Cell, FORMULA_MARKER, MAX_CELL_TEXT};
pub use grid::{Grid, GridError};
pub use recalc::{recalc, RecalcReport};
