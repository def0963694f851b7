// Formula evaluation

pub mod eval;
pub mod functions;

pub use eval::{evaluate, parse_number, CellLookup};
pub use functions::RangeFn;
