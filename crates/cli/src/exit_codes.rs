//! Exit codes for the `sheets` binary.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success (normal quit, `--version`, `--help`)        |
//! | 1    | Fatal error (grid allocation, terminal, failed write) |
//! | 2    | Usage error (unknown flag, extra arguments)         |

/// Success - session ended by a quit command.
pub const EXIT_SUCCESS: u8 = 0;

/// Fatal error - the diagnostic has been printed to stderr.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments.
pub const EXIT_USAGE: u8 = 2;
