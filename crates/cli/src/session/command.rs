// Command-line (`:`) commands

use std::path::PathBuf;

use sheets_engine::address::{self, Bounds};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `q`, or `q!` to discard unsaved changes.
    Quit { force: bool },
    /// `w`, or `w <file>` to write under a new name.
    Write(Option<PathBuf>),
    /// `wq`
    WriteQuit,
    /// A cell address such as `C12`.
    Goto { row: usize, col: usize },
}

impl Command {
    /// Parse a command buffer. `None` means an unknown command.
    pub fn parse(input: &str, bounds: Bounds) -> Option<Self> {
        let input = input.trim();
        match input {
            "q" => return Some(Command::Quit { force: false }),
            "q!" => return Some(Command::Quit { force: true }),
            "w" => return Some(Command::Write(None)),
            "wq" => return Some(Command::WriteQuit),
            _ => {}
        }

        if let Some(file) = input.strip_prefix("w ") {
            let file = file.trim();
            return (!file.is_empty()).then(|| Command::Write(Some(PathBuf::from(file))));
        }

        address::decode(input, bounds)
            .ok()
            .map(|(row, col)| Command::Goto { row, col })
    }
}
