//! Modal edit session: turns key events into grid mutations, cursor and
//! viewport moves, and recalculation.
//!
//! The session owns the grid. Every confirmed mutation (edit, clear, paste,
//! load) is followed by one full recalculation pass; navigation never
//! recalculates.

mod command;
mod edit;

pub use command::Command;
pub use edit::EditBuffer;

use std::mem;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use sheets_engine::{address, recalc, Grid};
use sheets_io::CsvError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: CsvError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Edit(EditBuffer),
    Command(String),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Edit(_) => "EDIT",
            Mode::Command(_) => "COMMAND",
        }
    }
}

/// Whether the driver loop should keep running after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Visible window of the grid: top-left cell plus how many rows and
/// columns fit on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub top: usize,
    pub left: usize,
    pub rows: usize,
    pub cols: usize,
}

pub struct Session {
    grid: Grid,
    cursor: (usize, usize),
    viewport: Viewport,
    mode: Mode,
    yank: String,
    dirty: bool,
    status: Option<String>,
    filename: Option<PathBuf>,
    separator: u8,
}

impl Session {
    pub fn new(grid: Grid, separator: u8) -> Self {
        Self {
            grid,
            cursor: (0, 0),
            viewport: Viewport {
                top: 0,
                left: 0,
                rows: 1,
                cols: 1,
            },
            mode: Mode::Normal,
            yank: String::new(),
            dirty: false,
            status: None,
            filename: None,
            separator,
        }
    }

    /// Load `path` into the grid and make it the session's file. A missing
    /// file leaves the grid empty; it is created on the first write.
    pub fn load(&mut self, path: &Path) -> Result<(), CsvError> {
        sheets_io::csv::load_or_new(&mut self.grid, path, self.separator)?;
        self.filename = Some(path.to_path_buf());
        self.dirty = false;
        recalc(&mut self.grid);
        Ok(())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Cursor as `(row, col)`.
    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn yank(&self) -> &str {
        &self.yank
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Canonical address of the cursor cell.
    pub fn cursor_address(&self) -> String {
        let (row, col) = self.cursor;
        address::encode(row, col, self.grid.bounds()).unwrap_or_default()
    }

    /// Record how many rows and columns the renderer can show and scroll
    /// the cursor back into view.
    pub fn set_view_size(&mut self, rows: usize, cols: usize) {
        self.viewport.rows = rows.max(1);
        self.viewport.cols = cols.max(1);
        self.scroll_to_cursor();
    }

    /// Handle one key press.
    ///
    /// `Err` only for a failed write, which the caller treats as fatal.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<Flow, SessionError> {
        let before = self.mode.name();
        let flow = match mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Normal => self.handle_normal(key)?,
            Mode::Edit(buf) => {
                self.handle_edit(buf, key);
                Flow::Continue
            }
            Mode::Command(buf) => self.handle_command(buf, key)?,
        };
        let after = self.mode.name();
        if before != after {
            log::debug!("mode {} -> {}", before, after);
        }
        Ok(flow)
    }

    fn handle_normal(&mut self, key: KeyEvent) -> Result<Flow, SessionError> {
        self.status = None;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') if ctrl => return Ok(self.quit(false)),
            _ if ctrl => {}
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1, 0),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1, 0),
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(0, -1),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(0, 1),
            KeyCode::PageUp => self.move_cursor(-(self.viewport.rows as isize), 0),
            KeyCode::PageDown => self.move_cursor(self.viewport.rows as isize, 0),
            KeyCode::Home | KeyCode::Char('0') => self.goto(self.cursor.0, 0),
            KeyCode::End | KeyCode::Char('$') => self.goto(self.cursor.0, self.grid.cols() - 1),
            KeyCode::Char('g') => self.goto(0, 0),
            KeyCode::Char('G') => self.goto(self.grid.rows() - 1, self.cursor.1),
            KeyCode::Char('=') => self.mode = Mode::Edit(EditBuffer::with_text("=")),
            KeyCode::Char('i') => self.mode = Mode::Edit(EditBuffer::new()),
            KeyCode::Char('e') | KeyCode::F(2) | KeyCode::Enter => {
                let (row, col) = self.cursor;
                self.mode = Mode::Edit(EditBuffer::with_text(self.grid.text(row, col)));
            }
            KeyCode::Char('x') | KeyCode::Delete => self.clear_cell(),
            KeyCode::Char('y') => {
                let (row, col) = self.cursor;
                self.yank = self.grid.text(row, col).to_string();
            }
            KeyCode::Char('p') => self.paste(),
            KeyCode::Char(':') => self.mode = Mode::Command(String::new()),
            KeyCode::Char('q') => return Ok(self.quit(false)),
            KeyCode::Char(c) if !c.is_control() => {
                let mut buf = EditBuffer::new();
                buf.insert(c);
                self.mode = Mode::Edit(buf);
            }
            _ => {}
        }
        Ok(Flow::Continue)
    }

    fn handle_edit(&mut self, mut buf: EditBuffer, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => return,
            KeyCode::Enter => {
                self.commit(buf.into_text());
                self.move_cursor(1, 0);
                return;
            }
            KeyCode::Tab => {
                self.commit(buf.into_text());
                return;
            }
            KeyCode::Char('a') if ctrl => buf.home(),
            KeyCode::Char('e') if ctrl => buf.end(),
            KeyCode::Char('u') if ctrl => buf.clear(),
            KeyCode::Char(c) if !ctrl && !c.is_control() => {
                buf.insert(c);
            }
            KeyCode::Backspace => buf.backspace(),
            KeyCode::Delete => buf.delete(),
            KeyCode::Left => buf.left(),
            KeyCode::Right => buf.right(),
            KeyCode::Home => buf.home(),
            KeyCode::End => buf.end(),
            _ => {}
        }
        self.mode = Mode::Edit(buf);
    }

    fn handle_command(&mut self, mut buf: String, key: KeyEvent) -> Result<Flow, SessionError> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => self.status = None,
            KeyCode::Enter => return self.execute(&buf),
            KeyCode::Backspace => {
                // Backspace on an empty line leaves command mode.
                if buf.pop().is_some() {
                    self.mode = Mode::Command(buf);
                }
            }
            KeyCode::Char(c) if !ctrl && !c.is_control() => {
                buf.push(c);
                self.mode = Mode::Command(buf);
            }
            _ => self.mode = Mode::Command(buf),
        }
        Ok(Flow::Continue)
    }

    fn execute(&mut self, input: &str) -> Result<Flow, SessionError> {
        let Some(command) = Command::parse(input, self.grid.bounds()) else {
            log::debug!("unknown command {:?}", input);
            self.status = Some(format!("unknown command: {}", input.trim()));
            return Ok(Flow::Continue);
        };
        log::debug!("command {:?}", command);

        match command {
            Command::Quit { force } => Ok(self.quit(force)),
            Command::Write(path) => {
                if let Some(path) = path {
                    self.filename = Some(path);
                }
                self.write()?;
                Ok(Flow::Continue)
            }
            Command::WriteQuit => {
                if self.write()? {
                    Ok(Flow::Quit)
                } else {
                    Ok(Flow::Continue)
                }
            }
            Command::Goto { row, col } => {
                self.goto(row, col);
                Ok(Flow::Continue)
            }
        }
    }

    /// Write to the session's file. `Ok(false)` if no file name is known.
    fn write(&mut self) -> Result<bool, SessionError> {
        let Some(path) = self.filename.clone() else {
            self.status = Some("no file name (use :w <file>)".to_string());
            return Ok(false);
        };
        sheets_io::csv::write(&self.grid, &path, self.separator)
            .map_err(|source| SessionError::Write {
                path: path.clone(),
                source,
            })?;
        self.dirty = false;
        self.status = Some(format!("\"{}\" written", path.display()));
        Ok(true)
    }

    fn quit(&mut self, force: bool) -> Flow {
        if self.dirty && !force {
            self.status = Some("unsaved changes (use :q! to discard)".to_string());
            return Flow::Continue;
        }
        Flow::Quit
    }

    fn commit(&mut self, text: String) {
        let (row, col) = self.cursor;
        self.grid.set_text(row, col, &text);
        self.dirty = true;
        recalc(&mut self.grid);
    }

    fn clear_cell(&mut self) {
        let (row, col) = self.cursor;
        self.yank = self.grid.clear(row, col);
        if !self.yank.is_empty() {
            self.dirty = true;
        }
        recalc(&mut self.grid);
    }

    fn paste(&mut self) {
        if self.yank.is_empty() {
            return;
        }
        let (row, col) = self.cursor;
        self.grid.set_text(row, col, &self.yank);
        self.dirty = true;
        recalc(&mut self.grid);
    }

    fn move_cursor(&mut self, drow: isize, dcol: isize) {
        let row = self.cursor.0.saturating_add_signed(drow);
        let col = self.cursor.1.saturating_add_signed(dcol);
        self.goto(row, col);
    }

    /// Move the cursor, clamped to the grid, and scroll it into view.
    fn goto(&mut self, row: usize, col: usize) {
        self.cursor = (row.min(self.grid.rows() - 1), col.min(self.grid.cols() - 1));
        self.scroll_to_cursor();
    }

    /// Minimal viewport shift that brings the cursor into view.
    fn scroll_to_cursor(&mut self) {
        let (row, col) = self.cursor;
        let vp = &mut self.viewport;
        if row < vp.top {
            vp.top = row;
        } else if row >= vp.top + vp.rows {
            vp.top = row + 1 - vp.rows;
        }
        if col < vp.left {
            vp.left = col;
        } else if col >= vp.left + vp.cols {
            vp.left = col + 1 - vp.cols;
        }
    }
}
