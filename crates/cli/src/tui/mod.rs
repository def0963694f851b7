use std::io::{self, stdout};

use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use sheets_cli::session::{Flow, Mode, Session, SessionError};
use sheets_engine::address::col_to_letters;
use thiserror::Error;

use crate::util;

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Title, formula line and status line, plus the column header row.
const CHROME_ROWS: u16 = 4;

struct TuiApp<'a> {
    session: &'a mut Session,
    /// Screen columns per grid column, including the one-space gap.
    column_width: usize,
    /// Width of the row-number gutter, computed from the grid's row count
    row_num_width: usize,
}

impl<'a> TuiApp<'a> {
    fn new(session: &'a mut Session, column_width: usize) -> Self {
        let row_num_width = Self::compute_row_num_width(session.grid().rows());
        Self {
            session,
            column_width,
            row_num_width,
        }
    }

    fn compute_row_num_width(rows: usize) -> usize {
        rows.to_string().len().max(3) + 1
    }

    /// Tell the session how much of the grid fits in a `width` x `height`
    /// terminal.
    fn fit_view(&mut self, width: u16, height: u16) {
        let rows = height.saturating_sub(CHROME_ROWS) as usize;
        let cols = (width as usize).saturating_sub(self.row_num_width + 1) / self.column_width;
        self.session.set_view_size(rows, cols);
    }

    fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(2),
            Constraint::Length(1),
        ])
        .split(frame.area());

        self.draw_title(frame, chunks[0]);
        self.draw_formula_line(frame, chunks[1]);
        self.draw_grid(frame, chunks[2]);
        self.draw_status(frame, chunks[3]);
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let name = self
            .session
            .filename()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "[No Name]".to_string());
        let dirty = if self.session.is_dirty() { " [+]" } else { "" };
        let grid = self.session.grid();

        let title = format!(
            " sheets: {}{} | {} rows x {} cols ",
            name,
            dirty,
            grid.rows(),
            grid.cols()
        );
        let para = Paragraph::new(Line::from(vec![Span::styled(
            title,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]))
        .style(Style::default().bg(Color::Cyan));
        frame.render_widget(para, area);
    }

    /// Cursor address and raw text, or the buffer being edited with its caret.
    fn draw_formula_line(&self, frame: &mut Frame, area: Rect) {
        let caret = Style::default().add_modifier(Modifier::REVERSED);
        let address = Span::styled(
            format!(" {:<6}", self.session.cursor_address()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let spans = match self.session.mode() {
            Mode::Normal => {
                let (row, col) = self.session.cursor();
                let text = self.session.grid().text(row, col);
                vec![address, Span::raw(util::clip(text, area.width as usize))]
            }
            Mode::Edit(buf) => {
                let (before, after) = buf.split_at_caret();
                let mut rest = after.chars();
                let at = rest.next().map_or_else(|| " ".to_string(), |c| c.to_string());
                vec![
                    address,
                    Span::raw(before.to_string()),
                    Span::styled(at, caret),
                    Span::raw(rest.as_str().to_string()),
                ]
            }
            Mode::Command(buf) => vec![
                Span::raw(format!(":{}", buf)),
                Span::styled(" ", caret),
            ],
        };
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_grid(&self, frame: &mut Frame, area: Rect) {
        let grid = self.session.grid();
        let viewport = self.session.viewport();
        let (cursor_row, cursor_col) = self.session.cursor();
        let content_width = self.column_width - 1;

        let end_col = (viewport.left + viewport.cols).min(grid.cols());
        let end_row = (viewport.top + viewport.rows).min(grid.rows());

        // Header line
        let mut header_spans = vec![Span::raw(" ".repeat(self.row_num_width + 1))];
        for c in viewport.left..end_col {
            let style = if c == cursor_col {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            };
            let letters = util::pad_right(&col_to_letters(c), content_width);
            header_spans.push(Span::styled(format!("{} ", letters), style));
        }

        let mut lines: Vec<Line> = Vec::with_capacity(viewport.rows + 1);
        lines.push(Line::from(header_spans));

        for r in viewport.top..end_row {
            let is_cursor_row = r == cursor_row;
            let row_num_style = if is_cursor_row {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            let mut spans = vec![Span::styled(
                format!("{:>width$} ", r + 1, width = self.row_num_width),
                row_num_style,
            )];

            for c in viewport.left..end_col {
                let text = grid.display(r, c);
                let numeric = grid.cell(r, c).is_some_and(|cell| cell.has_value());
                let display = if numeric {
                    util::pad_left(&text, content_width)
                } else {
                    util::pad_right(&text, content_width)
                };

                let style = if is_cursor_row && c == cursor_col {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::White)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                spans.push(Span::styled(display, style));
                spans.push(Span::raw(" "));
            }

            lines.push(Line::from(spans));
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let mode = format!(" {} ", self.session.mode().name());
        let message = self
            .session
            .status()
            .map(|s| format!(" {}", s))
            .unwrap_or_default();
        let right = format!("{} ", self.session.cursor_address());

        let used = util::display_width(&mode) + util::display_width(&message);
        let padding = (area.width as usize).saturating_sub(used + util::display_width(&right));

        let bar = Style::default().fg(Color::Black).bg(Color::DarkGray);
        let para = Paragraph::new(Line::from(vec![
            Span::styled(
                mode,
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(message, bar),
            Span::styled(format!("{:pad$}{}", "", right, pad = padding), bar),
        ]))
        .style(bar);
        frame.render_widget(para, area);
    }
}

/// Run the interactive session until a quit command.
///
/// Blocks on one input event at a time; each key is handled to completion
/// (including recalculation) before the next frame is drawn.
pub fn run(session: &mut Session, column_width: usize) -> Result<(), TuiError> {
    terminal::enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    let mut app = TuiApp::new(session, column_width);

    loop {
        let size = terminal.size()?;
        app.fit_view(size.width, size.height);
        terminal.draw(|frame| app.draw(frame))?;

        // Resize and other events just trigger a redraw.
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.session.handle_key(key)? == Flow::Quit {
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use sheets_engine::{Bounds, Grid};

    fn render(session: &mut Session, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let mut app = TuiApp::new(session, 10);
        app.fit_view(width, height);
        terminal.draw(|frame| app.draw(frame)).unwrap();

        let buffer = terminal.backend().buffer();
        (0..height)
            .map(|y| (0..width).map(|x| buffer[(x, y)].symbol()).collect::<String>())
            .collect()
    }

    #[test]
    fn test_view_size_from_terminal() {
        let mut session = Session::new(Grid::new(Bounds::new(100, 26)).unwrap(), b',');
        let mut app = TuiApp::new(&mut session, 10);
        // 80 columns minus a 4-wide gutter and its space leave 7 full columns.
        app.fit_view(80, 24);
        let vp = app.session.viewport();
        assert_eq!((vp.rows, vp.cols), (20, 7));
    }

    #[test]
    fn test_render_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "label,42\n").unwrap();

        let mut session = Session::new(Grid::new(Bounds::new(100, 26)).unwrap(), b',');
        session.load(&path).unwrap();
        let lines = render(&mut session, 60, 10);

        assert!(lines[0].contains("sheets:"));
        assert!(lines[1].contains("A1") && lines[1].contains("label"));
        assert!(lines[2].contains("A         B"));
        // Text left-aligned, number right-aligned within B.
        assert!(lines[3].starts_with(&format!("   1 {:<9} {:>9} ", "label", "42")));
        assert!(lines[9].contains("NORMAL"));
    }
}
