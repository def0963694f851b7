// CSV import/export of the grid's raw cell text
//
// Layout: one line per row up to the last occupied row (blank rows in
// between are empty lines), one field per column up to the last occupied
// column of that row. Formulas are stored as their source text.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use sheets_engine::Grid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("cannot encode record: {0}")]
    Encode(String),
}

/// Write every non-blank cell's raw text to `path`.
///
/// Returns the number of lines written.
pub fn write(grid: &Grid, path: &Path, separator: u8) -> Result<usize, CsvError> {
    let file = File::create(path).map_err(|source| CsvError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);
    let rows = write_to(grid, &mut out, separator)?;
    out.flush()?;

    log::info!("wrote {} rows to {}", rows, path.display());
    Ok(rows)
}

/// Write the grid to any writer. See [`write`].
pub fn write_to<W: Write>(grid: &Grid, out: &mut W, separator: u8) -> Result<usize, CsvError> {
    let rows = grid.used_rows();
    for row in 0..rows {
        let cols = grid.used_cols(row);
        if cols == 0 {
            // Keep the line so later rows stay in place.
            out.write_all(b"\n")?;
            continue;
        }
        let fields = (0..cols).map(|col| grid.text(row, col));
        out.write_all(&encode_record(fields, separator)?)?;
    }
    Ok(rows)
}

/// Encode one record with standard quoting: fields holding the separator,
/// a quote, or a line break are wrapped in quotes with inner quotes doubled.
fn encode_record<'a, I>(fields: I, separator: u8) -> Result<Vec<u8>, CsvError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(separator)
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    writer.into_inner().map_err(|e| CsvError::Encode(e.to_string()))
}

/// Replace the grid's contents with the file at `path`.
///
/// Fields land at their row/column position; empty fields are skipped and
/// anything past the grid's bounds is dropped. Returns the number of rows
/// that received data (index of the last one plus one).
pub fn read(grid: &mut Grid, path: &Path, separator: u8) -> Result<usize, CsvError> {
    let content = read_file_as_utf8(path)?;
    let rows = read_from_str(grid, &content, separator)?;

    log::info!("read {} rows from {}", rows, path.display());
    Ok(rows)
}

/// Like [`read`], but a missing file just leaves the grid empty so it can be
/// created on the first write.
pub fn load_or_new(grid: &mut Grid, path: &Path, separator: u8) -> Result<usize, CsvError> {
    if !path.exists() {
        grid.clear_all();
        log::info!("{} does not exist yet, starting empty", path.display());
        return Ok(0);
    }
    read(grid, path, separator)
}

/// Parse CSV text into the grid. See [`read`].
pub fn read_from_str(grid: &mut Grid, content: &str, separator: u8) -> Result<usize, CsvError> {
    grid.clear_all();

    let mut record = csv::StringRecord::new();
    let mut rows = 0usize;

    // The csv reader skips blank lines, but they still count as rows here,
    // so each line is split off first and parsed on its own.
    for (row, line) in logical_lines(content, separator).into_iter().enumerate() {
        if row >= grid.rows() {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(separator)
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());
        if !reader.read_record(&mut record)? {
            continue;
        }

        for (col, field) in record.iter().enumerate().take(grid.cols()) {
            if !field.is_empty() {
                grid.set_text(row, col, field);
            }
        }
        rows = row + 1;
    }

    Ok(rows)
}

/// Where the line splitter is within the current field.
#[derive(Clone, Copy, PartialEq)]
enum FieldState {
    Start,
    Unquoted,
    Quoted,
    /// A quote inside a quoted field: either an escaped `""` or the close.
    QuoteInQuoted,
}

/// Split on line breaks outside quoted fields, dropping a trailing CR.
///
/// A quote only opens a quoted field at the start of a field. Anywhere else
/// it is literal text, matching how the csv reader treats it.
fn logical_lines(content: &str, separator: u8) -> Vec<&str> {
    fn trim_cr(line: &str) -> &str {
        line.strip_suffix('\r').unwrap_or(line)
    }

    let mut lines = Vec::new();
    let mut state = FieldState::Start;
    let mut start = 0;
    for (i, b) in content.bytes().enumerate() {
        state = match (state, b) {
            (FieldState::Quoted, b'"') => FieldState::QuoteInQuoted,
            (FieldState::Quoted, _) => FieldState::Quoted,
            (FieldState::QuoteInQuoted, b'"') => FieldState::Quoted,
            (FieldState::Start, b'"') => FieldState::Quoted,
            (_, b'\n') => {
                lines.push(trim_cr(&content[start..i]));
                start = i + 1;
                FieldState::Start
            }
            (_, b) if b == separator => FieldState::Start,
            _ => FieldState::Unquoted,
        };
    }
    if start < content.len() {
        lines.push(trim_cr(&content[start..]));
    }
    lines
}

/// Read file and convert to UTF-8 if needed (Windows-1252 fallback)
pub fn read_file_as_utf8(path: &Path) -> Result<String, CsvError> {
    let mut file = File::open(path).map_err(|source| CsvError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            log::warn!("{} is not UTF-8, decoded as Windows-1252", path.display());
            Ok(decoded.into_owned())
        }
    }
}
