//! Cell address codec.
//!
//! Maps between the canonical text form of an address (`A1`, `AB12`) and a
//! zero-based `(row, col)` pair. Columns use bijective base-26 over `A..=Z`
//! (A=1 .. Z=26, AA=27), rows are 1-based in text and 0-based internally.
//!
//! Only uppercase column letters are accepted. `a1` is a parse failure,
//! not something to normalize.

use thiserror::Error;

/// Configured grid extents. Valid indices are `0..rows` and `0..cols`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub rows: usize,
    pub cols: usize,
}

impl Bounds {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Text is not letters immediately followed by digits.
    #[error("invalid cell address: {0:?}")]
    InvalidAddress(String),
    /// Well-formed, but outside the grid. Indices saturate on overflow.
    #[error("cell address out of range: row {row}, col {col}")]
    OutOfRange { row: usize, col: usize },
}

/// Encode a zero-based `(row, col)` as canonical text, e.g. `(0, 26)` -> `AA1`.
pub fn encode(row: usize, col: usize, bounds: Bounds) -> Result<String, AddressError> {
    if !bounds.contains(row, col) {
        return Err(AddressError::OutOfRange { row, col });
    }
    Ok(format!("{}{}", col_to_letters(col), row + 1))
}

/// Decode canonical text into a zero-based `(row, col)`.
///
/// Accepts one or more `A..=Z` followed by one or more ASCII digits, with
/// nothing before, between, or after.
pub fn decode(text: &str, bounds: Bounds) -> Result<(usize, usize), AddressError> {
    let invalid = || AddressError::InvalidAddress(text.to_string());

    let split = text
        .find(|c: char| !c.is_ascii_uppercase())
        .ok_or_else(invalid)?;
    let (letters, digits) = text.split_at(split);
    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let col = letters_to_col(letters).unwrap_or(usize::MAX);
    let row = digits
        .bytes()
        .try_fold(0usize, |acc, b| {
            acc.checked_mul(10)?.checked_add((b - b'0') as usize)
        })
        .unwrap_or(usize::MAX);

    // Row "0" names no cell: report it as out of range rather than invalid.
    let row = match row.checked_sub(1) {
        Some(r) => r,
        None => return Err(AddressError::OutOfRange { row: 0, col }),
    };

    if !bounds.contains(row, col) {
        return Err(AddressError::OutOfRange { row, col });
    }
    Ok((row, col))
}

/// Convert a 0-based column index to letters: 0=A, 25=Z, 26=AA, 701=ZZ, 702=AAA.
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Convert uppercase column letters to a 0-based index.
///
/// Returns `None` for an empty string, any non-`A..=Z` byte, or overflow.
pub fn letters_to_col(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let one_based = letters.bytes().try_fold(0usize, |acc, b| {
        if !b.is_ascii_uppercase() {
            return None;
        }
        acc.checked_mul(26)?.checked_add((b - b'A' + 1) as usize)
    })?;
    Some(one_based - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds::new(100, 26)
    }

    #[test]
    fn test_col_to_letters() {
        assert_eq!(col_to_letters(0), "A");
        assert_eq!(col_to_letters(1), "B");
        assert_eq!(col_to_letters(25), "Z");
        assert_eq!(col_to_letters(26), "AA");
        assert_eq!(col_to_letters(27), "AB");
        assert_eq!(col_to_letters(701), "ZZ");
        assert_eq!(col_to_letters(702), "AAA");
    }

    #[test]
    fn test_letters_to_col() {
        assert_eq!(letters_to_col("A"), Some(0));
        assert_eq!(letters_to_col("Z"), Some(25));
        assert_eq!(letters_to_col("AA"), Some(26));
        assert_eq!(letters_to_col("ZZ"), Some(701));
        assert_eq!(letters_to_col("AAA"), Some(702));
        assert_eq!(letters_to_col(""), None);
        assert_eq!(letters_to_col("a"), None);
        assert_eq!(letters_to_col(&"Z".repeat(40)), None);
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode(0, 0, bounds()).unwrap(), "A1");
        assert_eq!(encode(99, 25, bounds()).unwrap(), "Z100");
        assert_eq!(encode(4, 1, bounds()).unwrap(), "B5");

        let wide = Bounds::new(10, 1000);
        assert_eq!(encode(0, 26, wide).unwrap(), "AA1");
    }

    #[test]
    fn test_encode_out_of_range() {
        assert_eq!(
            encode(100, 0, bounds()),
            Err(AddressError::OutOfRange { row: 100, col: 0 })
        );
        assert_eq!(
            encode(0, 26, bounds()),
            Err(AddressError::OutOfRange { row: 0, col: 26 })
        );
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode("A1", bounds()), Ok((0, 0)));
        assert_eq!(decode("B12", bounds()), Ok((11, 1)));
        assert_eq!(decode("Z100", bounds()), Ok((99, 25)));
        assert_eq!(decode("AA1", Bounds::new(10, 30)), Ok((0, 26)));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for bad in ["", "A", "1", "1A", "a1", "Ab1", "A1B", "A 1", " A1", "A1 ", "A-1", "$A$1", "A1.5"] {
            assert!(
                matches!(decode(bad, bounds()), Err(AddressError::InvalidAddress(_))),
                "{bad:?} should be invalid"
            );
        }
    }

    #[test]
    fn test_decode_out_of_range() {
        assert!(matches!(decode("A101", bounds()), Err(AddressError::OutOfRange { .. })));
        assert!(matches!(decode("AA1", bounds()), Err(AddressError::OutOfRange { .. })));
        assert!(matches!(decode("A0", bounds()), Err(AddressError::OutOfRange { .. })));
        assert!(matches!(
            decode("A99999999999999999999999999", bounds()),
            Err(AddressError::OutOfRange { .. })
        ));
        assert!(matches!(
            decode(&format!("{}1", "Q".repeat(30)), bounds()),
            Err(AddressError::OutOfRange { .. })
        ));
    }
}
