// Formula evaluator - recursive descent straight to a number, no AST.
//
//   expr  = term (('+' | '-') term)*
//   term  = unary (('*' | '/') unary)*
//   unary = '-' unary | atom
//   atom  = number | cellref | func '(' cellref ':' cellref ')' | '(' expr ')'
//
// Evaluation is total: every input string yields a number. Malformed
// pieces read as 0 and unknown characters are skipped one at a time.

use super::functions::RangeFn;

/// Read-only access to cell values for the evaluator.
pub trait CellLookup {
    /// Value of the cell at zero-based `(row, col)`, or `None` if it is
    /// blank, text, or outside the grid. `None` reads as 0.
    fn value(&self, row: usize, col: usize) -> Option<f64>;

    /// Grid extent as `(rows, cols)`. Range scans never look past it.
    fn extent(&self) -> (usize, usize);
}

impl<L: CellLookup + ?Sized> CellLookup for &L {
    fn value(&self, row: usize, col: usize) -> Option<f64> {
        (**self).value(row, col)
    }

    fn extent(&self) -> (usize, usize) {
        (**self).extent()
    }
}

/// Nesting limit for parentheses and unary minus.
const MAX_DEPTH: usize = 256;

/// Longest function name the parser will consume.
const MAX_NAME_LEN: usize = 7;

/// Evaluate an expression (formula text without its leading marker).
pub fn evaluate<L: CellLookup + ?Sized>(expr: &str, lookup: &L) -> f64 {
    let mut parser = Parser {
        text: expr,
        pos: 0,
        depth: 0,
        lookup,
    };
    parser.expr()
}

/// Parse `text` as a decimal number the way `strtod` would accept a whole
/// cell: leading blanks allowed, nothing may trail the number.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let len = scan_number(trimmed.as_bytes())?;
    if len != trimmed.len() {
        return None;
    }
    trimmed.parse().ok()
}

/// Length of the longest numeric prefix of `bytes`, if any.
///
/// Accepts an optional sign, digits with an optional fraction (at least one
/// digit overall), and an optional exponent that is only taken when it has
/// digits.
pub(crate) fn scan_number(bytes: &[u8]) -> Option<usize> {
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_end = digits_from(i);
    let mut end = int_end;
    let mut has_digits = int_end > i;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        has_digits |= frac_end > end + 1;
        end = frac_end;
    }
    if !has_digits {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut j = end + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            end = exp_end;
        }
    }
    Some(end)
}

/// A cell reference as written: 1-based row and column, saturating on
/// overflow. Row 0 is syntactically fine and names no cell.
#[derive(Debug, Clone, Copy)]
struct Ref {
    row: usize,
    col: usize,
}

struct Parser<'a, L: ?Sized> {
    text: &'a str,
    pos: usize,
    depth: usize,
    lookup: &'a L,
}

impl<'a, L: CellLookup + ?Sized> Parser<'a, L> {
    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Run `f` one level deeper. Past the limit the enclosing group is
    /// skipped up to its closing parenthesis and reads as 0.
    fn nested(&mut self, f: impl FnOnce(&mut Self) -> f64) -> f64 {
        if self.depth >= MAX_DEPTH {
            self.skip_group();
            return 0.0;
        }
        self.depth += 1;
        let v = f(self);
        self.depth -= 1;
        v
    }

    /// Advance to the first unmatched `)` (left unconsumed) or the end.
    fn skip_group(&mut self) {
        let mut open = 0usize;
        while let Some(b) = self.peek() {
            match b {
                b'(' => open += 1,
                b')' if open == 0 => return,
                b')' => open -= 1,
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn expr(&mut self) -> f64 {
        let mut v = self.term();
        loop {
            self.skip_blanks();
            if self.eat(b'+') {
                v += self.term();
            } else if self.eat(b'-') {
                v -= self.term();
            } else {
                return v;
            }
        }
    }

    fn term(&mut self) -> f64 {
        let mut v = self.unary();
        loop {
            self.skip_blanks();
            if self.eat(b'*') {
                v *= self.unary();
            } else if self.eat(b'/') {
                let d = self.unary();
                v = if d != 0.0 { v / d } else { 0.0 };
            } else {
                return v;
            }
        }
    }

    fn unary(&mut self) -> f64 {
        self.skip_blanks();
        if self.eat(b'-') {
            if self.depth >= MAX_DEPTH {
                // Drop the rest of the sign chain and its operand.
                while matches!(self.peek(), Some(b'-' | b' ' | b'\t')) {
                    self.pos += 1;
                }
                self.atom();
                return 0.0;
            }
            return -self.nested(|p| p.unary());
        }
        self.atom()
    }

    fn atom(&mut self) -> f64 {
        self.skip_blanks();

        if self.eat(b'(') {
            let v = self.nested(|p| p.expr());
            self.skip_blanks();
            self.eat(b')');
            return v;
        }

        if let Some(v) = self.function_call() {
            return v;
        }

        if let Some(r) = self.cell_ref() {
            return self.read(r);
        }

        if let Some(v) = self.number() {
            return v;
        }

        // Unknown token: step over one byte and contribute nothing.
        if self.pos < self.text.len() {
            self.pos += 1;
        }
        0.0
    }

    /// `NAME (` with NAME at least three uppercase letters. On anything
    /// else the position is restored so the text can be tried as a cell
    /// reference.
    fn function_call(&mut self) -> Option<f64> {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        if !(0..3).all(|i| bytes.get(start + i).is_some_and(u8::is_ascii_uppercase)) {
            return None;
        }

        let mut end = start;
        while end - start < MAX_NAME_LEN && bytes.get(end).is_some_and(u8::is_ascii_uppercase) {
            end += 1;
        }
        let func = RangeFn::from_name(&self.text[start..end]);

        self.pos = end;
        self.skip_blanks();
        if !self.eat(b'(') {
            self.pos = start;
            return None;
        }
        Some(self.range_call(func))
    }

    /// Body of a range call after the opening parenthesis. Malformed
    /// arguments contribute 0; whatever was consumed stays consumed.
    fn range_call(&mut self, func: Option<RangeFn>) -> f64 {
        self.skip_blanks();
        match self.range_args() {
            Some((a, b)) => {
                self.skip_blanks();
                self.eat(b')');
                match func {
                    Some(f) => self.aggregate(f, a, b),
                    None => 0.0,
                }
            }
            None => {
                self.eat(b')');
                0.0
            }
        }
    }

    fn range_args(&mut self) -> Option<(Ref, Ref)> {
        let first = self.cell_ref()?;
        self.skip_blanks();
        if !self.eat(b':') {
            return None;
        }
        self.skip_blanks();
        let second = self.cell_ref()?;
        Some((first, second))
    }

    /// Uppercase letters immediately followed by digits. Leaves the
    /// position untouched when the text is not a reference.
    fn cell_ref(&mut self) -> Option<Ref> {
        let bytes = self.text.as_bytes();
        let mut i = self.pos;

        let mut col = 0usize;
        while let Some(&b) = bytes.get(i).filter(|b| b.is_ascii_uppercase()) {
            col = col.saturating_mul(26).saturating_add((b - b'A' + 1) as usize);
            i += 1;
        }
        if i == self.pos {
            return None;
        }

        let digits_start = i;
        let mut row = 0usize;
        while let Some(&b) = bytes.get(i).filter(|b| b.is_ascii_digit()) {
            row = row.saturating_mul(10).saturating_add((b - b'0') as usize);
            i += 1;
        }
        if i == digits_start {
            return None;
        }

        self.pos = i;
        Some(Ref { row, col })
    }

    fn number(&mut self) -> Option<f64> {
        let rest = &self.text.as_bytes()[self.pos..];
        let len = scan_number(rest)?;
        let v = self.text.get(self.pos..self.pos + len)?.parse().ok()?;
        self.pos += len;
        Some(v)
    }

    fn read(&self, r: Ref) -> f64 {
        match (r.row.checked_sub(1), r.col.checked_sub(1)) {
            (Some(row), Some(col)) => self.lookup.value(row, col).unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Apply `func` over the rectangle spanned by two corners, in either
    /// order. Cells past the grid extent count as visited zeros.
    fn aggregate(&self, func: RangeFn, a: Ref, b: Ref) -> f64 {
        let (row_lo, row_hi) = (a.row.min(b.row), a.row.max(b.row));
        let (col_lo, col_hi) = (a.col.min(b.col), a.col.max(b.col));
        // Corners saturate at usize::MAX, so the extent is sized in f64.
        let area = ((row_hi - row_lo) as f64 + 1.0) * ((col_hi - col_lo) as f64 + 1.0);

        let (rows, cols) = self.lookup.extent();
        let mut acc = func.accumulator();
        let mut visited = 0.0;

        // 1-based bounds of the part of the rectangle that lies in the grid.
        let (r0, r1) = (row_lo.max(1), row_hi.min(rows));
        let (c0, c1) = (col_lo.max(1), col_hi.min(cols));
        if r0 <= r1 && c0 <= c1 {
            for row in r0..=r1 {
                for col in c0..=c1 {
                    acc.push(self.lookup.value(row - 1, col - 1).unwrap_or(0.0));
                    visited += 1.0;
                }
            }
        }
        acc.push_zeros(area - visited);
        acc.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Map-backed lookup; coordinates are zero-based.
    struct MapLookup {
        values: HashMap<(usize, usize), f64>,
        extent: (usize, usize),
    }

    impl MapLookup {
        fn new() -> Self {
            Self { values: HashMap::new(), extent: (100, 26) }
        }

        fn with(mut self, row: usize, col: usize, v: f64) -> Self {
            self.values.insert((row, col), v);
            self
        }
    }

    impl CellLookup for MapLookup {
        fn value(&self, row: usize, col: usize) -> Option<f64> {
            self.values.get(&(row, col)).copied()
        }

        fn extent(&self) -> (usize, usize) {
            self.extent
        }
    }

    fn eval(expr: &str) -> f64 {
        evaluate(expr, &MapLookup::new())
    }

    fn column_a() -> MapLookup {
        MapLookup::new().with(0, 0, 1.0).with(1, 0, 2.0).with(2, 0, 3.0)
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(eval("1+2*3"), 7.0);
        assert_eq!(eval("(1+2)*3"), 9.0);
        assert_eq!(eval("10-4-3"), 3.0);
        assert_eq!(eval("8/4/2"), 1.0);
        assert_eq!(eval(" 2 *\t3 "), 6.0);
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(eval("-(2+3)*4"), -20.0);
        assert_eq!(eval("--3"), 3.0);
        assert_eq!(eval("2*-3"), -6.0);
        assert_eq!(eval("-2-3"), -5.0);
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        assert_eq!(eval("1/0"), 0.0);
        assert_eq!(eval("5+1/0"), 5.0);
        assert_eq!(eval("1/(2-2)*7"), 0.0);
        // Blank cell as divisor reads as 0.
        assert_eq!(eval("4/A1"), 0.0);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(eval("1.5"), 1.5);
        assert_eq!(eval(".5"), 0.5);
        assert_eq!(eval("5."), 5.0);
        assert_eq!(eval("1e3"), 1000.0);
        assert_eq!(eval("2.5E-1"), 0.25);
        assert_eq!(eval("+4"), 4.0);
        // Exponent without digits is not part of the number.
        assert_eq!(eval("3e"), 3.0);
    }

    #[test]
    fn test_cell_refs() {
        let lookup = MapLookup::new().with(0, 0, 10.0).with(1, 1, 2.5);
        assert_eq!(evaluate("A1", &lookup), 10.0);
        assert_eq!(evaluate("A1+B2", &lookup), 12.5);
        assert_eq!(evaluate("A1*B2-1", &lookup), 24.0);
    }

    #[test]
    fn test_missing_values_read_as_zero() {
        assert_eq!(eval("A1+A2"), 0.0);
        assert_eq!(eval("A0"), 0.0);
        assert_eq!(eval("ZZ9999"), 0.0);
        assert_eq!(eval("A99999999999999999999999"), 0.0);
    }

    #[test]
    fn test_multi_letter_columns() {
        let lookup = MapLookup::new().with(0, 26, 7.0);
        assert_eq!(evaluate("AA1", &lookup), 7.0);
        // Three letters: tried as a function first, then as a reference.
        let lookup = MapLookup { values: HashMap::from([((0, 702), 9.0)]), extent: (10, 800) };
        assert_eq!(evaluate("AAA1", &lookup), 9.0);
    }

    #[test]
    fn test_range_functions() {
        let lookup = column_a();
        assert_eq!(evaluate("SUM(A1:A3)", &lookup), 6.0);
        assert_eq!(evaluate("AVG(A1:A3)", &lookup), 2.0);
        assert_eq!(evaluate("MIN(A1:A3)", &lookup), 1.0);
        assert_eq!(evaluate("MAX(A1:A3)", &lookup), 3.0);
    }

    #[test]
    fn test_range_corners_in_any_order() {
        let lookup = column_a();
        assert_eq!(evaluate("SUM(A3:A1)", &lookup), 6.0);
        let lookup = MapLookup::new().with(0, 1, 1.0).with(1, 0, 2.0);
        assert_eq!(evaluate("SUM(B1:A2)", &lookup), 3.0);
    }

    #[test]
    fn test_avg_counts_blank_cells() {
        let lookup = MapLookup::new().with(0, 0, 6.0);
        assert_eq!(evaluate("AVG(A1:A3)", &lookup), 2.0);
        assert_eq!(evaluate("MIN(A1:A3)", &lookup), 0.0);
    }

    #[test]
    fn test_range_past_extent() {
        let lookup = MapLookup { values: HashMap::from([((0, 0), 8.0)]), extent: (2, 1) };
        // A1:A4 covers two in-grid cells and two beyond the grid.
        assert_eq!(evaluate("AVG(A1:A4)", &lookup), 2.0);
        assert_eq!(evaluate("SUM(A1:A99999999)", &lookup), 8.0);
    }

    #[test]
    fn test_range_from_row_zero_to_saturated_row() {
        let lookup = MapLookup { values: HashMap::from([((0, 0), 8.0)]), extent: (2, 1) };
        // Row 0 names no cell but still counts toward the area.
        assert_eq!(evaluate("AVG(A0:A1)", &lookup), 4.0);
        assert_eq!(evaluate("SUM(A0:A99999999999999999999999)", &lookup), 8.0);

        let avg = evaluate("AVG(A0:A99999999999999999999999)", &lookup);
        assert!(avg > 0.0 && avg < 1e-15, "got {avg}");
        let wide = evaluate("AVG(A0:ZZZZZZZZZZZZZZZZZZZZZZZZ99999999999999999999999)", &lookup);
        assert!(wide.is_finite() && wide >= 0.0, "got {wide}");
    }

    #[test]
    fn test_range_inside_expression() {
        let lookup = column_a();
        assert_eq!(evaluate("SUM(A1:A3)*2+1", &lookup), 13.0);
        assert_eq!(evaluate("SUM( A1 : A3 )", &lookup), 6.0);
        assert_eq!(evaluate("SUM (A1:A3)", &lookup), 6.0);
        assert_eq!(evaluate("MAX(A1:A3)-MIN(A1:A3)", &lookup), 2.0);
    }

    #[test]
    fn test_malformed_range_call_is_zero() {
        let lookup = column_a();
        assert_eq!(evaluate("SUM(A1)", &lookup), 0.0);
        assert_eq!(evaluate("SUM(A1:)", &lookup), 0.0);
        assert_eq!(evaluate("SUM(1:2)", &lookup), 0.0);
        assert_eq!(evaluate("SUM(", &lookup), 0.0);
        assert_eq!(evaluate("SUM()+5", &lookup), 5.0);
    }

    #[test]
    fn test_unknown_function_is_zero() {
        let lookup = column_a();
        assert_eq!(evaluate("FOO(A1:A3)", &lookup), 0.0);
        assert_eq!(evaluate("FOO(A1:A3)+1", &lookup), 1.0);
    }

    #[test]
    fn test_unknown_tokens_are_skipped() {
        assert_eq!(eval("#5"), 0.0);
        assert_eq!(eval("abc"), 0.0);
        assert_eq!(eval(""), 0.0);
        assert_eq!(eval("2+"), 2.0);
        assert_eq!(eval("2+#"), 2.0);
        assert_eq!(eval("é+1"), 0.0);
        // Trailing garbage after a complete expression is ignored.
        assert_eq!(eval("2 x 3"), 2.0);
    }

    #[test]
    fn test_unbalanced_parens() {
        assert_eq!(eval("(1+2"), 3.0);
        assert_eq!(eval("1+2)"), 3.0);
    }

    #[test]
    fn test_deep_nesting_terminates() {
        let deep = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(eval(&deep), 0.0);
        let shallow = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(eval(&shallow), 1.0);
        assert_eq!(eval(&"-".repeat(10_000)), 0.0);
    }

    #[test]
    fn test_too_deep_group_does_not_swallow_the_rest() {
        let deep = format!("{}1{}+5", "(".repeat(300), ")".repeat(300));
        assert_eq!(eval(&deep), 5.0);
        let signs = format!("{}1+5", "-".repeat(300));
        assert_eq!(eval(&signs), 5.0);
        let unclosed = format!("{}1", "(".repeat(300));
        assert_eq!(eval(&unclosed), 0.0);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("  -1.5"), Some(-1.5));
        assert_eq!(parse_number("1e2"), Some(100.0));
        assert_eq!(parse_number("1 "), None);
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("nan"), None);
        assert_eq!(parse_number("0x10"), None);
    }
}
