/// Maximum number of characters a cell's raw text may hold.
pub const MAX_CELL_TEXT: usize = 255;

/// Prefix that marks cell text as a formula.
pub const FORMULA_MARKER: char = '=';

/// One grid slot: the raw text the user entered plus the numeric value
/// derived from it by the last recalculation pass.
///
/// `value` is meaningful only while `has_value` is true. Neither is ever
/// set from user input directly; `recalc` derives both from `text`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    text: String,
    value: f64,
    has_value: bool,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The derived numeric value, if the last recalculation produced one.
    pub fn value(&self) -> Option<f64> {
        self.has_value.then_some(self.value)
    }

    pub fn has_value(&self) -> bool {
        self.has_value
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_formula(&self) -> bool {
        self.text.starts_with(FORMULA_MARKER)
    }

    /// Replace the raw text. The derived value is invalidated until the
    /// next recalculation.
    pub fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.extend(text.chars().take(MAX_CELL_TEXT));
        self.value = 0.0;
        self.has_value = false;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.value = 0.0;
        self.has_value = false;
    }

    pub(crate) fn set_value(&mut self, value: Option<f64>) {
        match value {
            Some(v) => {
                self.value = v;
                self.has_value = true;
            }
            None => {
                self.value = 0.0;
                self.has_value = false;
            }
        }
    }

    /// Text shown in the grid: blank stays blank, cells with a value show
    /// the number, everything else shows its raw text.
    pub fn display(&self) -> String {
        if self.text.is_empty() {
            return String::new();
        }
        match self.value() {
            Some(v) => format_general(v),
            None => self.text.clone(),
        }
    }
}

/// Format a number like C's `%g`: six significant digits, trailing zeros
/// dropped, exponent notation when the exponent is below -4 or at least 6.
pub fn format_general(n: f64) -> String {
    const PRECISION: i32 = 6;

    if n.is_nan() {
        return if n.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if n.is_infinite() {
        return if n < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if n == 0.0 {
        return if n.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the target precision first; the exponent of the rounded
    // value decides between fixed and exponent notation.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, n);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= PRECISION {
        let mantissa = strip_fraction_zeros(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp).max(0) as usize;
        strip_fraction_zeros(&format!("{:.*}", decimals, n)).to_string()
    }
}

fn strip_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
