// Built-in range functions: SUM, AVG, MIN, MAX

/// A function applied over a rectangular cell range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFn {
    Sum,
    Avg,
    Min,
    Max,
}

impl RangeFn {
    /// Look up a function by name. Names must be uppercase, as the parser
    /// only recognizes uppercase identifiers.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SUM" => Some(RangeFn::Sum),
            "AVG" => Some(RangeFn::Avg),
            "MIN" => Some(RangeFn::Min),
            "MAX" => Some(RangeFn::Max),
            _ => None,
        }
    }

    pub fn accumulator(self) -> Accumulator {
        let acc = match self {
            RangeFn::Min => f64::INFINITY,
            RangeFn::Max => f64::NEG_INFINITY,
            RangeFn::Sum | RangeFn::Avg => 0.0,
        };
        Accumulator { func: self, acc, count: 0.0 }
    }

    /// Fold a sequence of cell values.
    ///
    /// An empty sequence gives `0` for SUM and AVG, and the unchanged seed
    /// (`+inf` for MIN, `-inf` for MAX) otherwise.
    pub fn aggregate<I>(self, values: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        let mut acc = self.accumulator();
        for v in values {
            acc.push(v);
        }
        acc.finish()
    }
}

/// Running state for one range function call.
#[derive(Debug, Clone, Copy)]
pub struct Accumulator {
    func: RangeFn,
    acc: f64,
    count: f64,
}

impl Accumulator {
    pub fn push(&mut self, v: f64) {
        match self.func {
            RangeFn::Min => {
                if v < self.acc {
                    self.acc = v;
                }
            }
            RangeFn::Max => {
                if v > self.acc {
                    self.acc = v;
                }
            }
            RangeFn::Sum | RangeFn::Avg => self.acc += v,
        }
        self.count += 1.0;
    }

    /// Record `n` visited cells that each read as zero.
    pub fn push_zeros(&mut self, n: f64) {
        if n <= 0.0 {
            return;
        }
        match self.func {
            RangeFn::Min | RangeFn::Max => {
                self.push(0.0);
                self.count += n - 1.0;
            }
            RangeFn::Sum | RangeFn::Avg => self.count += n,
        }
    }

    pub fn finish(self) -> f64 {
        match self.func {
            RangeFn::Avg if self.count > 0.0 => self.acc / self.count,
            _ => self.acc,
        }
    }
}
