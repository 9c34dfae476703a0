use crate::decimal_sqrt;
use crate::ma::Sma;
use crate::Indicator;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Bollinger Bands over a rolling window.
///
/// Middle band is the SMA; upper/lower sit `num_std` population standard
/// deviations away.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    len: usize,
    num_std: Decimal,
    sma: Sma,
    buffer: VecDeque<Decimal>,
    output: Option<BollingerOutput>,
}

/// Bollinger band values at one point.
#[derive(Debug, Clone, Copy)]
pub struct BollingerOutput {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
    pub bandwidth: Decimal,
}

impl BollingerBands {
    pub fn new(period: usize, num_std_dev: Decimal) -> Self {
        assert!(period > 1, "Bollinger period must be > 1");
        Self {
            len: period,
            num_std: num_std_dev,
            sma: Sma::new(period),
            buffer: VecDeque::with_capacity(period),
            output: None,
        }
    }

    /// Standard bands (20, 2).
    pub fn default_periods() -> Self {
        Self::new(20, Decimal::TWO)
    }

    fn std_dev(&self, mean: Decimal) -> Decimal {
        let variance: Decimal = self
            .buffer
            .iter()
            .map(|v| {
                let diff = *v - mean;
                diff * diff
            })
            .sum::<Decimal>()
            / Decimal::from(self.buffer.len());
        decimal_sqrt(variance)
    }

    pub fn output(&self) -> Option<BollingerOutput> {
        self.output
    }

    pub fn next_output(&mut self, value: Decimal) -> Option<BollingerOutput> {
        self.buffer.push_back(value);
        if self.buffer.len() > self.len {
            self.buffer.pop_front();
        }

        if let Some(middle) = self.sma.next(value) {
            let sd = self.std_dev(middle);
            let upper = middle + self.num_std * sd;
            let lower = middle - self.num_std * sd;
            self.output = Some(BollingerOutput {
                upper,
                middle,
                lower,
                bandwidth: upper - lower,
            });
        }

        self.output
    }
}

impl Indicator for BollingerBands {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        self.next_output(value).map(|o| o.middle)
    }

    fn reset(&mut self) {
        self.sma.reset();
        self.buffer.clear();
        self.output = None;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.output.is_some()
    }
}
