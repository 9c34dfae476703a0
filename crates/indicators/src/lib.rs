pub mod bollinger;
pub mod ma;
pub mod macd;

pub use bollinger::{BollingerBands, BollingerOutput};
pub use ma::{Ema, Sma};
pub use macd::{Macd, MacdOutput};

use rust_decimal::Decimal;

/// A streaming (incremental) indicator: feed one value at a time, the
/// indicator keeps its own state and reports when it has seen enough data.
pub trait Indicator: Send + Sync {
    /// Process the next value and return the indicator output (if ready).
    fn next(&mut self, value: Decimal) -> Option<Decimal>;

    /// Reset to the initial state.
    fn reset(&mut self);

    /// Minimum number of inputs before output is produced.
    fn period(&self) -> usize;

    /// Whether enough data has been seen.
    fn is_ready(&self) -> bool;
}

/// Newton's method square root for `Decimal`. Converges well within the
/// iteration cap for any magnitude a price series can produce.
pub fn decimal_sqrt(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut guess = value / Decimal::TWO;
    if guess.is_zero() {
        guess = value;
    }
    let epsilon = Decimal::new(1, 10);
    for _ in 0..100 {
        let next = (guess + value / guess) / Decimal::TWO;
        let diff = (next - guess).abs();
        guess = next;
        if diff < epsilon {
            break;
        }
    }
    guess
}
