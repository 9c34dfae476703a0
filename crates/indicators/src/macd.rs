use crate::ma::Ema;
use crate::Indicator;
use rust_decimal::Decimal;

/// MACD in the convention used by the vendor's charts:
///
/// - DIF  = EMA(fast) − EMA(slow)
/// - DEA  = EMA(signal period) over DIF, seeded with the first DIF value
/// - bar  = 2 × (DIF − DEA)
///
/// Seeding DEA with the first DIF means the indicator is ready the moment
/// the slow EMA is, which is what lets a minimum-length candle series
/// (slow period) produce a full MACD block.
#[derive(Debug, Clone)]
pub struct Macd {
    fast_ema: Ema,
    slow_ema: Ema,
    signal_multiplier: Decimal,
    dif: Option<Decimal>,
    dea: Option<Decimal>,
}

/// MACD output components.
#[derive(Debug, Clone, Copy)]
pub struct MacdOutput {
    pub dif: Decimal,
    pub dea: Decimal,
    /// The histogram bar, 2 × (DIF − DEA).
    pub bar: Decimal,
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        assert!(
            fast_period < slow_period,
            "fast period must be less than slow period"
        );
        assert!(signal_period > 0, "signal period must be > 0");
        Self {
            fast_ema: Ema::new(fast_period),
            slow_ema: Ema::new(slow_period),
            signal_multiplier: Decimal::TWO / (Decimal::from(signal_period) + Decimal::ONE),
            dif: None,
            dea: None,
        }
    }

    /// Standard MACD (12, 26, 9).
    pub fn default_periods() -> Self {
        Self::new(12, 26, 9)
    }

    pub fn output(&self) -> Option<MacdOutput> {
        match (self.dif, self.dea) {
            (Some(dif), Some(dea)) => Some(MacdOutput {
                dif,
                dea,
                bar: Decimal::TWO * (dif - dea),
            }),
            _ => None,
        }
    }

    /// Process the next close and return the full output if ready.
    pub fn next_output(&mut self, value: Decimal) -> Option<MacdOutput> {
        let fast = self.fast_ema.next(value);
        let slow = self.slow_ema.next(value);

        if let (Some(f), Some(s)) = (fast, slow) {
            let dif = f - s;
            self.dif = Some(dif);
            self.dea = Some(match self.dea {
                None => dif,
                Some(prev) => (dif - prev) * self.signal_multiplier + prev,
            });
        }

        self.output()
    }
}

impl Indicator for Macd {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        self.next_output(value).map(|o| o.dif)
    }

    fn reset(&mut self) {
        self.fast_ema.reset();
        self.slow_ema.reset();
        self.dif = None;
        self.dea = None;
    }

    fn period(&self) -> usize {
        self.slow_ema.period()
    }

    fn is_ready(&self) -> bool {
        self.dea.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ready_exactly_at_slow_period() {
        let mut macd = Macd::new(3, 5, 3);
        for i in 1..5 {
            assert!(macd.next_output(Decimal::from(i)).is_none());
        }
        let out = macd.next_output(dec!(5)).unwrap();
        // DEA seeds with the first DIF, so the first bar is exactly zero.
        assert_eq!(out.dea, out.dif);
        assert_eq!(out.bar, Decimal::ZERO);
    }

    #[test]
    fn test_bar_is_twice_the_spread() {
        let mut macd = Macd::new(3, 5, 3);
        let closes = [1, 2, 3, 4, 5, 9, 2, 7, 6, 8];
        let mut last = None;
        for c in closes {
            last = macd.next_output(Decimal::from(c));
        }
        let out = last.unwrap();
        assert_eq!(out.bar, Decimal::TWO * (out.dif - out.dea));
        assert_ne!(out.dif, out.dea);
    }
}
