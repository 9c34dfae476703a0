use crate::Indicator;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Simple Moving Average.
#[derive(Debug, Clone)]
pub struct Sma {
    len: usize,
    window: VecDeque<Decimal>,
    sum: Decimal,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "SMA period must be > 0");
        Self {
            len: period,
            window: VecDeque::with_capacity(period),
            sum: Decimal::ZERO,
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        if self.window.len() == self.len {
            Some(self.sum / Decimal::from(self.len))
        } else {
            None
        }
    }
}

impl Indicator for Sma {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        self.window.push_back(value);
        self.sum += value;
        if self.window.len() > self.len {
            if let Some(evicted) = self.window.pop_front() {
                self.sum -= evicted;
            }
        }
        self.value()
    }

    fn reset(&mut self) {
        self.window.clear();
        self.sum = Decimal::ZERO;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.window.len() == self.len
    }
}

/// Exponential Moving Average, seeded with the SMA of the first `period`
/// values (the convention the vendor's charting uses).
#[derive(Debug, Clone)]
pub struct Ema {
    len: usize,
    multiplier: Decimal,
    state: EmaState,
}

/// An EMA is either still collecting its SMA seed or running the
/// exponential recurrence; the two phases share no state.
#[derive(Debug, Clone, Copy)]
enum EmaState {
    Seeding { sum: Decimal, seen: usize },
    Live(Decimal),
}

impl EmaState {
    const START: EmaState = EmaState::Seeding {
        sum: Decimal::ZERO,
        seen: 0,
    };
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "EMA period must be > 0");
        Self {
            len: period,
            multiplier: Decimal::TWO / (Decimal::from(period) + Decimal::ONE),
            state: EmaState::START,
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        match self.state {
            EmaState::Live(v) => Some(v),
            EmaState::Seeding { .. } => None,
        }
    }
}

impl Indicator for Ema {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        self.state = match self.state {
            EmaState::Seeding { sum, seen } => {
                let sum = sum + value;
                if seen + 1 == self.len {
                    EmaState::Live(sum / Decimal::from(self.len))
                } else {
                    EmaState::Seeding {
                        sum,
                        seen: seen + 1,
                    }
                }
            }
            EmaState::Live(prev) => EmaState::Live((value - prev) * self.multiplier + prev),
        };
        self.value()
    }

    fn reset(&mut self) {
        self.state = EmaState::START;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        matches!(self.state, EmaState::Live(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sma_rolling_window() {
        let mut sma = Sma::new(3);
        assert_eq!(sma.next(dec!(1)), None);
        assert_eq!(sma.next(dec!(2)), None);
        assert_eq!(sma.next(dec!(3)), Some(dec!(2)));
        // window slides: (2+3+7)/3 = 4
        assert_eq!(sma.next(dec!(7)), Some(dec!(4)));
    }

    #[test]
    fn test_ema_seeds_with_sma() {
        let mut ema = Ema::new(3);
        assert_eq!(ema.next(dec!(2)), None);
        assert_eq!(ema.next(dec!(4)), None);
        assert_eq!(ema.next(dec!(6)), Some(dec!(4)));
        // multiplier = 2/(3+1) = 0.5 → (8-4)*0.5 + 4 = 6
        assert_eq!(ema.next(dec!(8)), Some(dec!(6)));
    }

    #[test]
    fn test_ema_reset_restarts_seeding() {
        let mut ema = Ema::new(2);
        ema.next(dec!(1));
        ema.next(dec!(3));
        assert!(ema.is_ready());
        ema.reset();
        assert!(!ema.is_ready());
        assert_eq!(ema.next(dec!(10)), None);
        assert_eq!(ema.next(dec!(20)), Some(dec!(15)));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut sma = Sma::new(2);
        sma.next(dec!(1));
        sma.next(dec!(2));
        assert!(sma.is_ready());
        sma.reset();
        assert!(!sma.is_ready());
        assert_eq!(sma.next(dec!(5)), None);
    }
}
