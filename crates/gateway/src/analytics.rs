use chrono::NaiveDateTime;
use opend_core::{AdjustType, Candle, KlPeriod};
use opend_indicators::{BollingerBands, Indicator, Macd, Sma};
use rust_decimal::Decimal;
use serde::Serialize;

/// Minimum candle count before the technical-indicator block is derived.
/// Below this the slow MACD EMA has not seen a full period.
pub const INDICATOR_MIN_CANDLES: usize = 26;

/// Summary statistics over a fetched candle range.
#[derive(Debug, Clone, Serialize)]
pub struct KlineSummary {
    pub count: usize,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    /// Close-to-close return over the range, in percent.
    pub period_return_pct: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub total_volume: u64,
    pub avg_volume: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_turnover_rate: Option<Decimal>,
}

/// Latest DIF/DEA crossover found in the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossKind {
    GoldenCross,
    DeathCross,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrossSignal {
    pub kind: CrossKind,
    pub time: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct MacdReport {
    pub dif: Decimal,
    pub dea: Decimal,
    /// Histogram bar, 2 × (DIF − DEA).
    pub macd: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crossover: Option<CrossSignal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BollingerReport {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
    pub bandwidth: Decimal,
}

/// Simple support/resistance levels.
#[derive(Debug, Clone, Serialize)]
pub struct LevelsReport {
    /// Highest high over the fetched range.
    pub range_high: Decimal,
    /// Lowest low over the fetched range.
    pub range_low: Decimal,
    pub ma20: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma60: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechnicalReport {
    pub macd: MacdReport,
    pub bollinger: BollingerReport,
    pub levels: LevelsReport,
}

/// Full history-K-line result: candles plus everything derived from them.
#[derive(Debug, Clone, Serialize)]
pub struct KlineReport {
    pub code: String,
    pub period: KlPeriod,
    pub adjust: AdjustType,
    pub summary: KlineSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technicals: Option<TechnicalReport>,
    pub candles: Vec<Candle>,
}

/// Summary statistics for a non-empty candle series.
pub fn summarize(candles: &[Candle]) -> Option<KlineSummary> {
    let first = candles.first()?;
    let last = candles.last()?;

    let mut high = first.high;
    let mut low = first.low;
    let mut total_volume: u64 = 0;
    let mut turnover_rate_sum = Decimal::ZERO;
    let mut turnover_rate_count = 0u32;

    for c in candles {
        if c.high > high {
            high = c.high;
        }
        if c.low < low {
            low = c.low;
        }
        total_volume += c.volume;
        if let Some(tr) = c.turnover_rate {
            turnover_rate_sum += tr;
            turnover_rate_count += 1;
        }
    }

    let period_return_pct = if first.close.is_zero() {
        Decimal::ZERO
    } else {
        (last.close - first.close) / first.close * Decimal::ONE_HUNDRED
    };

    let count = candles.len();
    Some(KlineSummary {
        count,
        start_time: first.time_key,
        end_time: last.time_key,
        period_return_pct,
        high,
        low,
        total_volume,
        avg_volume: Decimal::from(total_volume) / Decimal::from(count as u64),
        avg_turnover_rate: (turnover_rate_count > 0)
            .then(|| turnover_rate_sum / Decimal::from(turnover_rate_count)),
    })
}

/// Derive the technical-indicator block, or `None` when fewer than
/// [`INDICATOR_MIN_CANDLES`] candles are available.
pub fn technicals(candles: &[Candle]) -> Option<TechnicalReport> {
    if candles.len() < INDICATOR_MIN_CANDLES {
        return None;
    }

    let mut macd = Macd::new(12, 26, 9);
    let mut bollinger = BollingerBands::new(20, Decimal::TWO);
    let mut ma20 = Sma::new(20);
    let mut ma60 = Sma::new(60);

    let mut crossover = None;
    let mut prev_spread: Option<Decimal> = None;
    let mut last_macd = None;
    let mut last_bollinger = None;

    for c in candles {
        last_bollinger = bollinger.next_output(c.close).or(last_bollinger);
        ma20.next(c.close);
        ma60.next(c.close);

        if let Some(out) = macd.next_output(c.close) {
            let spread = out.dif - out.dea;
            if let Some(prev) = prev_spread {
                if prev <= Decimal::ZERO && spread > Decimal::ZERO {
                    crossover = Some(CrossSignal {
                        kind: CrossKind::GoldenCross,
                        time: c.time_key,
                    });
                } else if prev >= Decimal::ZERO && spread < Decimal::ZERO {
                    crossover = Some(CrossSignal {
                        kind: CrossKind::DeathCross,
                        time: c.time_key,
                    });
                }
            }
            prev_spread = Some(spread);
            last_macd = Some(out);
        }
    }

    let macd_out = last_macd?;
    let boll_out = last_bollinger?;

    let mut high = candles[0].high;
    let mut low = candles[0].low;
    for c in candles {
        if c.high > high {
            high = c.high;
        }
        if c.low < low {
            low = c.low;
        }
    }

    Some(TechnicalReport {
        macd: MacdReport {
            dif: macd_out.dif,
            dea: macd_out.dea,
            macd: macd_out.bar,
            crossover,
        },
        bollinger: BollingerReport {
            upper: boll_out.upper,
            middle: boll_out.middle,
            lower: boll_out.lower,
            bandwidth: boll_out.bandwidth,
        },
        levels: LevelsReport {
            range_high: high,
            range_low: low,
            ma20: ma20.value()?,
            ma60: ma60.value(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn candle(day: u32, close: Decimal) -> Candle {
        Candle {
            time_key: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .checked_add_days(chrono::Days::new(day as u64))
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close - dec!(0.5),
            high: close + dec!(1),
            low: close - dec!(1),
            close,
            volume: 1_000 + day as u64,
            turnover: close * Decimal::from(1_000u32),
            turnover_rate: Some(dec!(0.5)),
            pe_ratio: None,
            pb_ratio: None,
        }
    }

    fn series(n: u32) -> Vec<Candle> {
        (0..n)
            .map(|i| candle(i, Decimal::from(100 + (i % 7)) + Decimal::new(i as i64, 1)))
            .collect()
    }

    #[test]
    fn test_summary_statistics() {
        let candles = vec![candle(0, dec!(100)), candle(1, dec!(110))];
        let s = summarize(&candles).unwrap();
        assert_eq!(s.count, 2);
        assert_eq!(s.period_return_pct, dec!(10));
        assert_eq!(s.high, dec!(111));
        assert_eq!(s.low, dec!(99));
        assert_eq!(s.total_volume, 2001);
        assert_eq!(s.avg_turnover_rate, Some(dec!(0.5)));
    }

    #[test]
    fn test_summary_of_empty_series_is_none() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn test_no_technicals_below_threshold() {
        let candles = series(INDICATOR_MIN_CANDLES as u32 - 1);
        assert!(summarize(&candles).is_some());
        assert!(technicals(&candles).is_none());
    }

    #[test]
    fn test_technicals_at_threshold() {
        let candles = series(INDICATOR_MIN_CANDLES as u32);
        let t = technicals(&candles).unwrap();
        // histogram convention: MACD = 2 × (DIF − DEA)
        assert_eq!(t.macd.macd, Decimal::TWO * (t.macd.dif - t.macd.dea));
        assert!(t.bollinger.upper >= t.bollinger.middle);
        assert!(t.bollinger.lower <= t.bollinger.middle);
        // 26 candles: MA20 is ready, MA60 is not
        assert!(t.levels.ma60.is_none());
        assert!(t.levels.range_high >= t.levels.range_low);
    }

    #[test]
    fn test_ma60_present_with_enough_candles() {
        let candles = series(80);
        let t = technicals(&candles).unwrap();
        assert!(t.levels.ma60.is_some());
    }

    #[test]
    fn test_crossover_detected_on_trend_reversal() {
        // long downtrend then a sharp rally forces DIF above DEA
        let mut candles: Vec<Candle> = (0..40)
            .map(|i| candle(i, dec!(200) - Decimal::from(i)))
            .collect();
        for i in 0..15 {
            candles.push(candle(40 + i, dec!(160) + Decimal::from(i * 10)));
        }
        let t = technicals(&candles).unwrap();
        let cross = t.macd.crossover.expect("rally should produce a crossover");
        assert_eq!(cross.kind, CrossKind::GoldenCross);
    }
}
