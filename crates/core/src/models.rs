use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::AdapterError;

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

/// Quote-side market, taken from the prefix of a security code
/// (e.g. `HK.00700`, `US.AAPL`, `SH.600519`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    Hk,
    Us,
    Sh,
    Sz,
}

impl Market {
    /// Parse the market prefix of a full security code.
    pub fn from_code(code: &str) -> Result<Self, AdapterError> {
        let prefix = code.split('.').next().unwrap_or("");
        match prefix {
            "HK" => Ok(Market::Hk),
            "US" => Ok(Market::Us),
            "SH" => Ok(Market::Sh),
            "SZ" => Ok(Market::Sz),
            _ => Err(AdapterError::InvalidArgument(format!(
                "unrecognized market prefix in code '{code}' (expected HK/US/SH/SZ)"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Hk => "HK",
            Market::Us => "US",
            Market::Sh => "SH",
            Market::Sz => "SZ",
        }
    }

    /// The trading segment that orders for this market are routed to.
    pub fn trd_market(&self) -> TrdMarket {
        match self {
            Market::Hk => TrdMarket::Hk,
            Market::Us => TrdMarket::Us,
            Market::Sh | Market::Sz => TrdMarket::Cn,
        }
    }

    /// Local trading-hours reminder, appended to vendor errors so the
    /// agent can tell a closed market from a genuinely bad request.
    pub fn trading_hours_hint(&self) -> &'static str {
        match self {
            Market::Hk => "HK market trades 09:30-12:00 and 13:00-16:00 HKT",
            Market::Us => "US market trades 09:30-16:00 ET",
            Market::Sh | Market::Sz => "A-share market trades 09:30-11:30 and 13:00-15:00 CST",
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trading segment. One trade session exists per segment; the table is
/// fixed-size so an unsupported segment cannot appear at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrdMarket {
    Hk,
    Us,
    Cn,
}

impl TrdMarket {
    pub const ALL: [TrdMarket; 3] = [TrdMarket::Hk, TrdMarket::Us, TrdMarket::Cn];

    pub fn index(&self) -> usize {
        match self {
            TrdMarket::Hk => 0,
            TrdMarket::Us => 1,
            TrdMarket::Cn => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrdMarket::Hk => "HK",
            TrdMarket::Us => "US",
            TrdMarket::Cn => "CN",
        }
    }
}

impl std::fmt::Display for TrdMarket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Trading vocabulary
// ---------------------------------------------------------------------------

/// Trading environment. The vendor keeps separate real and paper accounts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrdEnv {
    #[default]
    Real,
    Simulate,
}

impl TrdEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrdEnv::Real => "REAL",
            TrdEnv::Simulate => "SIMULATE",
        }
    }
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
    SellShort,
    BuyBack,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
            OrderSide::SellShort => "SELL_SHORT",
            OrderSide::BuyBack => "BUY_BACK",
        }
    }
}

/// Order type. `Normal` is the vendor's name for a plain limit order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    #[default]
    Normal,
    Market,
    AbsoluteLimit,
}

/// Time-in-force.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    #[default]
    Day,
    Gtc,
}

/// Operation for the modify-order endpoint: change price/quantity, or cancel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModifyOrderOp {
    #[default]
    Normal,
    Cancel,
}

/// Vendor order lifecycle state. Unrecognized vendor values fail the
/// response decode loudly rather than mapping to a silent unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Submitting,
    Submitted,
    FilledPart,
    FilledAll,
    Cancelled,
    Failed,
    Disabled,
}

// ---------------------------------------------------------------------------
// Market data vocabulary
// ---------------------------------------------------------------------------

/// K-line period.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
pub enum KlPeriod {
    #[serde(rename = "1min")]
    OneMin,
    #[serde(rename = "5min")]
    FiveMin,
    #[serde(rename = "15min")]
    FifteenMin,
    #[serde(rename = "30min")]
    ThirtyMin,
    #[serde(rename = "60min")]
    SixtyMin,
    #[default]
    #[serde(rename = "day")]
    Day,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "month")]
    Month,
}

impl KlPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            KlPeriod::OneMin => "1min",
            KlPeriod::FiveMin => "5min",
            KlPeriod::FifteenMin => "15min",
            KlPeriod::ThirtyMin => "30min",
            KlPeriod::SixtyMin => "60min",
            KlPeriod::Day => "day",
            KlPeriod::Week => "week",
            KlPeriod::Month => "month",
        }
    }
}

/// Corporate-action adjustment for historical candles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum AdjustType {
    None,
    /// Forward adjusted (the vendor's qfq).
    #[default]
    Qfq,
    /// Backward adjusted (the vendor's hfq).
    Hfq,
}

/// Security type carried on watchlist rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityType {
    Stock,
    Index,
    Etf,
    Warrant,
    Option,
    Future,
    Bond,
}

impl SecurityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityType::Stock => "STOCK",
            SecurityType::Index => "INDEX",
            SecurityType::Etf => "ETF",
            SecurityType::Warrant => "WARRANT",
            SecurityType::Option => "OPTION",
            SecurityType::Future => "FUTURE",
            SecurityType::Bond => "BOND",
        }
    }
}

/// Watchlist group filter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupType {
    #[default]
    All,
    System,
    Custom,
}

/// Account risk classification, a fixed vendor enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskStatus {
    AbsoluteSafe,
    Safe,
    Warning,
    Danger,
}

impl RiskStatus {
    /// Descriptive label shown to the agent.
    pub fn label(&self) -> &'static str {
        match self {
            RiskStatus::AbsoluteSafe => "absolutely safe (no borrowed funds)",
            RiskStatus::Safe => "safe (margin level healthy)",
            RiskStatus::Warning => "warning (approaching margin call level)",
            RiskStatus::Danger => "danger (at risk of forced liquidation)",
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Static description of one watchlist security as returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityStatic {
    pub code: String,
    pub name: String,
    pub lot_size: u32,
    pub stock_type: SecurityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_date: Option<String>,
    /// Option/warrant extras, absent for plain stock rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike_time: Option<String>,
}

/// One watchlist group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub group_name: String,
    pub group_type: GroupType,
}

/// Real-time snapshot for one security.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub code: String,
    pub name: String,
    pub last_price: Decimal,
    pub open_price: Decimal,
    pub prev_close_price: Decimal,
    pub high_price: Decimal,
    pub low_price: Decimal,
    pub volume: u64,
    pub turnover: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turnover_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pb_ratio: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dividend_ratio_ttm: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest52_weeks_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest52_weeks_price: Option<Decimal>,
    pub update_time: String,
}

impl SnapshotRow {
    pub fn change(&self) -> Decimal {
        self.last_price - self.prev_close_price
    }

    pub fn change_rate(&self) -> Decimal {
        if self.prev_close_price.is_zero() {
            Decimal::ZERO
        } else {
            self.change() / self.prev_close_price * Decimal::ONE_HUNDRED
        }
    }
}

/// One OHLCV candle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub time_key: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
    pub turnover: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turnover_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pb_ratio: Option<Decimal>,
}

/// Position direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSide {
    Long,
    Short,
}

/// One open position, a read-only reflection of vendor account state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRow {
    pub code: String,
    pub name: String,
    pub qty: Decimal,
    pub can_sell_qty: Decimal,
    pub cost_price: Decimal,
    pub price: Decimal,
    pub market_val: Decimal,
    pub pl_val: Decimal,
    /// Percent, not fraction.
    pub pl_ratio: Decimal,
    pub side: PositionSide,
}

/// Cash balance in one settlement currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyCash {
    pub currency: String,
    pub cash: Decimal,
    pub available_balance: Decimal,
}

/// Account funds snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundsRow {
    pub total_assets: Decimal,
    pub cash: Decimal,
    pub market_val: Decimal,
    pub frozen_cash: Decimal,
    pub avl_withdrawal_cash: Decimal,
    /// Buying power.
    pub power: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_power_short: Option<Decimal>,
    pub currency_cash: Vec<CurrencyCash>,
    pub risk_status: RiskStatus,
}

/// Acknowledged order, echoed back by the gateway after placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRow {
    pub order_id: String,
    pub code: String,
    pub trd_side: OrderSide,
    pub order_type: OrderType,
    pub qty: Decimal,
    pub price: Decimal,
    pub order_status: OrderStatus,
    pub create_time: String,
}

/// One screened security returned by the stock filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRow {
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cur_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_val: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turnover_rate: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_from_code() {
        assert_eq!(Market::from_code("HK.00700").unwrap(), Market::Hk);
        assert_eq!(Market::from_code("US.AAPL").unwrap(), Market::Us);
        assert_eq!(Market::from_code("SH.600519").unwrap(), Market::Sh);
        assert_eq!(Market::from_code("SZ.000001").unwrap(), Market::Sz);
        assert!(Market::from_code("JP.7203").is_err());
        assert!(Market::from_code("AAPL").is_err());
    }

    #[test]
    fn test_market_routes_to_trd_market() {
        assert_eq!(Market::Hk.trd_market(), TrdMarket::Hk);
        assert_eq!(Market::Sh.trd_market(), TrdMarket::Cn);
        assert_eq!(Market::Sz.trd_market(), TrdMarket::Cn);
    }

    #[test]
    fn test_trd_market_table_indices_are_dense() {
        for (i, m) in TrdMarket::ALL.iter().enumerate() {
            assert_eq!(m.index(), i);
        }
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_value(KlPeriod::OneMin).unwrap(),
            serde_json::json!("1min")
        );
        assert_eq!(
            serde_json::to_value(OrderSide::SellShort).unwrap(),
            serde_json::json!("SELL_SHORT")
        );
        assert_eq!(
            serde_json::to_value(AdjustType::Qfq).unwrap(),
            serde_json::json!("qfq")
        );
    }

    #[test]
    fn test_unrecognized_risk_status_fails_loudly() {
        let err = serde_json::from_value::<RiskStatus>(serde_json::json!("LEVEL9"));
        assert!(err.is_err());
    }

    #[test]
    fn test_snapshot_change_rate() {
        use rust_decimal_macros::dec;
        let row = SnapshotRow {
            code: "US.AAPL".into(),
            name: "Apple".into(),
            last_price: dec!(110),
            open_price: dec!(101),
            prev_close_price: dec!(100),
            high_price: dec!(111),
            low_price: dec!(99),
            volume: 1_000,
            turnover: dec!(105000),
            turnover_rate: None,
            pe_ratio: None,
            pb_ratio: None,
            dividend_ratio_ttm: None,
            highest52_weeks_price: None,
            lowest52_weeks_price: None,
            update_time: "2025-01-02 16:00:00".into(),
        };
        assert_eq!(row.change(), dec!(10));
        assert_eq!(row.change_rate(), dec!(10));
    }
}
