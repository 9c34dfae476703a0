use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::KlPeriod;

// ---------------------------------------------------------------------------
// Stock screening filters
// ---------------------------------------------------------------------------
//
// Exactly three shapes are accepted, distinguished by a `type` tag. Anything
// else fails deserialization before a single gateway call is made.

/// Quote-derived fields usable in a simple range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimpleField {
    CurPrice,
    MarketVal,
    Volume,
    Turnover,
    TurnoverRate,
    PeRatio,
    PbRatio,
}

/// Financial-statement fields, scoped to a reporting quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinancialField {
    NetProfit,
    NetProfitGrowth,
    CurrentRatio,
    QuickRatio,
    ReturnOnEquityRate,
}

/// Reporting period a financial filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinancialQuarter {
    Annual,
    FirstQuarter,
    Interim,
    ThirdQuarter,
    MostRecentQuarter,
}

/// Technical fields usable in a pairwise comparison filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TechnicalField {
    Price,
    Ma5,
    Ma10,
    Ma20,
    Ma30,
    Ma60,
    Ma120,
    Ma250,
    Ema5,
    Ema10,
    Ema20,
    Ema60,
    Rsi,
}

/// How the first technical field must sit relative to the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelativePosition {
    More,
    Less,
    CrossUp,
    CrossDown,
}

/// Numeric range on a quote field, e.g. 2 <= CUR_PRICE <= 1000.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SimpleFilter {
    pub field: SimpleField,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub min: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub max: Option<Decimal>,
}

/// Numeric range on a financial-statement field for one reporting quarter.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FinancialFilter {
    pub field: FinancialField,
    pub quarter: FinancialQuarter,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub min: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub max: Option<Decimal>,
}

/// Pairwise comparison between two technical fields on one K-line period,
/// e.g. MA10 CROSS_UP MA60 on daily candles.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CustomFilter {
    pub field_first: TechnicalField,
    pub field_second: TechnicalField,
    pub relative_position: RelativePosition,
    #[serde(default)]
    pub period: KlPeriod,
}

/// One entry of a stock screen, in one of the three supported shapes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterSpec {
    Simple(SimpleFilter),
    Financial(FinancialFilter),
    Custom(CustomFilter),
}
