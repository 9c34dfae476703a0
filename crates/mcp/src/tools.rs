//! Tool registry: one parameter struct per tool, with its JSON schema
//! derived from the same types that deserialize the arguments. A request
//! the schema admits is a request the dispatcher can parse.

use opend_core::{
    AdjustType, FilterSpec, GroupType, KlPeriod, Market, ModifyOrderOp, OrderSide, OrderType,
    TimeInForce, TrdEnv,
};
use rust_decimal::Decimal;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::Value;

use crate::protocol::ToolDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    GetUserSecurity,
    GetUserSecurityGroup,
    GetMarketSnapshot,
    GetHistoryKline,
    GetStockFilter,
    GetFunds,
    GetPositions,
    PlaceOrder,
    ModifyOrder,
    GetClientStatus,
}

impl ToolName {
    pub const ALL: [ToolName; 10] = [
        ToolName::GetUserSecurity,
        ToolName::GetUserSecurityGroup,
        ToolName::GetMarketSnapshot,
        ToolName::GetHistoryKline,
        ToolName::GetStockFilter,
        ToolName::GetFunds,
        ToolName::GetPositions,
        ToolName::PlaceOrder,
        ToolName::ModifyOrder,
        ToolName::GetClientStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::GetUserSecurity => "get_user_security",
            ToolName::GetUserSecurityGroup => "get_user_security_group",
            ToolName::GetMarketSnapshot => "get_market_snapshot",
            ToolName::GetHistoryKline => "get_history_kline",
            ToolName::GetStockFilter => "get_stock_filter",
            ToolName::GetFunds => "get_funds",
            ToolName::GetPositions => "get_positions",
            ToolName::PlaceOrder => "place_order",
            ToolName::ModifyOrder => "modify_order",
            ToolName::GetClientStatus => "get_client_status",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    fn description(&self) -> &'static str {
        match self {
            ToolName::GetUserSecurity => {
                "List the securities in one watchlist group, e.g. \"All\" or a custom group name."
            }
            ToolName::GetUserSecurityGroup => {
                "List watchlist groups, optionally restricted to system or custom groups."
            }
            ToolName::GetMarketSnapshot => {
                "Real-time snapshot (price, volume, valuation) for up to 400 security codes \
                 like HK.00700 or US.AAPL."
            }
            ToolName::GetHistoryKline => {
                "Historical candles for one security, with summary statistics and, given \
                 enough candles, MACD, Bollinger Bands and moving-average levels."
            }
            ToolName::GetStockFilter => {
                "Screen a market with simple, financial or technical-pattern filters. \
                 Results are paged transparently."
            }
            ToolName::GetFunds => "Account funds: cash, market value, buying power per currency.",
            ToolName::GetPositions => "Open positions across every connected trade market.",
            ToolName::PlaceOrder => {
                "Place an order. The code prefix picks the trade route; price and quantity \
                 are required."
            }
            ToolName::ModifyOrder => "Modify the price/quantity of an order, or cancel it.",
            ToolName::GetClientStatus => {
                "Connection status of the gateway adapter: quote link, trade routes, last error."
            }
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UserSecurityParams {
    /// Watchlist group name, e.g. "All".
    pub group_name: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UserSecurityGroupParams {
    #[serde(default)]
    pub group_type: GroupType,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MarketSnapshotParams {
    /// Full security codes with market prefix, at most 400 per call.
    pub code_list: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct HistoryKlineParams {
    pub code: String,
    /// Range start, "YYYY-MM-DD". Defaults to the vendor's range.
    #[serde(default)]
    pub start: Option<String>,
    /// Range end, "YYYY-MM-DD".
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub ktype: KlPeriod,
    #[serde(default)]
    pub autype: AdjustType,
}

fn default_filter_num() -> u32 {
    200
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StockFilterParams {
    pub market: Market,
    /// One or more filters; every filter must carry its `type` tag.
    pub filter_list: Vec<FilterSpec>,
    /// Restrict the screen to one plate.
    #[serde(default)]
    pub plate_code: Option<String>,
    /// Result offset.
    #[serde(default)]
    pub begin: u32,
    /// Total rows wanted across all pages.
    #[serde(default = "default_filter_num")]
    pub num: u32,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FundsParams {
    #[serde(default)]
    pub trd_env: TrdEnv,
    #[serde(default)]
    pub acc_id: Option<u64>,
    /// Currency filter, e.g. "HKD" or "USD".
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PositionsParams {
    #[serde(default)]
    pub trd_env: TrdEnv,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PlaceOrderParams {
    /// Full security code; its market prefix selects the trade route.
    pub code: String,
    #[schemars(with = "f64")]
    pub price: Decimal,
    #[schemars(with = "f64")]
    pub qty: Decimal,
    pub trd_side: OrderSide,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub time_in_force: TimeInForce,
    #[serde(default)]
    pub trd_env: TrdEnv,
    #[serde(default)]
    pub remark: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ModifyOrderParams {
    pub order_id: String,
    #[serde(default)]
    pub op: ModifyOrderOp,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub price: Option<Decimal>,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub qty: Option<Decimal>,
    #[serde(default)]
    pub trd_env: TrdEnv,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClientStatusParams {}

fn schema_of<T: JsonSchema>() -> Value {
    // schema_for! output is plain data; serializing it cannot fail
    serde_json::to_value(schema_for!(T)).unwrap_or(Value::Null)
}

impl ToolName {
    fn input_schema(&self) -> Value {
        match self {
            ToolName::GetUserSecurity => schema_of::<UserSecurityParams>(),
            ToolName::GetUserSecurityGroup => schema_of::<UserSecurityGroupParams>(),
            ToolName::GetMarketSnapshot => schema_of::<MarketSnapshotParams>(),
            ToolName::GetHistoryKline => schema_of::<HistoryKlineParams>(),
            ToolName::GetStockFilter => schema_of::<StockFilterParams>(),
            ToolName::GetFunds => schema_of::<FundsParams>(),
            ToolName::GetPositions => schema_of::<PositionsParams>(),
            ToolName::PlaceOrder => schema_of::<PlaceOrderParams>(),
            ToolName::ModifyOrder => schema_of::<ModifyOrderParams>(),
            ToolName::GetClientStatus => schema_of::<ClientStatusParams>(),
        }
    }
}

/// Descriptors for `tools/list`, in a stable order.
pub fn descriptors() -> Vec<ToolDescriptor> {
    ToolName::ALL
        .into_iter()
        .map(|t| ToolDescriptor {
            name: t.as_str(),
            description: t.description(),
            input_schema: t.input_schema(),
        })
        .collect()
}
