use opend_core::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Requests sent to the gateway daemon. One request yields exactly one
/// response; both quote and trade sessions speak the same framed dialect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayRequest {
    /// Securities in one watchlist group.
    UserSecurity { group_name: String },
    /// All watchlist groups.
    UserSecurityGroup,
    /// Batch real-time snapshot.
    MarketSnapshot { code_list: Vec<String> },
    /// Historical candles.
    HistoryKline {
        code: String,
        start: Option<String>,
        end: Option<String>,
        ktype: KlPeriod,
        autype: AdjustType,
    },
    /// One page of a stock screen.
    StockFilter {
        market: Market,
        filter_list: Vec<FilterSpec>,
        plate_code: Option<String>,
        begin: u32,
        num: u32,
    },
    /// Unlock a trade session for order placement.
    UnlockTrade { credential: String },
    /// Account funds.
    Funds {
        trd_env: TrdEnv,
        acc_id: Option<u64>,
        currency: Option<String>,
    },
    /// Open positions.
    PositionList { trd_env: TrdEnv },
    /// Place an order.
    PlaceOrder {
        code: String,
        price: Decimal,
        qty: Decimal,
        trd_side: OrderSide,
        order_type: OrderType,
        time_in_force: TimeInForce,
        trd_env: TrdEnv,
        remark: Option<String>,
    },
    /// Modify or cancel an existing order.
    ModifyOrder {
        order_id: String,
        op: ModifyOrderOp,
        price: Option<Decimal>,
        qty: Option<Decimal>,
        trd_env: TrdEnv,
    },
}

/// Responses from the gateway daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayResponse {
    /// Handshake, sent by the daemon immediately after accept.
    Connected { version: String },
    UserSecurity { rows: Vec<SecurityStatic> },
    UserSecurityGroup { rows: Vec<SecurityGroup> },
    MarketSnapshot { rows: Vec<SnapshotRow> },
    HistoryKline { rows: Vec<Candle> },
    StockFilter {
        rows: Vec<FilterRow>,
        last_page: bool,
        all_count: u32,
    },
    TradeUnlocked,
    Funds { row: FundsRow },
    PositionList { rows: Vec<PositionRow> },
    OrderPlaced { row: OrderRow },
    OrderModified { order_id: String },
    Error { message: String },
}

/// Frame a message with a 4-byte length prefix (big-endian).
pub fn frame_message(msg: &[u8]) -> Vec<u8> {
    let len = msg.len() as u32;
    let mut framed = Vec::with_capacity(4 + msg.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(msg);
    framed
}
