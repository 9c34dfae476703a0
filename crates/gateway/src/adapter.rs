use opend_core::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::analytics::{self, KlineReport};
use crate::protocol::{GatewayRequest, GatewayResponse};
use crate::session::GatewaySession;

/// Hard cap on one snapshot batch, enforced before any gateway I/O.
pub const MAX_SNAPSHOT_BATCH: usize = 400;

/// Screening page size and inter-page delay. The delay exists only to stay
/// under the vendor's published request budget for the filter endpoint.
const FILTER_PAGE_SIZE: u32 = 200;
const FILTER_PAGE_DELAY: Duration = Duration::from_secs(3);

/// Modify/cancel is accepted on a single segment's session.
const MODIFY_ROUTE: TrdMarket = TrdMarket::Hk;

/// Configuration for connecting to the gateway daemon.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Trading unlock credential. Without it only quote capabilities work.
    pub unlock_credential: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 11111,
            unlock_credential: None,
        }
    }
}

/// One watchlist security with its market derived from the code prefix.
#[derive(Debug, Clone, Serialize)]
pub struct WatchlistEntry {
    pub code: String,
    pub name: String,
    pub market: Market,
    pub lot_size: u32,
    pub stock_type: SecurityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike_time: Option<String>,
}

impl WatchlistEntry {
    fn from_row(row: SecurityStatic) -> Result<Self, AdapterError> {
        let market = Market::from_code(&row.code)
            .map_err(|_| AdapterError::Protocol(format!("watchlist row with bad code: {}", row.code)))?;
        Ok(Self {
            code: row.code,
            name: row.name,
            market,
            lot_size: row.lot_size,
            stock_type: row.stock_type,
            listing_date: row.listing_date,
            option_type: row.option_type,
            strike_price: row.strike_price,
            strike_time: row.strike_time,
        })
    }
}

/// Connection state surfaced by the status tool.
#[derive(Debug, Clone, Serialize)]
pub struct AdapterStatus {
    pub host: String,
    pub port: u16,
    pub quote_connected: bool,
    pub trade_markets: Vec<TrdMarket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Full order-placement request.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub code: String,
    pub price: Decimal,
    pub qty: Decimal,
    pub trd_side: OrderSide,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub trd_env: TrdEnv,
    pub remark: Option<String>,
}

/// The brokerage adapter: one quote session plus a fixed per-segment table
/// of trade sessions. Explicitly constructed and owned by the dispatcher;
/// there is no global instance.
///
/// Every capability method validates its arguments locally, then performs at
/// most one logical gateway operation. Failures are logged, recorded in
/// `last_error`, and returned; nothing here panics or retries.
pub struct BrokerAdapter {
    config: GatewayConfig,
    quote: Option<GatewaySession>,
    trade: [Option<GatewaySession>; 3],
    last_error: Option<String>,
}

impl BrokerAdapter {
    /// Build an adapter with no live sessions. Used by tests and as the
    /// base for [`BrokerAdapter::connect`].
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            quote: None,
            trade: [None, None, None],
            last_error: None,
        }
    }

    /// Connect to the gateway. Never fails outward: connection problems are
    /// recorded and surfaced later via [`BrokerAdapter::status`].
    pub async fn connect(config: GatewayConfig) -> Self {
        let mut adapter = Self::new(config);
        adapter.init().await;
        adapter
    }

    async fn init(&mut self) {
        let host = self.config.host.clone();
        let port = self.config.port;

        match GatewaySession::connect(&host, port).await {
            Ok((session, version)) => {
                info!(host = %host, port, version = %version, "quote session connected");
                self.quote = Some(session);
            }
            Err(e) => {
                warn!(host = %host, port, error = %e, "quote session failed");
                self.last_error = Some(e.to_string());
            }
        }

        let Some(credential) = self.config.unlock_credential.clone() else {
            return;
        };

        // Each segment connects and unlocks independently; one failing
        // segment must not take the others down with it.
        for market in TrdMarket::ALL {
            match self.open_trade_session(&host, port, market, &credential).await {
                Ok(session) => {
                    info!(market = %market, "trade session unlocked");
                    self.trade[market.index()] = Some(session);
                }
                Err(e) => {
                    warn!(market = %market, error = %e, "trade session failed");
                    self.last_error = Some(e.to_string());
                }
            }
        }
    }

    async fn open_trade_session(
        &self,
        host: &str,
        port: u16,
        market: TrdMarket,
        credential: &str,
    ) -> Result<GatewaySession, AdapterError> {
        let (mut session, _version) = GatewaySession::connect(host, port).await?;
        let resp = session
            .call(&GatewayRequest::UnlockTrade {
                credential: credential.to_string(),
            })
            .await?;
        match resp {
            GatewayResponse::TradeUnlocked => Ok(session),
            GatewayResponse::Error { message } => Err(AdapterError::Vendor(format!(
                "unlock failed for {market}: {message}"
            ))),
            other => Err(Self::unexpected(&other)),
        }
    }

    pub fn status(&self) -> AdapterStatus {
        AdapterStatus {
            host: self.config.host.clone(),
            port: self.config.port,
            quote_connected: self.quote.is_some(),
            trade_markets: TrdMarket::ALL
                .into_iter()
                .filter(|m| self.trade[m.index()].is_some())
                .collect(),
            last_error: self.last_error.clone(),
        }
    }

    /// Release all sessions. Safe to call any number of times; dropping the
    /// adapter closes any remaining sockets as well.
    pub async fn close(&mut self) {
        if let Some(mut session) = self.quote.take() {
            session.shutdown().await;
        }
        for slot in &mut self.trade {
            if let Some(mut session) = slot.take() {
                session.shutdown().await;
            }
        }
    }

    // -- plumbing -----------------------------------------------------------

    fn fail(&mut self, e: AdapterError) -> AdapterError {
        error!(error = %e, "gateway call failed");
        self.last_error = Some(e.to_string());
        e
    }

    fn unexpected(resp: &GatewayResponse) -> AdapterError {
        AdapterError::Protocol(format!("unexpected gateway response: {resp:?}"))
    }

    async fn quote_call(&mut self, req: GatewayRequest) -> Result<GatewayResponse, AdapterError> {
        let Some(session) = self.quote.as_mut() else {
            return Err(AdapterError::QuoteNotConnected);
        };
        match session.call(&req).await {
            Ok(GatewayResponse::Error { message }) => Err(self.fail(AdapterError::Vendor(message))),
            Ok(resp) => Ok(resp),
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn trade_call(
        &mut self,
        market: TrdMarket,
        req: GatewayRequest,
    ) -> Result<GatewayResponse, AdapterError> {
        let Some(session) = self.trade[market.index()].as_mut() else {
            return Err(AdapterError::NoTradeRoute(market));
        };
        match session.call(&req).await {
            Ok(GatewayResponse::Error { message }) => Err(self.fail(AdapterError::Vendor(message))),
            Ok(resp) => Ok(resp),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn first_trade_market(&self) -> Option<TrdMarket> {
        TrdMarket::ALL
            .into_iter()
            .find(|m| self.trade[m.index()].is_some())
    }

    /// Append a trading-hours reminder to vendor errors for code-scoped
    /// operations, so the agent can tell a closed market from a bad request.
    fn with_market_hint(e: AdapterError, market: Market) -> AdapterError {
        match e {
            AdapterError::Vendor(msg) => {
                AdapterError::Vendor(format!("{msg} ({})", market.trading_hours_hint()))
            }
            other => other,
        }
    }

    // -- quote capabilities -------------------------------------------------

    /// Securities in one watchlist group, in the gateway's order.
    pub async fn get_user_security(
        &mut self,
        group_name: &str,
    ) -> Result<Vec<WatchlistEntry>, AdapterError> {
        if group_name.trim().is_empty() {
            return Err(AdapterError::InvalidArgument(
                "group_name must not be empty".into(),
            ));
        }
        let resp = self
            .quote_call(GatewayRequest::UserSecurity {
                group_name: group_name.to_string(),
            })
            .await?;
        match resp {
            GatewayResponse::UserSecurity { rows } => rows
                .into_iter()
                .map(WatchlistEntry::from_row)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| self.fail(e)),
            other => Err(self.fail(Self::unexpected(&other))),
        }
    }

    /// Watchlist groups, filtered by the requested type.
    pub async fn get_user_security_group(
        &mut self,
        group_type: GroupType,
    ) -> Result<Vec<SecurityGroup>, AdapterError> {
        let resp = self.quote_call(GatewayRequest::UserSecurityGroup).await?;
        match resp {
            GatewayResponse::UserSecurityGroup { rows } => Ok(rows
                .into_iter()
                .filter(|g| match group_type {
                    GroupType::All => true,
                    GroupType::System => g.group_type == GroupType::System,
                    GroupType::Custom => g.group_type == GroupType::Custom,
                })
                .collect()),
            other => Err(self.fail(Self::unexpected(&other))),
        }
    }

    /// Batch snapshot, capped at [`MAX_SNAPSHOT_BATCH`] codes.
    pub async fn get_market_snapshot(
        &mut self,
        code_list: &[String],
    ) -> Result<Vec<SnapshotRow>, AdapterError> {
        if code_list.is_empty() {
            return Err(AdapterError::InvalidArgument("code_list is empty".into()));
        }
        if code_list.len() > MAX_SNAPSHOT_BATCH {
            return Err(AdapterError::InvalidArgument(format!(
                "code_list has {} entries, at most {MAX_SNAPSHOT_BATCH} are allowed per call",
                code_list.len()
            )));
        }
        for code in code_list {
            Market::from_code(code)?;
        }

        let resp = self
            .quote_call(GatewayRequest::MarketSnapshot {
                code_list: code_list.to_vec(),
            })
            .await?;
        match resp {
            GatewayResponse::MarketSnapshot { rows } => Ok(rows),
            other => Err(self.fail(Self::unexpected(&other))),
        }
    }

    /// Historical candles plus summary statistics and (when at least
    /// [`analytics::INDICATOR_MIN_CANDLES`] candles came back) the derived
    /// technical-indicator block.
    pub async fn get_history_kline(
        &mut self,
        code: &str,
        start: Option<String>,
        end: Option<String>,
        ktype: KlPeriod,
        autype: AdjustType,
    ) -> Result<KlineReport, AdapterError> {
        let market = Market::from_code(code)?;

        let resp = self
            .quote_call(GatewayRequest::HistoryKline {
                code: code.to_string(),
                start,
                end,
                ktype,
                autype,
            })
            .await
            .map_err(|e| Self::with_market_hint(e, market))?;

        let rows = match resp {
            GatewayResponse::HistoryKline { rows } => rows,
            other => return Err(self.fail(Self::unexpected(&other))),
        };

        let Some(summary) = analytics::summarize(&rows) else {
            return Err(self.fail(AdapterError::Vendor(format!(
                "no candles returned for {code} in the requested range"
            ))));
        };
        let technicals = analytics::technicals(&rows);

        Ok(KlineReport {
            code: code.to_string(),
            period: ktype,
            adjust: autype,
            summary,
            technicals,
            candles: rows,
        })
    }

    /// Stock screen. Validates every filter shape up front (the typed
    /// [`FilterSpec`] already guarantees one of the three shapes), then pages
    /// through the gateway until `num` rows are collected or the gateway
    /// reports the last page.
    pub async fn get_stock_filter(
        &mut self,
        market: Market,
        filter_list: &[FilterSpec],
        plate_code: Option<String>,
        begin: u32,
        num: u32,
    ) -> Result<Vec<FilterRow>, AdapterError> {
        if filter_list.is_empty() {
            return Err(AdapterError::InvalidArgument(
                "filter_list must contain at least one filter".into(),
            ));
        }
        if num == 0 {
            return Err(AdapterError::InvalidArgument("num must be at least 1".into()));
        }

        let mut rows: Vec<FilterRow> = Vec::new();
        let mut offset = begin;
        loop {
            let want = (num - rows.len() as u32).min(FILTER_PAGE_SIZE);
            let resp = self
                .quote_call(GatewayRequest::StockFilter {
                    market,
                    filter_list: filter_list.to_vec(),
                    plate_code: plate_code.clone(),
                    begin: offset,
                    num: want,
                })
                .await?;
            let (page, last_page) = match resp {
                GatewayResponse::StockFilter {
                    rows: page,
                    last_page,
                    all_count: _,
                } => (page, last_page),
                other => return Err(self.fail(Self::unexpected(&other))),
            };

            let page_len = page.len() as u32;
            rows.extend(page);
            if rows.len() as u32 >= num || last_page || page_len < want {
                break;
            }
            offset += page_len;
            // vendor rate limit on the filter endpoint
            sleep(FILTER_PAGE_DELAY).await;
        }

        rows.truncate(num as usize);
        Ok(rows)
    }

    // -- trade capabilities -------------------------------------------------

    /// Account funds, served by the first connected trade session.
    pub async fn get_funds(
        &mut self,
        trd_env: TrdEnv,
        acc_id: Option<u64>,
        currency: Option<String>,
    ) -> Result<FundsRow, AdapterError> {
        let market = self
            .first_trade_market()
            .ok_or(AdapterError::TradeNotConnected)?;
        let resp = self
            .trade_call(
                market,
                GatewayRequest::Funds {
                    trd_env,
                    acc_id,
                    currency,
                },
            )
            .await?;
        match resp {
            GatewayResponse::Funds { row } => Ok(row),
            other => Err(self.fail(Self::unexpected(&other))),
        }
    }

    /// Open positions aggregated across every connected segment. A segment
    /// that fails to answer is logged and skipped; the others still count.
    pub async fn get_positions(
        &mut self,
        trd_env: TrdEnv,
    ) -> Result<Vec<PositionRow>, AdapterError> {
        if self.first_trade_market().is_none() {
            return Err(AdapterError::TradeNotConnected);
        }

        let mut positions = Vec::new();
        for market in TrdMarket::ALL {
            if self.trade[market.index()].is_none() {
                continue;
            }
            match self
                .trade_call(market, GatewayRequest::PositionList { trd_env })
                .await
            {
                Ok(GatewayResponse::PositionList { rows }) => positions.extend(rows),
                Ok(other) => {
                    warn!(market = %market, "unexpected position response: {other:?}");
                }
                Err(e) => {
                    warn!(market = %market, error = %e, "position query failed, segment skipped");
                }
            }
        }
        Ok(positions)
    }

    /// Place an order, routed by the code's market prefix. A market whose
    /// segment has no trade session is a client error raised before any I/O.
    pub async fn place_order(&mut self, req: OrderRequest) -> Result<OrderRow, AdapterError> {
        if req.price <= Decimal::ZERO {
            return Err(AdapterError::InvalidArgument("price must be positive".into()));
        }
        if req.qty <= Decimal::ZERO {
            return Err(AdapterError::InvalidArgument("qty must be positive".into()));
        }
        let market = Market::from_code(&req.code)?;

        let resp = self
            .trade_call(
                market.trd_market(),
                GatewayRequest::PlaceOrder {
                    code: req.code.clone(),
                    price: req.price,
                    qty: req.qty,
                    trd_side: req.trd_side,
                    order_type: req.order_type,
                    time_in_force: req.time_in_force,
                    trd_env: req.trd_env,
                    remark: req.remark.clone(),
                },
            )
            .await
            .map_err(|e| Self::with_market_hint(e, market))?;
        match resp {
            GatewayResponse::OrderPlaced { row } => Ok(row),
            other => Err(self.fail(Self::unexpected(&other))),
        }
    }

    /// Modify or cancel an existing order on the fixed modify route.
    pub async fn modify_order(
        &mut self,
        order_id: &str,
        op: ModifyOrderOp,
        price: Option<Decimal>,
        qty: Option<Decimal>,
        trd_env: TrdEnv,
    ) -> Result<String, AdapterError> {
        if order_id.trim().is_empty() {
            return Err(AdapterError::InvalidArgument("order_id must not be empty".into()));
        }
        if op == ModifyOrderOp::Normal && price.is_none() && qty.is_none() {
            return Err(AdapterError::InvalidArgument(
                "a normal modification needs a new price or qty".into(),
            ));
        }

        let resp = self
            .trade_call(
                MODIFY_ROUTE,
                GatewayRequest::ModifyOrder {
                    order_id: order_id.to_string(),
                    op,
                    price,
                    qty,
                    trd_env,
                },
            )
            .await?;
        match resp {
            GatewayResponse::OrderModified { order_id } => Ok(order_id),
            other => Err(self.fail(Self::unexpected(&other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame_message;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn offline() -> BrokerAdapter {
        BrokerAdapter::new(GatewayConfig::default())
    }

    type Responder = dyn Fn(usize, GatewayRequest) -> GatewayResponse + Send + Sync;

    /// In-process gateway speaking the framed protocol. Connections are
    /// numbered in accept order: 0 is the quote session, then one trade
    /// session per segment in `TrdMarket::ALL` order.
    async fn spawn_gateway(
        respond: impl Fn(usize, GatewayRequest) -> GatewayResponse + Send + Sync + 'static,
    ) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let respond: Arc<Responder> = Arc::new(respond);
        tokio::spawn(async move {
            let mut next_conn = 0usize;
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let conn = next_conn;
                next_conn += 1;
                let respond = Arc::clone(&respond);
                tokio::spawn(async move {
                    send_frame(
                        &mut stream,
                        &GatewayResponse::Connected {
                            version: "fake-1.0".into(),
                        },
                    )
                    .await;
                    while let Some(req) = read_frame(&mut stream).await {
                        let resp = respond(conn, req);
                        send_frame(&mut stream, &resp).await;
                    }
                });
            }
        });
        port
    }

    async fn send_frame(stream: &mut TcpStream, resp: &GatewayResponse) {
        let body = serde_json::to_vec(resp).unwrap();
        stream.write_all(&frame_message(&body)).await.unwrap();
    }

    async fn read_frame(stream: &mut TcpStream) -> Option<GatewayRequest> {
        let mut len = [0u8; 4];
        stream.read_exact(&mut len).await.ok()?;
        let mut body = vec![0u8; u32::from_be_bytes(len) as usize];
        stream.read_exact(&mut body).await.ok()?;
        serde_json::from_slice(&body).ok()
    }

    async fn connected(port: u16, credential: Option<&str>) -> BrokerAdapter {
        BrokerAdapter::connect(GatewayConfig {
            host: "127.0.0.1".into(),
            port,
            unlock_credential: credential.map(str::to_string),
        })
        .await
    }

    fn filter_row(i: u32) -> FilterRow {
        FilterRow {
            code: format!("HK.{i:05}"),
            name: format!("stock {i}"),
            cur_price: None,
            market_val: None,
            volume: None,
            turnover_rate: None,
        }
    }

    fn price_filter() -> Vec<FilterSpec> {
        vec![FilterSpec::Simple(SimpleFilter {
            field: SimpleField::CurPrice,
            min: Some(dec!(2)),
            max: None,
        })]
    }

    fn order(code: &str) -> OrderRequest {
        OrderRequest {
            code: code.to_string(),
            price: dec!(100),
            qty: dec!(100),
            trd_side: OrderSide::Buy,
            order_type: OrderType::Normal,
            time_in_force: TimeInForce::Day,
            trd_env: TrdEnv::Simulate,
            remark: None,
        }
    }

    #[tokio::test]
    async fn test_snapshot_batch_cap_is_checked_before_any_io() {
        let mut adapter = offline();
        let codes: Vec<String> = (0..=MAX_SNAPSHOT_BATCH).map(|i| format!("US.S{i}")).collect();
        let err = adapter.get_market_snapshot(&codes).await.unwrap_err();
        // an over-long batch must fail on the cap, not on the missing session
        assert!(matches!(err, AdapterError::InvalidArgument(_)), "{err}");
        assert!(err.to_string().contains("400"));
    }

    #[tokio::test]
    async fn test_snapshot_rejects_empty_and_bad_codes() {
        let mut adapter = offline();
        assert!(matches!(
            adapter.get_market_snapshot(&[]).await.unwrap_err(),
            AdapterError::InvalidArgument(_)
        ));
        let err = adapter
            .get_market_snapshot(&["TOKYO.7203".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_place_order_without_route_is_a_client_error() {
        let mut adapter = offline();
        let err = adapter.place_order(order("US.AAPL")).await.unwrap_err();
        assert!(matches!(err, AdapterError::NoTradeRoute(TrdMarket::Us)));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_place_order_validates_price_and_qty_first() {
        let mut adapter = offline();
        let mut bad = order("US.AAPL");
        bad.price = dec!(0);
        assert!(matches!(
            adapter.place_order(bad).await.unwrap_err(),
            AdapterError::InvalidArgument(_)
        ));
        let mut bad = order("US.AAPL");
        bad.qty = dec!(-1);
        assert!(matches!(
            adapter.place_order(bad).await.unwrap_err(),
            AdapterError::InvalidArgument(_)
        ));
    }

    #[tokio::test]
    async fn test_filter_rejects_empty_list_before_any_io() {
        let mut adapter = offline();
        let err = adapter
            .get_stock_filter(Market::Hk, &[], None, 0, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_funds_and_positions_require_a_trade_session() {
        let mut adapter = offline();
        assert!(matches!(
            adapter.get_funds(TrdEnv::Simulate, None, None).await.unwrap_err(),
            AdapterError::TradeNotConnected
        ));
        assert!(matches!(
            adapter.get_positions(TrdEnv::Real).await.unwrap_err(),
            AdapterError::TradeNotConnected
        ));
    }

    #[tokio::test]
    async fn test_modify_requires_change_or_cancel() {
        let mut adapter = offline();
        let err = adapter
            .modify_order("123", ModifyOrderOp::Normal, None, None, TrdEnv::Real)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidArgument(_)));
        // with a price it gets past validation and fails on the missing route
        let err = adapter
            .modify_order("123", ModifyOrderOp::Normal, Some(dec!(1)), None, TrdEnv::Real)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::NoTradeRoute(TrdMarket::Hk)));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut adapter = offline();
        adapter.close().await;
        adapter.close().await;
    }

    #[tokio::test]
    async fn test_status_reports_disconnected_state() {
        let adapter = offline();
        let status = adapter.status();
        assert_eq!(status.host, "127.0.0.1");
        assert_eq!(status.port, 11111);
        assert!(!status.quote_connected);
        assert!(status.trade_markets.is_empty());
        assert!(status.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_accumulates_pages_and_truncates_to_num() {
        // pages of 200 regardless of the requested size, never the last page
        let port = spawn_gateway(|_, req| match req {
            GatewayRequest::StockFilter { begin, .. } => GatewayResponse::StockFilter {
                rows: (begin..begin + 200).map(filter_row).collect(),
                last_page: false,
                all_count: 10_000,
            },
            other => GatewayResponse::Error {
                message: format!("unexpected: {other:?}"),
            },
        })
        .await;
        let mut adapter = connected(port, None).await;

        let rows = adapter
            .get_stock_filter(Market::Hk, &price_filter(), None, 0, 450)
            .await
            .unwrap();
        // three pages fetched, offsets advancing by page length, surplus cut
        assert_eq!(rows.len(), 450);
        assert_eq!(rows[0].code, "HK.00000");
        assert_eq!(rows[200].code, "HK.00200");
        assert_eq!(rows[449].code, "HK.00449");
        adapter.close().await;
    }

    #[tokio::test]
    async fn test_filter_stops_on_last_page() {
        let port = spawn_gateway(|_, req| match req {
            GatewayRequest::StockFilter { begin, .. } => GatewayResponse::StockFilter {
                rows: (begin..begin + 10).map(filter_row).collect(),
                last_page: true,
                all_count: 10,
            },
            other => GatewayResponse::Error {
                message: format!("unexpected: {other:?}"),
            },
        })
        .await;
        let mut adapter = connected(port, None).await;

        let rows = adapter
            .get_stock_filter(Market::Hk, &price_filter(), None, 0, 200)
            .await
            .unwrap();
        assert_eq!(rows.len(), 10);
        adapter.close().await;
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let port = spawn_gateway(|_, req| match req {
            GatewayRequest::MarketSnapshot { code_list } => GatewayResponse::MarketSnapshot {
                rows: code_list.into_iter().map(snapshot_row).collect(),
            },
            other => GatewayResponse::Error {
                message: format!("unexpected: {other:?}"),
            },
        })
        .await;
        let mut adapter = connected(port, None).await;
        assert!(adapter.status().quote_connected);

        let rows = adapter
            .get_market_snapshot(&["HK.00700".to_string(), "US.AAPL".to_string()])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].code, "HK.00700");
        adapter.close().await;
    }

    #[tokio::test]
    async fn test_positions_skip_a_failing_segment() {
        // connection 2 is the US trade session; it answers position queries
        // with an error and must be skipped, not propagated
        let port = spawn_gateway(|conn, req| match req {
            GatewayRequest::UnlockTrade { .. } => GatewayResponse::TradeUnlocked,
            GatewayRequest::PositionList { .. } => {
                if conn == 2 {
                    GatewayResponse::Error {
                        message: "segment offline".into(),
                    }
                } else {
                    GatewayResponse::PositionList {
                        rows: vec![position_row(conn)],
                    }
                }
            }
            other => GatewayResponse::Error {
                message: format!("unexpected: {other:?}"),
            },
        })
        .await;
        let mut adapter = connected(port, Some("secret")).await;
        let status = adapter.status();
        assert!(status.quote_connected);
        assert_eq!(status.trade_markets.len(), 3);

        let rows = adapter.get_positions(TrdEnv::Real).await.unwrap();
        assert_eq!(rows.len(), 2);
        adapter.close().await;
    }

    fn snapshot_row(code: String) -> SnapshotRow {
        SnapshotRow {
            code,
            name: "test".into(),
            last_price: dec!(100),
            open_price: dec!(99),
            prev_close_price: dec!(98),
            high_price: dec!(101),
            low_price: dec!(97),
            volume: 1_000,
            turnover: dec!(100000),
            turnover_rate: None,
            pe_ratio: None,
            pb_ratio: None,
            dividend_ratio_ttm: None,
            highest52_weeks_price: None,
            lowest52_weeks_price: None,
            update_time: "2025-01-02 16:00:00".into(),
        }
    }

    fn position_row(conn: usize) -> PositionRow {
        PositionRow {
            code: format!("HK.{conn:05}"),
            name: "pos".into(),
            qty: dec!(100),
            can_sell_qty: dec!(100),
            cost_price: dec!(10),
            price: dec!(11),
            market_val: dec!(1100),
            pl_val: dec!(100),
            pl_ratio: dec!(10),
            side: PositionSide::Long,
        }
    }
}
