//! Maps tool calls onto the adapter and renders the results. Every tool
//! reply is a human-readable headline followed by the full payload as a
//! fenced JSON block, so both agents and their operators can read it.

use opend_gateway::{BrokerAdapter, OrderRequest};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::protocol::{CallToolParams, CallToolResult, ContentBlock, ToolsListResult};
use crate::tools::{
    self, ClientStatusParams, FundsParams, HistoryKlineParams, MarketSnapshotParams,
    ModifyOrderParams, PlaceOrderParams, PositionsParams, StockFilterParams, ToolName,
    UserSecurityGroupParams, UserSecurityParams,
};

/// Owns the adapter and serves `tools/list` and `tools/call`. One dispatcher
/// per server process; tool calls run strictly one at a time.
pub struct Dispatcher {
    adapter: BrokerAdapter,
}

impl Dispatcher {
    pub fn new(adapter: BrokerAdapter) -> Self {
        Self { adapter }
    }

    pub async fn close(&mut self) {
        self.adapter.close().await;
    }

    pub fn list_tools(&self) -> ToolsListResult {
        ToolsListResult {
            tools: tools::descriptors(),
        }
    }

    /// Run one tool call. Unknown tools and failing calls come back as
    /// `is_error` text results, never as transport errors.
    pub async fn call_tool(&mut self, call: CallToolParams) -> CallToolResult {
        let Some(tool) = ToolName::parse(&call.name) else {
            return CallToolResult::error(format!(
                "unknown tool: {} (see tools/list for what this server offers)",
                call.name
            ));
        };
        info!(tool = %tool, "tool call");
        match self.run(tool, call.arguments).await {
            Ok(result) => result,
            Err(message) => CallToolResult::error(message),
        }
    }

    async fn run(&mut self, tool: ToolName, args: Value) -> Result<CallToolResult, String> {
        match tool {
            ToolName::GetUserSecurity => {
                let p: UserSecurityParams = parse(args)?;
                let rows = self
                    .adapter
                    .get_user_security(&p.group_name)
                    .await
                    .map_err(stringify)?;
                if rows.is_empty() {
                    return Ok(CallToolResult::text(format!(
                        "No securities in group \"{}\". Likely causes: the gateway client is \
                         not running, the account is not logged in, or the group is empty.",
                        p.group_name
                    )));
                }
                report(
                    format!("{} securities in group \"{}\"", rows.len(), p.group_name),
                    &rows,
                )
            }
            ToolName::GetUserSecurityGroup => {
                let p: UserSecurityGroupParams = parse(args)?;
                let rows = self
                    .adapter
                    .get_user_security_group(p.group_type)
                    .await
                    .map_err(stringify)?;
                report(format!("{} watchlist groups", rows.len()), &rows)
            }
            ToolName::GetMarketSnapshot => {
                let p: MarketSnapshotParams = parse(args)?;
                let rows = self
                    .adapter
                    .get_market_snapshot(&p.code_list)
                    .await
                    .map_err(stringify)?;
                report(
                    format!(
                        "{} snapshot rows for {} requested codes",
                        rows.len(),
                        p.code_list.len()
                    ),
                    &rows,
                )
            }
            ToolName::GetHistoryKline => {
                let p: HistoryKlineParams = parse(args)?;
                let rep = self
                    .adapter
                    .get_history_kline(&p.code, p.start, p.end, p.ktype, p.autype)
                    .await
                    .map_err(stringify)?;
                let mut headline =
                    format!("{} candles for {}", rep.summary.count, rep.code);
                if rep.technicals.is_none() {
                    headline.push_str(" (too few candles for the indicator block)");
                }
                report(headline, &rep)
            }
            ToolName::GetStockFilter => {
                let p: StockFilterParams = parse(args)?;
                let rows = self
                    .adapter
                    .get_stock_filter(p.market, &p.filter_list, p.plate_code, p.begin, p.num)
                    .await
                    .map_err(stringify)?;
                report(
                    format!("{} matches on the {} screen", rows.len(), p.market),
                    &rows,
                )
            }
            ToolName::GetFunds => {
                let p: FundsParams = parse(args)?;
                let row = self
                    .adapter
                    .get_funds(p.trd_env, p.acc_id, p.currency)
                    .await
                    .map_err(stringify)?;
                report(
                    format!(
                        "Account funds ({}), risk level {}",
                        p.trd_env.as_str(),
                        row.risk_status.label()
                    ),
                    &row,
                )
            }
            ToolName::GetPositions => {
                let p: PositionsParams = parse(args)?;
                let rows = self.adapter.get_positions(p.trd_env).await.map_err(stringify)?;
                report(format!("{} open positions", rows.len()), &rows)
            }
            ToolName::PlaceOrder => {
                let p: PlaceOrderParams = parse(args)?;
                let row = self
                    .adapter
                    .place_order(OrderRequest {
                        code: p.code,
                        price: p.price,
                        qty: p.qty,
                        trd_side: p.trd_side,
                        order_type: p.order_type,
                        time_in_force: p.time_in_force,
                        trd_env: p.trd_env,
                        remark: p.remark,
                    })
                    .await
                    .map_err(stringify)?;
                report(
                    format!("Order {} submitted for {}", row.order_id, row.code),
                    &row,
                )
            }
            ToolName::ModifyOrder => {
                let p: ModifyOrderParams = parse(args)?;
                let op = p.op;
                let order_id = self
                    .adapter
                    .modify_order(&p.order_id, p.op, p.price, p.qty, p.trd_env)
                    .await
                    .map_err(stringify)?;
                let headline = match op {
                    opend_core::ModifyOrderOp::Cancel => {
                        format!("Cancel submitted for order {order_id}")
                    }
                    opend_core::ModifyOrderOp::Normal => {
                        format!("Modification submitted for order {order_id}")
                    }
                };
                report(headline, &json!({ "order_id": order_id }))
            }
            ToolName::GetClientStatus => {
                let _p: ClientStatusParams = parse(args)?;
                let status = self.adapter.status();
                let headline = if status.quote_connected {
                    format!(
                        "Connected to {}:{}, {} trade routes",
                        status.host,
                        status.port,
                        status.trade_markets.len()
                    )
                } else {
                    format!("Not connected to {}:{}", status.host, status.port)
                };
                report(headline, &status)
            }
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, String> {
    // agents may omit "arguments" entirely for parameterless tools
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| format!("invalid arguments: {e}"))
}

fn stringify(e: opend_core::AdapterError) -> String {
    e.to_string()
}

/// Render a result as two blocks: a human-readable headline, then the full
/// payload as a fenced JSON document.
fn report(headline: String, payload: &impl Serialize) -> Result<CallToolResult, String> {
    let body = serde_json::to_string_pretty(payload)
        .map_err(|e| format!("failed to render result: {e}"))?;
    Ok(CallToolResult {
        content: vec![
            ContentBlock::Text { text: headline },
            ContentBlock::Text {
                text: format!("```json\n{body}\n```"),
            },
        ],
        is_error: false,
    })
}
