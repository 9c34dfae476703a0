use crate::models::TrdMarket;

/// Errors surfaced by the brokerage adapter.
///
/// Client errors (bad arguments, missing routes) are raised before any
/// gateway I/O; the rest wrap transport or vendor failures. None of them
/// crosses the MCP transport as anything but a user-visible text block.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("gateway connection failed: {0}")]
    ConnectionFailed(String),

    #[error("quote session not connected (is the gateway daemon running and logged in?)")]
    QuoteNotConnected,

    #[error("no trading session connected (an unlock credential is required for trading)")]
    TradeNotConnected,

    #[error("no trading session for market {0} (segment failed to connect or unlock)")]
    NoTradeRoute(TrdMarket),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("vendor error: {0}")]
    Vendor(String),

    #[error("gateway protocol error: {0}")]
    Protocol(String),
}

impl AdapterError {
    /// True for errors raised locally, before any gateway call was made.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AdapterError::InvalidArgument(_)
                | AdapterError::NoTradeRoute(_)
                | AdapterError::QuoteNotConnected
                | AdapterError::TradeNotConnected
        )
    }
}
