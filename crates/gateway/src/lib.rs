pub mod adapter;
pub mod analytics;
pub mod protocol;
pub mod session;

pub use adapter::{
    AdapterStatus, BrokerAdapter, GatewayConfig, OrderRequest, WatchlistEntry, MAX_SNAPSHOT_BATCH,
};
pub use analytics::{KlineReport, KlineSummary, TechnicalReport, INDICATOR_MIN_CANDLES};
