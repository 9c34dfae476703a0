pub mod dispatch;
pub mod protocol;
pub mod server;
pub mod tools;

pub use dispatch::Dispatcher;
pub use server::McpServer;
