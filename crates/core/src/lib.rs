pub mod error;
pub mod filter;
pub mod models;

pub use error::*;
pub use filter::*;
pub use models::*;
