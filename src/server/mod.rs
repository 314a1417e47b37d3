pub mod handlers;
pub mod http;
pub mod tools;

pub use http::router;
pub use tools::{to_mcp_error, RefineryServer};
