//! Request protection for the HTTP surface.
//!
//! - **Rate Limiting**: governor-based per-IP request limits

pub mod rate_limit;

pub use rate_limit::RequestLimiter;
