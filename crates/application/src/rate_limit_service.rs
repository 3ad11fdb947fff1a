//! Fixed-window rate limiting ports and application service.
//!
//! Every throttled operation derives an identifier of the form
//! `"{operation-class}:{subject}"`, counts itself against the class rule and
//! aborts before touching the data store when the window is exhausted.

mod config;
mod ports;
mod service;

#[cfg(test)]
mod tests;

pub use config::{OperationClass, RateLimitRule};
pub use ports::{Clock, RateLimitDecision, RateLimitKey, RateLimitStore, SystemClock};
pub use service::{RateLimitService, Throttled};
