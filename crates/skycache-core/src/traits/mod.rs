//! Core traits for skycache
//!
//! This module defines the capability interfaces injected into the core.
//!
//! - [`PositionSource`]: Acquire the device position
//! - [`HttpClient`]: Perform the forecast request
//! - [`Persistence`]: Durable key-value storage
//! - [`Alerter`]: User-facing failure notifications

pub mod alerter;
pub mod http_client;
pub mod persistence;
pub mod position_source;

pub use alerter::{Alert, Alerter, LogAlerter, NullAlerter};
pub use http_client::{HttpClient, HttpResponse, ResponseBody};
pub use persistence::Persistence;
pub use position_source::{Position, PositionSource};
