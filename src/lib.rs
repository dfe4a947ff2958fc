//! Courier - asynchronous log and notification pipelines
//!
//! Two producer/consumer pipelines share one pattern: any thread enqueues, a
//! dedicated thread drains in order and performs the side effect. The log
//! pipeline writes to a size-rotated file; the notification pipeline forwards
//! to the presentation layer.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod pipeline;
pub mod settings;

#[cfg(test)]
mod test_support;
