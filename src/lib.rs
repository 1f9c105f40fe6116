//! Library catalog manager with an offloaded search worker.
//!
//! - `catalog`: in-memory catalog store with simulated storage latency.
//! - `search`: the long-lived search worker and its request/reply protocol.
//! - `gateway`: the activity log broadcast channel.
//! - `session`: glue that owns the above on behalf of a single caller.

pub mod books;
pub mod catalog;
pub mod core;
pub mod gateway;
pub mod search;
pub mod session;
pub mod users;
pub mod utils;
