//! Line extraction and forwarding of container output.

pub mod extract;
pub mod processor;
pub mod sender;

#[cfg(test)]
pub mod testing;

pub use sender::{HttpLogSender, LogSender};
