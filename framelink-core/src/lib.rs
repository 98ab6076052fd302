//! Board-agnostic serial link driver
//!
//! This crate wires the framing state machines from `framelink-protocol`
//! to a `framelink-hal` byte channel:
//!
//! - Bounded packet queues between foreground and interrupt context
//! - The [`SerialLink`] facade with its interrupt entry points
//! - Link configuration and drop counters

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod link;
pub mod queue;
pub mod stats;

pub use config::{ConfigError, LinkConfig, ReceiveCallback};
pub use link::SerialLink;
pub use queue::PacketQueue;
pub use stats::LinkStats;
