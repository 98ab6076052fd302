//! framelink Hardware Abstraction Layer
//!
//! This crate defines the byte-level serial channel that the framing core
//! drives from interrupt context. Chip-specific crates implement it on top
//! of their UART peripheral registers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  framelink-core (SerialLink driver)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  framelink-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!           ┌───────────────────┐
//!           │ framelink-hal-    │
//!           │    rp2040         │
//!           └───────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::ByteTx`], [`uart::ByteRx`] - Single-byte serial I/O
//! - [`uart::ByteChannel`] - Full-duplex channel with both halves

#![no_std]
#![deny(unsafe_code)]

pub mod uart;

// Re-export key traits at crate root for convenience
pub use uart::{ByteChannel, ByteRx, ByteTx, LineConfig};
