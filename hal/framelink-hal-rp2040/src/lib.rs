//! RP2040 HAL for framelink
//!
//! Register-level byte channel on the RP2040's PL011 UARTs. Pin muxing and
//! baud rate are left to `embassy-rp`; this crate only takes over the data,
//! flag and interrupt registers once the peripheral is running.

#![no_std]
#![deny(unsafe_code)]

pub mod uart;

pub use uart::{gpio_to_uart, uart_config, Pl011Channel, UartId, UartIrq};
