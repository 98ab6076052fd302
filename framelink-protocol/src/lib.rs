//! Serial Packet Framing Protocol
//!
//! This crate implements the byte-level framing used between two devices
//! sharing a full-duplex UART. Both directions are driven one byte at a time
//! from interrupt context, so the encoder and decoder are explicit state
//! machines rather than buffer-at-once codecs.
//!
//! # Frame Format
//!
//! ```text
//! ┌──────┬───────────┬──────────────────────────┬──────────┐
//! │ SIZE │ SIZECHECK │ PAYLOAD                  │ CHECKSUM │
//! │ 1B   │ 1B (!SIZE)│ STATUS │ KIND │ DATA     │ 1B       │
//! └──────┴───────────┴──────────────────────────┴──────────┘
//! ```
//!
//! `SIZE` counts the whole frame. `CHECKSUM` is the wrapping 8-bit sum of
//! every byte before it, `SIZE` included. There is no start delimiter: the
//! receiver locks on to any `[SIZE][!SIZE]` pair and relies on the checksum
//! to reject false starts.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod frame;
pub mod packet;
pub mod rx;
pub mod tx;

pub use frame::{
    encode_frame, FRAME_OVERHEAD, MAX_DATA_LENGTH, MAX_FRAME_SIZE, MAX_PAYLOAD_LENGTH,
    MIN_FRAME_SIZE, PAYLOAD_HEADER_LENGTH,
};
pub use packet::{Packet, PacketError, PacketPool, PacketStore};
pub use rx::{Receiver, RxEvent, RxPhase};
pub use tx::{Transmitter, TxPhase, TxRejectReason, TxRejected};
