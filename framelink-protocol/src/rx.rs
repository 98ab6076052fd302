//! Receive state machine.
//!
//! The receiver has no start delimiter to hunt for. While idle, any byte
//! below [`MAX_FRAME_SIZE`](crate::MAX_FRAME_SIZE) is taken as a candidate
//! SIZE. The next byte must be its complement; if it is not, that byte
//! becomes the new candidate, so alignment is recovered within the same
//! pass over the stream.
//!
//! A stray byte equal to `!SIZE` right before a frame whose SIZE is 56 or
//! more is itself a valid SIZE, so `[stray][SIZE]` passes the complement
//! check. The receiver then allocates for the wrong length and swallows the
//! real frame as body. That buffer is held only until the bogus frame's
//! length has been consumed, and its checksum then fails and releases it.

use crate::frame::{data_len, is_size_candidate, is_valid_size, payload_len};
use crate::packet::{Packet, PacketStore};

/// Result of feeding one byte
#[derive(Debug, PartialEq, Eq)]
pub enum RxEvent {
    /// Byte consumed, frame (or candidate) in progress
    Pending,
    /// Byte ignored: out of range while idle, or part of a skipped frame
    Discarded,
    /// SIZE/SIZECHECK pair did not validate; the byte is the new candidate
    Resync,
    /// Valid frame header but the store had no buffer; frame will be skipped
    NoBuffer,
    /// Frame received but the checksum byte did not match
    ChecksumMismatch,
    /// Frame received and verified
    Complete(Packet),
}

/// Observable receiver phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxPhase {
    /// Waiting for a candidate SIZE
    Idle,
    /// Candidate SIZE held, waiting for its complement
    AwaitingSizeCheck { size: u8 },
    /// Filling a packet buffer
    ReceivingBody { offset: usize },
    /// Consuming the rest of a frame no buffer was available for
    Skipping { remaining: usize },
}

#[derive(Debug)]
enum RxState {
    Idle,
    AwaitingSizeCheck {
        size: u8,
    },
    ReceivingBody {
        packet: Packet,
        offset: usize,
        checksum: u8,
    },
    Skipping {
        remaining: usize,
    },
}

/// Byte-at-a-time frame decoder
#[derive(Debug)]
pub struct Receiver {
    state: RxState,
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Receiver {
    /// Create an idle receiver
    pub const fn new() -> Self {
        Self {
            state: RxState::Idle,
        }
    }

    /// Current phase
    pub fn phase(&self) -> RxPhase {
        match &self.state {
            RxState::Idle => RxPhase::Idle,
            RxState::AwaitingSizeCheck { size } => RxPhase::AwaitingSizeCheck { size: *size },
            RxState::ReceivingBody { offset, .. } => RxPhase::ReceivingBody { offset: *offset },
            RxState::Skipping { remaining } => RxPhase::Skipping {
                remaining: *remaining,
            },
        }
    }

    /// Check if the receiver is between frames
    pub fn is_idle(&self) -> bool {
        matches!(self.state, RxState::Idle)
    }

    /// Abandon any frame in progress
    ///
    /// A partially filled packet goes back to `store`.
    pub fn reset<S: PacketStore + ?Sized>(&mut self, store: &S) {
        if let RxState::ReceivingBody { packet, .. } =
            core::mem::replace(&mut self.state, RxState::Idle)
        {
            store.release(packet);
        }
    }

    /// Feed one received byte
    ///
    /// Packets are requested from `store` when a valid header is seen and
    /// returned to it on checksum failure. A [`RxEvent::Complete`] packet is
    /// owned by the caller.
    pub fn feed<S: PacketStore + ?Sized>(&mut self, byte: u8, store: &S) -> RxEvent {
        match &mut self.state {
            RxState::Idle => {
                if is_size_candidate(byte) {
                    self.state = RxState::AwaitingSizeCheck { size: byte };
                    RxEvent::Pending
                } else {
                    RxEvent::Discarded
                }
            }
            RxState::AwaitingSizeCheck { size } => {
                let size = *size;
                if size ^ byte != 0xFF || !is_valid_size(size) {
                    self.state = RxState::AwaitingSizeCheck { size: byte };
                    return RxEvent::Resync;
                }

                match store.request(data_len(size)) {
                    Some(packet) => {
                        self.state = RxState::ReceivingBody {
                            packet,
                            offset: 0,
                            checksum: size.wrapping_add(byte),
                        };
                        RxEvent::Pending
                    }
                    None => {
                        // Payload plus the checksum byte still to come
                        self.state = RxState::Skipping {
                            remaining: payload_len(size) + 1,
                        };
                        RxEvent::NoBuffer
                    }
                }
            }
            RxState::ReceivingBody {
                packet,
                offset,
                checksum,
            } => {
                if *offset < packet.payload_len() {
                    packet.payload_mut()[*offset] = byte;
                    *offset += 1;
                    *checksum = checksum.wrapping_add(byte);
                    return RxEvent::Pending;
                }
                self.finish_frame(byte, store)
            }
            RxState::Skipping { remaining } => {
                *remaining -= 1;
                if *remaining == 0 {
                    self.state = RxState::Idle;
                }
                RxEvent::Discarded
            }
        }
    }

    fn finish_frame<S: PacketStore + ?Sized>(&mut self, trailer: u8, store: &S) -> RxEvent {
        match core::mem::replace(&mut self.state, RxState::Idle) {
            RxState::ReceivingBody {
                packet, checksum, ..
            } if checksum == trailer => RxEvent::Complete(packet),
            RxState::ReceivingBody { packet, .. } => {
                store.release(packet);
                RxEvent::ChecksumMismatch
            }
            other => {
                self.state = other;
                RxEvent::Pending
            }
        }
    }
}
