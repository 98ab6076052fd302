//! Transmit state machine.
//!
//! The transmitter holds at most one packet. [`Transmitter::start`] yields
//! the SIZE byte, which the caller writes to kick off the transmit-ready
//! interrupt chain. Every subsequent interrupt calls
//! [`Transmitter::next_byte`] exactly once until the checksum has gone out.

use crate::frame::{frame_size, size_check};
use crate::packet::{Packet, PacketStore};

/// Why a packet was not accepted for transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxRejectReason {
    /// A frame is already on the wire
    Busy,
    /// Payload does not fit in a frame
    ///
    /// Not reachable through [`Packet`], whose payload is capped at
    /// [`MAX_PAYLOAD_LENGTH`](crate::MAX_PAYLOAD_LENGTH); kept so the size
    /// bound is enforced where the SIZE byte is computed.
    Oversized,
}

/// A rejected submission; the caller keeps the packet
#[derive(Debug, PartialEq, Eq)]
pub struct TxRejected {
    pub packet: Packet,
    pub reason: TxRejectReason,
}

/// Observable transmitter phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxPhase {
    /// Nothing to send
    Idle,
    /// SIZE written, SIZECHECK goes out next
    SendingSize,
    /// Emitting payload bytes, then the checksum
    SendingBody { offset: usize },
}

#[derive(Debug)]
enum TxState {
    Idle,
    SendingSize {
        packet: Packet,
        checksum: u8,
    },
    SendingBody {
        packet: Packet,
        offset: usize,
        checksum: u8,
    },
}

/// Byte-at-a-time frame encoder
#[derive(Debug)]
pub struct Transmitter {
    state: TxState,
}

impl Default for Transmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Transmitter {
    /// Create an idle transmitter
    pub const fn new() -> Self {
        Self {
            state: TxState::Idle,
        }
    }

    /// Current phase
    pub fn phase(&self) -> TxPhase {
        match &self.state {
            TxState::Idle => TxPhase::Idle,
            TxState::SendingSize { .. } => TxPhase::SendingSize,
            TxState::SendingBody { offset, .. } => TxPhase::SendingBody { offset: *offset },
        }
    }

    /// Check if no frame is in flight
    pub fn is_idle(&self) -> bool {
        matches!(self.state, TxState::Idle)
    }

    /// Bytes still to be emitted by [`Transmitter::next_byte`]
    pub fn remaining(&self) -> usize {
        match &self.state {
            TxState::Idle => 0,
            // SIZECHECK + payload + CHECKSUM
            TxState::SendingSize { packet, .. } => packet.payload_len() + 2,
            TxState::SendingBody { packet, offset, .. } => packet.payload_len() - offset + 1,
        }
    }

    /// Take ownership of a packet and begin a frame
    ///
    /// Returns the SIZE byte that must be written to the wire immediately.
    /// On rejection nothing changes and the packet is handed back.
    pub fn start(&mut self, packet: Packet) -> Result<u8, TxRejected> {
        if !self.is_idle() {
            return Err(TxRejected {
                packet,
                reason: TxRejectReason::Busy,
            });
        }

        let Some(size) = frame_size(packet.payload_len()) else {
            return Err(TxRejected {
                packet,
                reason: TxRejectReason::Oversized,
            });
        };

        self.state = TxState::SendingSize {
            packet,
            checksum: size,
        };
        Ok(size)
    }

    /// Produce the next byte of the current frame
    ///
    /// Called once per transmit-ready event. After the checksum byte is
    /// produced the packet goes back to `store` and the transmitter is idle.
    /// Returns `None` when idle.
    pub fn next_byte<S: PacketStore + ?Sized>(&mut self, store: &S) -> Option<u8> {
        match &mut self.state {
            TxState::Idle => None,
            TxState::SendingSize { checksum, .. } => {
                let byte = size_check(*checksum);
                let checksum = checksum.wrapping_add(byte);
                if let TxState::SendingSize { packet, .. } =
                    core::mem::replace(&mut self.state, TxState::Idle)
                {
                    self.state = TxState::SendingBody {
                        packet,
                        offset: 0,
                        checksum,
                    };
                }
                Some(byte)
            }
            TxState::SendingBody {
                packet,
                offset,
                checksum,
            } => {
                if *offset < packet.payload_len() {
                    let byte = packet.payload()[*offset];
                    *offset += 1;
                    *checksum = checksum.wrapping_add(byte);
                    return Some(byte);
                }

                let trailer = *checksum;
                if let TxState::SendingBody { packet, .. } =
                    core::mem::replace(&mut self.state, TxState::Idle)
                {
                    store.release(packet);
                }
                Some(trailer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode_frame;
    use crate::packet::PacketPool;
    use heapless::Vec;

    fn drain<const N: usize>(tx: &mut Transmitter, pool: &PacketPool<N>, first: u8) -> Vec<u8, 256> {
        let mut bytes = Vec::new();
        bytes.push(first).unwrap();
        while let Some(byte) = tx.next_byte(pool) {
            bytes.push(byte).unwrap();
        }
        bytes
    }

    #[test]
    fn test_concrete_frame() {
        let pool: PacketPool<1> = PacketPool::new();
        let mut packet = pool.request(2).unwrap();
        packet.data_mut().copy_from_slice(&[0x41, 0x42]);

        let mut tx = Transmitter::new();
        let first = tx.start(packet).unwrap();
        assert_eq!(first, 0x07);
        assert_eq!(tx.phase(), TxPhase::SendingSize);

        let bytes = drain(&mut tx, &pool, first);
        assert_eq!(&bytes[..], &[0x07, 0xF8, 0x00, 0x00, 0x41, 0x42, 0x82]);
        assert!(tx.is_idle());
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_matches_block_encoder() {
        let pool: PacketPool<1> = PacketPool::new();
        let mut packet = pool.request(5).unwrap();
        packet.set_status(3);
        packet.set_kind(0x44);
        packet.data_mut().copy_from_slice(&[9, 8, 7, 6, 5]);
        let expected = encode_frame(&packet);

        let mut tx = Transmitter::new();
        let first = tx.start(packet).unwrap();
        let bytes = drain(&mut tx, &pool, first);
        assert_eq!(&bytes[..], &expected[..]);
    }

    #[test]
    fn test_busy_rejection_leaves_frame_intact() {
        let pool: PacketPool<2> = PacketPool::new();
        let mut first_packet = pool.request(1).unwrap();
        first_packet.data_mut()[0] = 0x11;
        let expected = encode_frame(&first_packet);

        let mut tx = Transmitter::new();
        let first = tx.start(first_packet).unwrap();
        let mut bytes: Vec<u8, 16> = Vec::new();
        bytes.push(first).unwrap();
        bytes.push(tx.next_byte(&pool).unwrap()).unwrap();
        bytes.push(tx.next_byte(&pool).unwrap()).unwrap();

        let second = pool.request(0).unwrap();
        let rejected = tx.start(second).unwrap_err();
        assert_eq!(rejected.reason, TxRejectReason::Busy);
        pool.release(rejected.packet);

        while let Some(byte) = tx.next_byte(&pool) {
            bytes.push(byte).unwrap();
        }
        assert_eq!(&bytes[..], &expected[..]);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_idle_emits_nothing() {
        let pool: PacketPool<1> = PacketPool::new();
        let mut tx = Transmitter::new();
        assert_eq!(tx.next_byte(&pool), None);
        assert_eq!(tx.remaining(), 0);
    }

    #[test]
    fn test_remaining_counts_down() {
        let pool: PacketPool<1> = PacketPool::new();
        let packet = pool.request(3).unwrap();

        let mut tx = Transmitter::new();
        tx.start(packet).unwrap();
        // SIZECHECK + 5 payload bytes + CHECKSUM
        assert_eq!(tx.remaining(), 7);
        for left in (0..7).rev() {
            tx.next_byte(&pool).unwrap();
            assert_eq!(tx.remaining(), left);
        }
        assert!(tx.is_idle());
    }

    #[test]
    fn test_size_bound_at_start() {
        // One byte past the largest payload would need SIZE == MAX_FRAME_SIZE
        assert_eq!(frame_size(crate::MAX_PAYLOAD_LENGTH + 1), None);

        let pool: PacketPool<1> = PacketPool::new();
        let packet = pool.request(crate::MAX_DATA_LENGTH).unwrap();
        let mut tx = Transmitter::new();
        assert_eq!(tx.start(packet), Ok(199));
        assert_eq!(tx.remaining(), crate::MAX_PAYLOAD_LENGTH + 2);
    }

    #[test]
    fn test_max_payload_offset_boundary() {
        let pool: PacketPool<1> = PacketPool::new();
        let mut packet = pool.request(crate::MAX_DATA_LENGTH).unwrap();
        for (i, byte) in packet.data_mut().iter_mut().enumerate() {
            *byte = i as u8;
        }
        let expected = encode_frame(&packet);

        let mut tx = Transmitter::new();
        let first = tx.start(packet).unwrap();
        assert_eq!(first, 199);
        let bytes = drain(&mut tx, &pool, first);
        assert_eq!(&bytes[..], &expected[..]);
        assert_eq!(pool.available(), 1);
    }
}
