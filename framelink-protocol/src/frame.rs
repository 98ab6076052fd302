//! Frame layout and checksum arithmetic.
//!
//! Frame format:
//! - SIZE (1 byte): total frame length, framing bytes included
//! - SIZECHECK (1 byte): bitwise complement of SIZE
//! - PAYLOAD (SIZE - 3 bytes): STATUS, KIND, then packet data
//! - CHECKSUM (1 byte): wrapping sum of SIZE, SIZECHECK and every PAYLOAD byte

use heapless::Vec;

use crate::packet::Packet;

/// Exclusive upper bound on the SIZE byte
pub const MAX_FRAME_SIZE: usize = 200;

/// Framing bytes added around a payload (SIZE, SIZECHECK, CHECKSUM)
pub const FRAME_OVERHEAD: usize = 3;

/// Payload header bytes preceding packet data (STATUS, KIND)
pub const PAYLOAD_HEADER_LENGTH: usize = 2;

/// Smallest SIZE that can carry a payload header
pub const MIN_FRAME_SIZE: usize = FRAME_OVERHEAD + PAYLOAD_HEADER_LENGTH;

/// Largest payload (header + data) a frame can carry
pub const MAX_PAYLOAD_LENGTH: usize = MAX_FRAME_SIZE - 1 - FRAME_OVERHEAD;

/// Largest packet data length
pub const MAX_DATA_LENGTH: usize = MAX_PAYLOAD_LENGTH - PAYLOAD_HEADER_LENGTH;

/// SIZE byte for a payload of the given length
///
/// Returns `None` if the frame would not fit below [`MAX_FRAME_SIZE`].
pub fn frame_size(payload_len: usize) -> Option<u8> {
    let size = payload_len.checked_add(FRAME_OVERHEAD)?;
    if size < MAX_FRAME_SIZE {
        u8::try_from(size).ok()
    } else {
        None
    }
}

/// SIZECHECK byte that must follow the given SIZE
pub const fn size_check(size: u8) -> u8 {
    !size
}

/// Whether a SIZE byte could open a frame while the receiver is idle
pub fn is_size_candidate(byte: u8) -> bool {
    usize::from(byte) < MAX_FRAME_SIZE
}

/// Whether a SIZE byte describes a frame the receiver will allocate
pub fn is_valid_size(size: u8) -> bool {
    (MIN_FRAME_SIZE..MAX_FRAME_SIZE).contains(&usize::from(size))
}

/// Payload length (header + data) carried by a frame of the given SIZE
pub fn payload_len(size: u8) -> usize {
    usize::from(size).saturating_sub(FRAME_OVERHEAD)
}

/// Data length carried by a frame of the given SIZE
pub fn data_len(size: u8) -> usize {
    payload_len(size).saturating_sub(PAYLOAD_HEADER_LENGTH)
}

/// Wrapping 8-bit sum of a byte sequence
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}

/// Encode a packet into a complete frame in one go
///
/// This produces exactly the byte sequence the [`Transmitter`](crate::Transmitter)
/// emits over the course of a frame. It is meant for hosts and tests that
/// have the whole buffer at hand.
pub fn encode_frame(packet: &Packet) -> Vec<u8, MAX_FRAME_SIZE> {
    let payload = packet.payload();
    let size = (payload.len() + FRAME_OVERHEAD) as u8;
    let header = [size, size_check(size)];
    let trailer = [checksum(&header).wrapping_add(checksum(payload))];

    let mut frame = Vec::new();
    // Packet capacity is bounded by MAX_PAYLOAD_LENGTH, so the frame always fits
    let _ = [&header[..], payload, &trailer[..]]
        .iter()
        .try_for_each(|part| frame.extend_from_slice(part));
    frame
}
