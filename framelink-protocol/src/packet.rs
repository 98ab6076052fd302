//! Packets and the fixed-capacity packet store.
//!
//! A [`Packet`] is a plain owned value that is not `Clone`. Handing it to a
//! queue, the transmitter or back to the store moves it, so a packet can
//! only ever have one owner and can only be released once.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;

use crate::frame::{MAX_DATA_LENGTH, MAX_PAYLOAD_LENGTH, PAYLOAD_HEADER_LENGTH};

/// Errors raised when filling a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Data does not fit in a single frame
    DataTooLong,
}

/// One framed unit of data
///
/// The payload is a two-byte header (status, kind) followed by data.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Packet {
    payload: Vec<u8, MAX_PAYLOAD_LENGTH>,
}

impl Packet {
    /// Build a zeroed packet with room for `data_len` data bytes
    ///
    /// Intended for [`PacketStore`] implementations. Application code gets
    /// packets from a store so that buffer accounting stays balanced.
    pub fn zeroed(data_len: usize) -> Option<Self> {
        let mut packet = Self {
            payload: Vec::new(),
        };
        packet.reset(data_len).ok()?;
        Some(packet)
    }

    /// Clear the header and resize the data to `data_len` zero bytes
    pub fn reset(&mut self, data_len: usize) -> Result<(), PacketError> {
        if data_len > MAX_DATA_LENGTH {
            return Err(PacketError::DataTooLong);
        }
        self.payload.clear();
        self.payload
            .resize(PAYLOAD_HEADER_LENGTH + data_len, 0)
            .map_err(|_| PacketError::DataTooLong)
    }

    /// Status byte
    pub fn status(&self) -> u8 {
        self.payload[0]
    }

    /// Set the status byte
    pub fn set_status(&mut self, status: u8) {
        self.payload[0] = status;
    }

    /// Kind (message type) byte
    pub fn kind(&self) -> u8 {
        self.payload[1]
    }

    /// Set the kind byte
    pub fn set_kind(&mut self, kind: u8) {
        self.payload[1] = kind;
    }

    /// Packet data, without the header
    pub fn data(&self) -> &[u8] {
        &self.payload[PAYLOAD_HEADER_LENGTH..]
    }

    /// Mutable packet data, without the header
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.payload[PAYLOAD_HEADER_LENGTH..]
    }

    /// Replace the data, resizing as needed
    pub fn set_data(&mut self, data: &[u8]) -> Result<(), PacketError> {
        if data.len() > MAX_DATA_LENGTH {
            return Err(PacketError::DataTooLong);
        }
        self.payload.truncate(PAYLOAD_HEADER_LENGTH);
        self.payload
            .extend_from_slice(data)
            .map_err(|_| PacketError::DataTooLong)
    }

    /// Number of data bytes
    pub fn data_len(&self) -> usize {
        self.payload.len() - PAYLOAD_HEADER_LENGTH
    }

    /// Full payload as it appears on the wire (header + data)
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length (header + data)
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    pub(crate) fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.payload
    }
}

/// Source and sink of packet buffers
///
/// Both methods take `&self` because the store is shared between the
/// foreground loop and interrupt handlers; implementations synchronize
/// internally.
pub trait PacketStore {
    /// Take a packet with room for `data_len` data bytes
    ///
    /// Returns `None` when the store is exhausted or `data_len` is too large.
    fn request(&self, data_len: usize) -> Option<Packet>;

    /// Give a packet back to the store
    fn release(&self, packet: Packet);
}

impl<T: PacketStore + ?Sized> PacketStore for &T {
    fn request(&self, data_len: usize) -> Option<Packet> {
        (**self).request(data_len)
    }

    fn release(&self, packet: Packet) {
        (**self).release(packet)
    }
}

/// Fixed-capacity packet store holding up to `N` buffers
///
/// All buffers are allocated up front. The free list sits behind a
/// critical-section mutex so it can be used from interrupt handlers.
pub struct PacketPool<const N: usize> {
    free: Mutex<CriticalSectionRawMutex, RefCell<Vec<Packet, N>>>,
}

impl<const N: usize> Default for PacketPool<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PacketPool<N> {
    /// Create a pool with all `N` buffers free
    pub fn new() -> Self {
        let mut free = Vec::new();
        for _ in 0..N {
            if let Some(packet) = Packet::zeroed(0) {
                let _ = free.push(packet);
            }
        }
        Self {
            free: Mutex::new(RefCell::new(free)),
        }
    }

    /// Total number of buffers
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of buffers currently free
    pub fn available(&self) -> usize {
        self.free.lock(|free| free.borrow().len())
    }
}

impl<const N: usize> PacketStore for PacketPool<N> {
    fn request(&self, data_len: usize) -> Option<Packet> {
        if data_len > MAX_DATA_LENGTH {
            return None;
        }
        let mut packet = self.free.lock(|free| free.borrow_mut().pop())?;
        // Cannot fail, data_len was checked above
        let _ = packet.reset(data_len);
        Some(packet)
    }

    fn release(&self, packet: Packet) {
        self.free.lock(|free| {
            // A full free list means the packet was never ours; drop it
            let _ = free.borrow_mut().push(packet);
        });
    }
}
