//! Bounded packet FIFO
//!
//! Storage is a `heapless::Deque` sized at compile time; the usable capacity
//! is chosen at link initialization and may be smaller.
//!
//! Discipline: producers add at the tail with [`PacketQueue::push_back`],
//! consumers take from the head with [`PacketQueue::pop_front`]. The link
//! uses this for both directions and for flushing.

use heapless::Deque;

use framelink_protocol::Packet;

/// Fixed-capacity queue of packets
#[derive(Debug)]
pub struct PacketQueue<const N: usize> {
    packets: Deque<Packet, N>,
    capacity: usize,
}

impl<const N: usize> PacketQueue<N> {
    /// Create a queue holding at most `capacity` packets
    ///
    /// `capacity` is clamped to `N`.
    pub fn new(capacity: usize) -> Self {
        Self {
            packets: Deque::new(),
            capacity: capacity.min(N),
        }
    }

    /// Add a packet at the tail
    ///
    /// A full queue hands the packet back so the caller can release it.
    pub fn push_back(&mut self, packet: Packet) -> Result<(), Packet> {
        if self.is_full() {
            return Err(packet);
        }
        self.packets.push_back(packet)
    }

    /// Remove the packet at the head (oldest)
    pub fn pop_front(&mut self) -> Option<Packet> {
        self.packets.pop_front()
    }

    /// Remove the packet at the tail (newest)
    pub fn pop_back(&mut self) -> Option<Packet> {
        self.packets.pop_back()
    }

    /// Check if the queue holds no packets
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Check if the queue is at its configured capacity
    pub fn is_full(&self) -> bool {
        self.packets.len() >= self.capacity
    }

    /// Number of queued packets
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
