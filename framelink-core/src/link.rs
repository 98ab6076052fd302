//! Serial link driver
//!
//! Ties the transmit and receive state machines to a byte channel and two
//! packet queues. All session state lives in one critical-section mutex so
//! the foreground loop and both interrupt handlers see it consistently.
//!
//! ```text
//!   foreground                      interrupts
//!   ──────────                      ──────────
//!   enqueue_tx ──► [tx queue] ──process──► Transmitter ──on_tx_ready──► wire
//!   dequeue_rx ◄── [rx queue] ◄──callback── Receiver   ◄──on_rx_ready── wire
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use framelink_hal::ByteChannel;
use framelink_protocol::{Packet, PacketStore, Receiver, RxEvent, Transmitter, TxRejected};

use crate::config::{ConfigError, LinkConfig, ReceiveCallback};
use crate::queue::PacketQueue;
use crate::stats::LinkStats;

struct Inner<C, const TXQ: usize, const RXQ: usize> {
    channel: C,
    tx: Transmitter,
    rx: Receiver,
    tx_queue: PacketQueue<TXQ>,
    rx_queue: PacketQueue<RXQ>,
    on_receive: Option<ReceiveCallback>,
    stats: LinkStats,
}

impl<C: ByteChannel, const TXQ: usize, const RXQ: usize> Inner<C, TXQ, RXQ> {
    fn submit(&mut self, packet: Packet) -> Result<(), TxRejected> {
        match self.tx.start(packet) {
            Ok(size) => {
                self.channel.write_byte(size);
                Ok(())
            }
            Err(rejected) => {
                self.stats.tx_rejected = self.stats.tx_rejected.wrapping_add(1);
                Err(rejected)
            }
        }
    }

    fn receive<S: PacketStore + ?Sized>(&mut self, byte: u8, store: &S) {
        match self.rx.feed(byte, store) {
            RxEvent::Pending | RxEvent::Discarded => {}
            RxEvent::Resync => {
                self.stats.resync_bytes = self.stats.resync_bytes.wrapping_add(1);
            }
            RxEvent::NoBuffer => {
                self.stats.no_buffer_drops = self.stats.no_buffer_drops.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::warn!("packet store empty, skipping inbound frame");
            }
            RxEvent::ChecksumMismatch => {
                self.stats.checksum_errors = self.stats.checksum_errors.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::debug!("inbound frame checksum mismatch");
            }
            RxEvent::Complete(packet) => {
                self.stats.frames_received = self.stats.frames_received.wrapping_add(1);
                if let Some(callback) = self.on_receive {
                    callback(&packet);
                }
                if let Err(packet) = self.rx_queue.push_back(packet) {
                    self.stats.rx_queue_drops = self.stats.rx_queue_drops.wrapping_add(1);
                    store.release(packet);
                    #[cfg(feature = "defmt")]
                    defmt::warn!("rx queue full, dropping inbound packet");
                }
            }
        }
    }
}

/// Interrupt-driven framed serial link
///
/// `TXQ` and `RXQ` reserve queue storage; the lengths actually used come
/// from [`LinkConfig`]. The packet store `S` is shared with the application,
/// which requests outbound packets from it and releases dequeued inbound
/// ones back to it.
pub struct SerialLink<C, S, const TXQ: usize, const RXQ: usize> {
    store: S,
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<C, TXQ, RXQ>>>,
}

impl<C, S, const TXQ: usize, const RXQ: usize> SerialLink<C, S, TXQ, RXQ>
where
    C: ByteChannel,
    S: PacketStore,
{
    /// Set up the link and enable both channel interrupts
    pub fn new(mut channel: C, store: S, config: LinkConfig) -> Result<Self, ConfigError> {
        config.validate::<TXQ, RXQ>()?;

        channel.set_tx_interrupt(true);
        channel.set_rx_interrupt(true);

        Ok(Self {
            store,
            inner: Mutex::new(RefCell::new(Inner {
                channel,
                tx: Transmitter::new(),
                rx: Receiver::new(),
                tx_queue: PacketQueue::new(config.tx_queue_len),
                rx_queue: PacketQueue::new(config.rx_queue_len),
                on_receive: config.on_receive,
                stats: LinkStats::default(),
            })),
        })
    }

    /// Packet store shared with the link
    pub fn store(&self) -> &S {
        &self.store
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut Inner<C, TXQ, RXQ>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Queue a packet for transmission
    ///
    /// A full queue hands the packet back; the caller still owns it.
    pub fn enqueue_tx(&self, packet: Packet) -> Result<(), Packet> {
        self.with_inner(|inner| inner.tx_queue.push_back(packet))
    }

    /// Take the oldest received packet
    ///
    /// The caller owns it and releases it to [`SerialLink::store`] when done.
    pub fn dequeue_rx(&self) -> Option<Packet> {
        self.with_inner(|inner| inner.rx_queue.pop_front())
    }

    /// Hand a packet straight to the transmitter, bypassing the queue
    ///
    /// Fails if a frame is already in flight; the packet comes back inside
    /// the error.
    pub fn submit(&self, packet: Packet) -> Result<(), TxRejected> {
        self.with_inner(|inner| inner.submit(packet))
    }

    /// Foreground step: start the next queued packet if the wire is free
    ///
    /// Does at most one submission and never waits. Returns `true` if a
    /// frame was started.
    pub fn process(&self) -> bool {
        self.with_inner(|inner| {
            if !inner.tx.is_idle() {
                return false;
            }
            let Some(packet) = inner.tx_queue.pop_front() else {
                return false;
            };
            match inner.submit(packet) {
                Ok(()) => true,
                Err(rejected) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("dropping unsendable packet: {:?}", rejected.reason);
                    self.store.release(rejected.packet);
                    false
                }
            }
        })
    }

    /// Transmit-ready interrupt entry point
    ///
    /// Writes exactly one byte if a frame is in flight.
    pub fn on_tx_ready(&self) {
        self.with_inner(|inner| {
            if let Some(byte) = inner.tx.next_byte(&self.store) {
                inner.channel.write_byte(byte);
                if inner.tx.is_idle() {
                    inner.stats.frames_sent = inner.stats.frames_sent.wrapping_add(1);
                }
            }
        })
    }

    /// Receive-ready interrupt entry point
    ///
    /// Drains every byte the channel has buffered, then clears a pending
    /// overrun. Bytes lost to the overrun are not recovered.
    pub fn on_rx_ready(&self) {
        self.with_inner(|inner| {
            while inner.channel.byte_available() {
                let byte = inner.channel.read_byte();
                inner.receive(byte, &self.store);
            }

            if inner.channel.overrun() {
                inner.channel.clear_overrun();
                inner.stats.overruns = inner.stats.overruns.wrapping_add(1);
            }
        })
    }

    /// Release every queued packet in both directions
    ///
    /// Frames already on the wire are left to finish.
    pub fn flush_queues(&self) {
        self.with_inner(|inner| {
            while let Some(packet) = inner.tx_queue.pop_front() {
                self.store.release(packet);
            }
            while let Some(packet) = inner.rx_queue.pop_front() {
                self.store.release(packet);
            }
        })
    }

    /// Check if no frame is being transmitted
    pub fn tx_idle(&self) -> bool {
        self.with_inner(|inner| inner.tx.is_idle())
    }

    pub fn tx_queue_empty(&self) -> bool {
        self.with_inner(|inner| inner.tx_queue.is_empty())
    }

    pub fn tx_queue_full(&self) -> bool {
        self.with_inner(|inner| inner.tx_queue.is_full())
    }

    pub fn tx_queue_len(&self) -> usize {
        self.with_inner(|inner| inner.tx_queue.len())
    }

    pub fn rx_queue_empty(&self) -> bool {
        self.with_inner(|inner| inner.rx_queue.is_empty())
    }

    pub fn rx_queue_full(&self) -> bool {
        self.with_inner(|inner| inner.rx_queue.is_full())
    }

    pub fn rx_queue_len(&self) -> usize {
        self.with_inner(|inner| inner.rx_queue.len())
    }

    /// Counter snapshot
    pub fn stats(&self) -> LinkStats {
        self.with_inner(|inner| inner.stats)
    }

    /// Run a closure against the byte channel under the link lock
    pub fn with_channel<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        self.with_inner(|inner| f(&mut inner.channel))
    }
}
