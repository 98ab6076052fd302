//! SerialLink driven end to end through an in-memory byte channel

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use framelink_core::{ConfigError, LinkConfig, SerialLink};
use framelink_hal::{ByteRx, ByteTx};
use framelink_protocol::{encode_frame, Packet, PacketPool, PacketStore, TxRejectReason};

/// Byte channel backed by two in-memory buffers
#[derive(Default)]
struct MockChannel {
    incoming: VecDeque<u8>,
    written: Vec<u8>,
    overrun: bool,
    tx_irq: bool,
    rx_irq: bool,
}

impl ByteTx for MockChannel {
    fn write_byte(&mut self, byte: u8) {
        self.written.push(byte);
    }

    fn set_tx_interrupt(&mut self, enabled: bool) {
        self.tx_irq = enabled;
    }
}

impl ByteRx for MockChannel {
    fn byte_available(&self) -> bool {
        !self.incoming.is_empty()
    }

    fn read_byte(&mut self) -> u8 {
        self.incoming.pop_front().unwrap_or(0)
    }

    fn overrun(&self) -> bool {
        self.overrun
    }

    fn clear_overrun(&mut self) {
        self.overrun = false;
    }

    fn set_rx_interrupt(&mut self, enabled: bool) {
        self.rx_irq = enabled;
    }
}

type TestLink<'a> = SerialLink<MockChannel, &'a PacketPool<8>, 4, 4>;

fn link_with(pool: &PacketPool<8>, config: LinkConfig) -> TestLink<'_> {
    SerialLink::new(MockChannel::default(), pool, config).unwrap()
}

fn packet(pool: &PacketPool<8>, kind: u8, data: &[u8]) -> Packet {
    let mut packet = pool.request(data.len()).unwrap();
    packet.set_kind(kind);
    packet.data_mut().copy_from_slice(data);
    packet
}

/// Fire transmit-ready interrupts until the frame in flight is done
fn pump_tx(link: &TestLink<'_>) -> Vec<u8> {
    while !link.tx_idle() {
        link.on_tx_ready();
    }
    link.with_channel(|ch| std::mem::take(&mut ch.written))
}

fn inject(link: &TestLink<'_>, bytes: &[u8]) {
    link.with_channel(|ch| ch.incoming.extend(bytes.iter().copied()));
    link.on_rx_ready();
}

#[test]
fn test_init_enables_interrupts() {
    let pool = PacketPool::new();
    let link = link_with(&pool, LinkConfig::default());
    assert!(link.with_channel(|ch| ch.tx_irq && ch.rx_irq));
}

#[test]
fn test_init_rejects_bad_queue_lengths() {
    let pool: PacketPool<8> = PacketPool::new();
    let config = LinkConfig {
        tx_queue_len: 5,
        ..LinkConfig::default()
    };
    let result: Result<TestLink<'_>, _> = SerialLink::new(MockChannel::default(), &pool, config);
    assert_eq!(
        result.err(),
        Some(ConfigError::TxQueueTooLong {
            requested: 5,
            max: 4
        })
    );
}

static ROUND_TRIP_CALLS: AtomicUsize = AtomicUsize::new(0);

fn count_round_trip(_packet: &Packet) {
    ROUND_TRIP_CALLS.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn test_round_trip_between_links() {
    let tx_pool = PacketPool::new();
    let rx_pool = PacketPool::new();
    let sender = link_with(&tx_pool, LinkConfig::default());
    let receiver = link_with(
        &rx_pool,
        LinkConfig {
            on_receive: Some(count_round_trip),
            ..LinkConfig::default()
        },
    );

    sender
        .enqueue_tx(packet(&tx_pool, 0x10, b"hello"))
        .unwrap();
    assert!(sender.process());
    let wire = pump_tx(&sender);
    assert_eq!(wire.len(), 3 + 2 + 5);
    assert_eq!(tx_pool.available(), 8);
    assert_eq!(sender.stats().frames_sent, 1);

    inject(&receiver, &wire);
    assert_eq!(ROUND_TRIP_CALLS.load(Ordering::SeqCst), 1);

    let received = receiver.dequeue_rx().unwrap();
    assert_eq!(received.kind(), 0x10);
    assert_eq!(received.data(), b"hello");
    assert_eq!(receiver.stats().frames_received, 1);

    receiver.store().release(received);
    assert_eq!(rx_pool.available(), 8);
}

#[test]
fn test_outbound_fifo_one_frame_per_process() {
    let pool = PacketPool::new();
    let link = link_with(&pool, LinkConfig::default());
    for kind in 1..=3 {
        link.enqueue_tx(packet(&pool, kind, &[kind])).unwrap();
    }

    let mut kinds = Vec::new();
    while !link.tx_queue_empty() {
        assert!(link.process());
        // Wire is busy until the frame drains
        assert!(!link.process());
        let wire = pump_tx(&link);
        kinds.push(wire[3]);
    }
    assert_eq!(kinds, vec![1, 2, 3]);
    assert!(!link.process());
    assert_eq!(pool.available(), 8);
}

#[test]
fn test_busy_channel_rejects_submission() {
    let pool = PacketPool::new();
    let link = link_with(&pool, LinkConfig::default());
    let first = packet(&pool, 1, b"abc");
    let expected = encode_frame(&first);

    link.submit(first).unwrap();
    link.on_tx_ready();

    let rejected = link.submit(packet(&pool, 2, b"x")).unwrap_err();
    assert_eq!(rejected.reason, TxRejectReason::Busy);
    pool.release(rejected.packet);

    let wire = pump_tx(&link);
    assert_eq!(&wire[..], &expected[..]);
    assert_eq!(link.stats().tx_rejected, 1);
    assert_eq!(pool.available(), 8);
}

#[test]
fn test_spurious_tx_interrupt_writes_nothing() {
    let pool = PacketPool::new();
    let link = link_with(&pool, LinkConfig::default());
    link.on_tx_ready();
    assert!(link.with_channel(|ch| ch.written.is_empty()));
}

#[test]
fn test_tx_queue_backpressure() {
    let pool = PacketPool::new();
    let link = link_with(
        &pool,
        LinkConfig {
            tx_queue_len: 2,
            ..LinkConfig::default()
        },
    );

    link.enqueue_tx(packet(&pool, 1, &[])).unwrap();
    link.enqueue_tx(packet(&pool, 2, &[])).unwrap();
    assert!(link.tx_queue_full());

    let bounced = link.enqueue_tx(packet(&pool, 3, &[])).unwrap_err();
    assert_eq!(bounced.kind(), 3);
    assert_eq!(link.tx_queue_len(), 2);
    pool.release(bounced);

    link.flush_queues();
    assert!(link.tx_queue_empty());
    assert_eq!(pool.available(), 8);
}

#[test]
fn test_full_rx_queue_releases_packet() {
    let pool = PacketPool::new();
    let link = link_with(
        &pool,
        LinkConfig {
            rx_queue_len: 1,
            ..LinkConfig::default()
        },
    );

    let scratch = PacketPool::<8>::new();
    let a = encode_frame(&packet(&scratch, 1, b"a"));
    let b = encode_frame(&packet(&scratch, 2, b"b"));
    inject(&link, &a);
    inject(&link, &b);

    assert!(link.rx_queue_full());
    assert_eq!(link.rx_queue_len(), 1);
    assert_eq!(link.stats().frames_received, 2);
    assert_eq!(link.stats().rx_queue_drops, 1);
    // One packet queued, the dropped one went back to the pool
    assert_eq!(pool.available(), 7);

    let first = link.dequeue_rx().unwrap();
    assert_eq!(first.kind(), 1);
    pool.release(first);
    assert!(link.rx_queue_empty());
}

static RESYNC_CALLS: AtomicUsize = AtomicUsize::new(0);

fn count_resync(_packet: &Packet) {
    RESYNC_CALLS.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn test_garbage_prefix_yields_single_packet() {
    let pool = PacketPool::new();
    let link = link_with(
        &pool,
        LinkConfig {
            on_receive: Some(count_resync),
            ..LinkConfig::default()
        },
    );

    let scratch = PacketPool::<8>::new();
    let frame = encode_frame(&packet(&scratch, 9, &[0x41, 0x42]));
    let mut stream = vec![0x33, 0xC9, 0x12];
    stream.extend_from_slice(&frame);
    inject(&link, &stream);

    assert_eq!(RESYNC_CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(link.rx_queue_len(), 1);
    assert!(link.stats().resync_bytes >= 1);
}

static ORDER: Mutex<Vec<u8>> = Mutex::new(Vec::new());

fn record_order(packet: &Packet) {
    ORDER.lock().unwrap().push(packet.kind());
}

#[test]
fn test_inbound_order_preserved() {
    let pool = PacketPool::new();
    let link = link_with(
        &pool,
        LinkConfig {
            on_receive: Some(record_order),
            ..LinkConfig::default()
        },
    );

    let scratch = PacketPool::<8>::new();
    let mut stream = Vec::new();
    for kind in 1..=3 {
        stream.extend_from_slice(&encode_frame(&packet(&scratch, kind, &[kind; 3])));
    }
    inject(&link, &stream);

    assert_eq!(*ORDER.lock().unwrap(), vec![1, 2, 3]);
    let dequeued: Vec<u8> = std::iter::from_fn(|| link.dequeue_rx())
        .map(|p| {
            let kind = p.kind();
            pool.release(p);
            kind
        })
        .collect();
    assert_eq!(dequeued, vec![1, 2, 3]);
    assert_eq!(pool.available(), 8);
}

#[test]
fn test_corrupted_frame_counted_and_released() {
    let pool = PacketPool::new();
    let link = link_with(&pool, LinkConfig::default());

    let scratch = PacketPool::<8>::new();
    let mut frame = encode_frame(&packet(&scratch, 1, b"data"));
    let last = frame.len() - 1;
    frame[last] ^= 0x80;
    inject(&link, &frame);

    assert!(link.rx_queue_empty());
    assert_eq!(link.stats().checksum_errors, 1);
    assert_eq!(pool.available(), 8);
}

#[test]
fn test_exhausted_store_drops_frame() {
    let pool = PacketPool::new();
    let link = link_with(&pool, LinkConfig::default());
    let held: Vec<Packet> = (0..8).map(|_| pool.request(0).unwrap()).collect();

    let scratch = PacketPool::<8>::new();
    let frame = encode_frame(&packet(&scratch, 1, b"lost"));
    inject(&link, &frame);
    assert_eq!(link.stats().no_buffer_drops, 1);
    assert!(link.rx_queue_empty());

    for packet in held {
        pool.release(packet);
    }

    // Receiver is back in step for the next frame
    inject(&link, &frame);
    assert_eq!(link.rx_queue_len(), 1);
}

#[test]
fn test_overrun_cleared_and_counted() {
    let pool = PacketPool::new();
    let link = link_with(&pool, LinkConfig::default());
    link.with_channel(|ch| ch.overrun = true);
    link.on_rx_ready();

    assert!(!link.with_channel(|ch| ch.overrun));
    assert_eq!(link.stats().overruns, 1);
}

#[test]
fn test_flush_leaves_frame_in_flight() {
    let pool = PacketPool::new();
    let link = link_with(&pool, LinkConfig::default());
    let first = packet(&pool, 1, b"keep");
    let expected = encode_frame(&first);
    link.enqueue_tx(first).unwrap();
    link.enqueue_tx(packet(&pool, 2, b"drop")).unwrap();
    assert!(link.process());

    let scratch = PacketPool::<8>::new();
    inject(&link, &encode_frame(&packet(&scratch, 3, b"in")));
    assert_eq!(pool.available(), 5);

    link.flush_queues();
    assert!(link.tx_queue_empty());
    assert!(link.rx_queue_empty());
    assert_eq!(pool.available(), 7);

    assert_eq!(pump_tx(&link), expected.to_vec());
    assert_eq!(pool.available(), 8);
}
