//! framelink echo firmware
//!
//! Runs a framed serial link on UART0 (GPIO0 TX, GPIO1 RX) and sends every
//! verified inbound packet straight back. The UART interrupt drives both
//! framing state machines; the main task feeds and drains the queues.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::uart::Uart;
use embassy_sync::once_lock::OnceLock;
use embassy_time::{Duration, Ticker};
use portable_atomic::{AtomicU32, Ordering};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use framelink_core::{LinkConfig, SerialLink};
use framelink_hal::LineConfig;
use framelink_hal_rp2040::{gpio_to_uart, uart_config, Pl011Channel, UartId};
use framelink_protocol::{Packet, PacketPool, PacketStore};

/// Settings validated from link.toml by build.rs
mod config {
    include!(concat!(env!("OUT_DIR"), "/link_config.rs"));
}

use config::{BAUDRATE, POOL_SIZE, PROCESS_INTERVAL_US, RX_QUEUE_LEN, TX_QUEUE_LEN};

type Pool = PacketPool<POOL_SIZE>;
type Link = SerialLink<Pl011Channel, &'static Pool, TX_QUEUE_LEN, RX_QUEUE_LEN>;

/// GPIO pins wired to UART0
const TX_PIN: u8 = 0;
const RX_PIN: u8 = 1;

/// Interval between statistics reports
const STATS_INTERVAL_MS: u64 = 5000;

static POOL: StaticCell<Pool> = StaticCell::new();

/// Shared with the UART interrupt handler
static LINK: OnceLock<Link> = OnceLock::new();

/// Packets seen by the receive callback
static RECEIVED: AtomicU32 = AtomicU32::new(0);

/// Receive callback, runs in interrupt context
fn on_packet(_packet: &Packet) {
    RECEIVED.fetch_add(1, Ordering::Relaxed);
}

#[interrupt]
fn UART0_IRQ() {
    let Some(link) = LINK.try_get() else {
        return;
    };

    let irq = link.with_channel(|channel| channel.take_irq());
    if irq.rx_ready {
        link.on_rx_ready();
    }
    if irq.tx_ready {
        link.on_tx_ready();
    }
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("framelink echo firmware starting...");

    let p = embassy_rp::init(Default::default());

    // Pins and line settings via embassy-rp; the link takes over the registers
    debug_assert_eq!(gpio_to_uart(TX_PIN), Some(UartId::Uart0));
    debug_assert_eq!(gpio_to_uart(RX_PIN), Some(UartId::Uart0));
    let line = LineConfig {
        baudrate: BAUDRATE,
        ..LineConfig::default()
    };
    let _uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config(&line));

    let pool: &'static Pool = POOL.init(PacketPool::new());
    let link_config = LinkConfig {
        tx_queue_len: TX_QUEUE_LEN,
        rx_queue_len: RX_QUEUE_LEN,
        on_receive: Some(on_packet),
    };

    let link = match SerialLink::new(Pl011Channel::new(UartId::Uart0), pool, link_config) {
        Ok(link) => link,
        Err(e) => {
            error!("Invalid link configuration: {:?}", e);
            return;
        }
    };
    let link: &'static Link = LINK.get_or_init(|| link);

    interrupt::UART0_IRQ.set_priority(Priority::P1);
    // SAFETY: LINK is initialized, so the handler has a link to drive
    unsafe { interrupt::UART0_IRQ.enable() };

    info!(
        "Link up: {} baud, tx queue {}, rx queue {}, {} buffers",
        BAUDRATE, TX_QUEUE_LEN, RX_QUEUE_LEN, POOL_SIZE
    );

    spawner.spawn(stats_task(link)).unwrap();

    echo_loop(link).await
}

/// Foreground loop: bounce inbound packets back out and keep the
/// transmitter fed
async fn echo_loop(link: &'static Link) -> ! {
    let mut ticker = Ticker::every(Duration::from_micros(PROCESS_INTERVAL_US));

    loop {
        while let Some(packet) = link.dequeue_rx() {
            trace!("RX: kind {} len {}", packet.kind(), packet.data_len());
            if let Err(packet) = link.enqueue_tx(packet) {
                warn!("TX queue full, dropping echo");
                link.store().release(packet);
            }
        }

        link.process();
        ticker.next().await;
    }
}

/// Periodic link statistics report
#[embassy_executor::task]
async fn stats_task(link: &'static Link) {
    let mut ticker = Ticker::every(Duration::from_millis(STATS_INTERVAL_MS));

    loop {
        ticker.next().await;
        info!(
            "Link stats: {:?}, callbacks {}, free buffers {}",
            link.stats(),
            RECEIVED.load(Ordering::Relaxed),
            link.store().available()
        );
    }
}
