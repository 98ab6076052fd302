//! PL011 byte channel
//!
//! RP2040 has two UART peripherals (UART0 and UART1) sharing one interrupt
//! line each for receive and transmit. With the FIFOs disabled the PL011
//! raises its receive interrupt per character and its transmit interrupt
//! whenever the holding register empties, which is exactly the one byte per
//! event the framing state machines expect.

use embassy_rp::pac;
use embassy_rp::uart::{self as rp_uart, Config as UartConfig};
use framelink_hal::uart::{Parity, StopBits};
use framelink_hal::{ByteRx, ByteTx, LineConfig};

/// UART peripheral identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartId {
    Uart0,
    Uart1,
}

impl UartId {
    fn regs(self) -> pac::uart::Uart {
        match self {
            UartId::Uart0 => pac::UART0,
            UartId::Uart1 => pac::UART1,
        }
    }
}

/// Determine which UART can use a given GPIO pin
///
/// RP2040 has specific pin mappings for each UART.
pub fn gpio_to_uart(gpio: u8) -> Option<UartId> {
    // UART0: GPIO 0/1, 12/13, 16/17, 28/29
    // UART1: GPIO 4/5, 8/9, 20/21, 24/25
    match gpio {
        0 | 1 | 12 | 13 | 16 | 17 | 28 | 29 => Some(UartId::Uart0),
        4 | 5 | 8 | 9 | 20 | 21 | 24 | 25 => Some(UartId::Uart1),
        _ => None,
    }
}

/// Translate line settings into an `embassy-rp` UART configuration
pub fn uart_config(line: &LineConfig) -> UartConfig {
    let mut config = UartConfig::default();
    config.baudrate = line.baudrate;
    config.parity = match line.parity {
        Parity::None => rp_uart::Parity::ParityNone,
        Parity::Even => rp_uart::Parity::ParityEven,
        Parity::Odd => rp_uart::Parity::ParityOdd,
    };
    config.stop_bits = match line.stop_bits {
        StopBits::One => rp_uart::StopBits::STOP1,
        StopBits::Two => rp_uart::StopBits::STOP2,
    };
    config
}

/// Pending interrupt causes, read from the masked status register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartIrq {
    /// Transmit holding register empty
    pub tx_ready: bool,
    /// Received character waiting
    pub rx_ready: bool,
}

/// Interrupt-driven byte channel over a PL011 UART
pub struct Pl011Channel {
    id: UartId,
    regs: pac::uart::Uart,
}

impl Pl011Channel {
    /// Take over an already configured UART
    ///
    /// Disables the FIFOs so that every character raises its own interrupt.
    /// Interrupts stay masked until the link enables them.
    pub fn new(id: UartId) -> Self {
        let regs = id.regs();
        regs.uartimsc().write(|w| {
            w.set_txim(false);
            w.set_rxim(false);
            w.set_rtim(false);
        });
        regs.uartlcr_h().modify(|w| w.set_fen(false));
        Self { id, regs }
    }

    /// Peripheral this channel drives
    pub fn id(&self) -> UartId {
        self.id
    }

    /// Read and acknowledge pending interrupt causes
    ///
    /// Call at the top of the UART interrupt handler, then dispatch to the
    /// link's receive and transmit entry points.
    pub fn take_irq(&mut self) -> UartIrq {
        let mis = self.regs.uartmis().read();
        let irq = UartIrq {
            tx_ready: mis.txmis(),
            rx_ready: mis.rxmis() || mis.rtmis(),
        };
        self.regs.uarticr().write(|w| {
            w.set_txic(irq.tx_ready);
            w.set_rtic(mis.rtmis());
        });
        irq
    }
}

impl ByteTx for Pl011Channel {
    fn write_byte(&mut self, byte: u8) {
        self.regs.uartdr().write(|w| w.set_data(byte));
    }

    fn set_tx_interrupt(&mut self, enabled: bool) {
        self.regs.uartimsc().modify(|w| w.set_txim(enabled));
    }
}

impl ByteRx for Pl011Channel {
    fn byte_available(&self) -> bool {
        !self.regs.uartfr().read().rxfe()
    }

    fn read_byte(&mut self) -> u8 {
        // Reading the data register also clears the receive interrupt
        self.regs.uartdr().read().data()
    }

    fn overrun(&self) -> bool {
        self.regs.uartrsr().read().oe()
    }

    fn clear_overrun(&mut self) {
        // Any write to the status register clears all error flags
        self.regs.uartrsr().write(|w| w.set_oe(false));
    }

    fn set_rx_interrupt(&mut self, enabled: bool) {
        self.regs.uartimsc().modify(|w| {
            w.set_rxim(enabled);
            w.set_rtim(enabled);
        });
    }
}
