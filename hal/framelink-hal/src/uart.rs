//! UART byte channel abstractions
//!
//! The framing core never blocks on the wire. It writes exactly one byte per
//! transmit-ready interrupt and drains whatever the receiver has buffered per
//! receive-ready interrupt, so the traits here are single-byte and
//! infallible.

/// Transmit half of a byte channel
pub trait ByteTx {
    /// Write one byte to the transmit register
    ///
    /// Only called when the channel can accept a byte, i.e. from the
    /// transmit-ready interrupt or right after enabling it.
    fn write_byte(&mut self, byte: u8);

    /// Enable or disable the transmit-ready interrupt
    fn set_tx_interrupt(&mut self, enabled: bool);
}

/// Receive half of a byte channel
pub trait ByteRx {
    /// Check whether a received byte is waiting
    fn byte_available(&self) -> bool;

    /// Read the next received byte
    ///
    /// Only meaningful after [`ByteRx::byte_available`] returned `true`.
    fn read_byte(&mut self) -> u8;

    /// Check the receiver overrun flag
    fn overrun(&self) -> bool;

    /// Clear the receiver overrun flag
    fn clear_overrun(&mut self);

    /// Enable or disable the receive-ready interrupt
    fn set_rx_interrupt(&mut self, enabled: bool);
}

/// Combined full-duplex byte channel
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait ByteChannel: ByteTx + ByteRx {}

// Blanket implementation
impl<T: ByteTx + ByteRx> ByteChannel for T {}

/// UART line configuration
///
/// Used by chip HALs when bringing the peripheral up. The framing core
/// itself is independent of line settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            baudrate: 230_400,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}
