//! Link configuration
//!
//! Queue depths and the receive callback, fixed at initialization.

use framelink_protocol::Packet;

/// Callback run for every verified inbound packet, before it is queued
///
/// Runs in receive-interrupt context with the link locked; it must not call
/// back into the link.
pub type ReceiveCallback = fn(&Packet);

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A queue length of zero was requested
    EmptyQueue,
    /// Outbound queue length exceeds its compile-time storage
    TxQueueTooLong { requested: usize, max: usize },
    /// Inbound queue length exceeds its compile-time storage
    RxQueueTooLong { requested: usize, max: usize },
}

/// Serial link configuration
#[derive(Debug, Clone, Copy)]
pub struct LinkConfig {
    /// Outbound queue length
    pub tx_queue_len: usize,
    /// Inbound queue length
    pub rx_queue_len: usize,
    /// Receive-completion callback
    pub on_receive: Option<ReceiveCallback>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            tx_queue_len: 4,
            rx_queue_len: 4,
            on_receive: None,
        }
    }
}

impl LinkConfig {
    /// Check queue lengths against the storage reserved for them
    pub fn validate<const TXQ: usize, const RXQ: usize>(&self) -> Result<(), ConfigError> {
        if self.tx_queue_len == 0 || self.rx_queue_len == 0 {
            return Err(ConfigError::EmptyQueue);
        }
        if self.tx_queue_len > TXQ {
            return Err(ConfigError::TxQueueTooLong {
                requested: self.tx_queue_len,
                max: TXQ,
            });
        }
        if self.rx_queue_len > RXQ {
            return Err(ConfigError::RxQueueTooLong {
                requested: self.rx_queue_len,
                max: RXQ,
            });
        }
        Ok(())
    }
}
