//! Link counters
//!
//! Every drop the link makes is silent on the wire, so these counters are
//! the only place they show up.

/// Snapshot of link activity since initialization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Frames whose checksum byte has been written
    pub frames_sent: u32,
    /// Verified inbound frames
    pub frames_received: u32,
    /// Inbound frames dropped on checksum mismatch
    pub checksum_errors: u32,
    /// Bytes that failed a SIZE/SIZECHECK pairing
    pub resync_bytes: u32,
    /// Inbound frames skipped because the packet store was empty
    pub no_buffer_drops: u32,
    /// Verified inbound frames dropped because the inbound queue was full
    pub rx_queue_drops: u32,
    /// Outbound packets the transmitter refused
    pub tx_rejected: u32,
    /// Receiver overruns cleared
    pub overruns: u32,
}
