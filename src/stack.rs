//! Trait seam between the node and its external collaborators: the vendor
//! LoRaWAN stack and an asynchronous timer. The node never reaches past these
//! traits; everything protocol-shaped (join handshake, MAC state, duty-cycle
//! accounting, retransmissions) is the stack implementation's concern.

/// Minimum number of stack events an implementation must be able to buffer
/// while the node is busy handling an earlier one.
pub const MAX_PENDING_EVENTS: usize = 10;

/// Connection and traffic events emitted by the LoRaWAN stack.
///
/// This is a closed set: codes the node does not interpret arrive as
/// [`Event::Other`] and are logged raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Event {
    /// The network has been joined; uplinks may now be scheduled.
    Connected,
    /// The session ended. The node stops its event loop on this.
    Disconnected,
    /// The previous uplink completed (for confirmed traffic, the network
    /// acknowledged it).
    TxDone,
    /// A downlink is waiting to be read via [`Stack::receive`].
    RxDone,
    /// An over-the-air activation attempt was rejected or timed out.
    JoinFailure,
    /// Any event code the node does not act on.
    Other(u32),
}

/// Result of initiating a connect. Both variants are non-fatal; the
/// [`Event::Connected`] callback reports the actual join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum ConnectStatus {
    /// The stack considers itself joined already (e.g. ABP activation).
    Connected,
    /// Over-the-air activation has started in the background.
    InProgress,
}

/// Metadata the stack reports alongside a received downlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct RxMetadata {
    /// Application port the message arrived on.
    pub port: u8,
    /// Raw message flags (confirmed/unconfirmed, pending data, ...).
    pub flags: u8,
    /// Number of bytes written into the caller's buffer.
    pub length: usize,
}

/// The vendor LoRaWAN stack, as narrow as the node needs it.
///
/// Configuration calls ([`initialize`](Stack::initialize),
/// [`set_confirmed_msg_retries`](Stack::set_confirmed_msg_retries),
/// [`enable_adaptive_datarate`](Stack::enable_adaptive_datarate)) are made
/// exactly once, before [`connect`](Stack::connect).
#[allow(async_fn_in_trait)]
pub trait Stack {
    #[cfg(feature = "defmt-03")]
    type Error: core::fmt::Debug + defmt::Format;

    #[cfg(not(feature = "defmt-03"))]
    type Error: core::fmt::Debug;

    /// One-time bring-up of the stack and its radio.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Sets how many times the stack retransmits an unacknowledged confirmed
    /// uplink before reporting it done.
    fn set_confirmed_msg_retries(&mut self, retries: u8) -> Result<(), Self::Error>;

    /// Lets the network steer data rate and transmit power.
    fn enable_adaptive_datarate(&mut self) -> Result<(), Self::Error>;

    /// Starts joining the network. Completion is reported through
    /// [`Event::Connected`] or [`Event::JoinFailure`], never by this call.
    fn connect(&mut self) -> Result<ConnectStatus, Self::Error>;

    /// Schedules `data` for uplink on `port` and returns the number of bytes
    /// accepted. Must not wait: if the stack cannot take the message right
    /// now (duty-cycle restriction, previous transfer still in flight), it
    /// returns [`nb::Error::WouldBlock`] immediately.
    fn send(&mut self, port: u8, data: &[u8], confirmed: bool) -> nb::Result<usize, Self::Error>;

    /// Copies one pending downlink into `buf`, reporting port, flags and
    /// length. Invoked only after an [`Event::RxDone`].
    fn receive(&mut self, buf: &mut [u8]) -> Result<RxMetadata, Self::Error>;

    /// Waits for the next stack event.
    ///
    /// The node races this future against timer deadlines and drops the
    /// loser, so implementations must be cancel-safe: an event may not be
    /// lost because the future was dropped before completing. At least
    /// [`MAX_PENDING_EVENTS`] events must be buffered while the node is
    /// inside an earlier callback.
    async fn recv_event(&mut self) -> Event;
}

/// An asynchronous timer that allows the run loop to await scheduling
/// deadlines between stack events.
#[allow(async_fn_in_trait)]
pub trait Timer {
    fn reset(&mut self);

    /// Wait until millis milliseconds after reset has passed
    async fn at(&mut self, millis: u64);

    /// Delay for millis milliseconds
    async fn delay_ms(&mut self, millis: u64);
}
