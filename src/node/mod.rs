//! The event-driven application core: samples the analog input, drives the
//! indicator LED, encodes the measurement as Cayenne LPP and schedules
//! confirmed uplinks through the vendor stack.

use embedded_hal::digital::OutputPin;
use futures::{future::select, future::Either, pin_mut};

use crate::lpp::Payload;
use crate::sensor::{AnalogSource, Measurement};
use crate::stack::{ConnectStatus, Event, Stack, Timer};
use crate::Hex;


/// Interval between periodic uplinks when duty-cycle limits are disabled.
pub const TX_INTERVAL_MS: u32 = 10_000;
/// Delay before a deferred uplink is retried when duty-cycle limits are
/// enabled.
pub const RETRY_DELAY_MS: u32 = 3_000;
/// Retransmissions the stack is asked to perform for an unacknowledged
/// confirmed uplink.
pub const CONFIRMED_MSG_RETRIES: u8 = 3;
/// LPP channel the measurement is reported on.
pub const ANALOG_CHANNEL: u8 = 8;
/// Capacity of the uplink payload buffer.
pub const TX_BUFFER_LEN: usize = 30;
/// Capacity of the downlink receive buffer.
pub const RX_BUFFER_LEN: usize = 30;

/// Application settings fixed at node construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Whether the regional duty cycle applies. With limits on, uplinks are
    /// sent back to back (each acknowledgement triggers the next, deferrals
    /// are retried); with limits off, uplinks follow a fixed
    /// [`TX_INTERVAL_MS`] cadence instead.
    pub duty_cycle: bool,
    /// Application port uplinks are sent on.
    pub app_port: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self { duty_cycle: true, app_port: 15 }
    }
}

/// What the node does in response to a stack event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Action {
    /// Sample and transmit immediately.
    SendNow,
    /// Start the fixed-cadence transmission schedule.
    StartPeriodic,
    /// Fetch the pending downlink from the stack.
    ReadDownlink,
    /// Leave the event loop.
    Stop,
    /// Nothing to do.
    NoUpdate,
}

/// Maps a stack event to the node's response.
///
/// The mapping depends only on the event and the duty-cycle setting:
/// connecting starts traffic (immediately under duty-cycle limits, on a
/// timer otherwise), an acknowledged uplink triggers the next one only under
/// duty-cycle limits, and a disconnect stops the node.
pub fn dispatch(event: Event, duty_cycle: bool) -> Action {
    match event {
        Event::Connected => {
            info!("Connection successful");
            if duty_cycle {
                Action::SendNow
            } else {
                Action::StartPeriodic
            }
        }
        Event::Disconnected => {
            info!("Disconnected from the network");
            Action::Stop
        }
        Event::TxDone => {
            info!("Message sent to the network server");
            if duty_cycle {
                Action::SendNow
            } else {
                Action::NoUpdate
            }
        }
        Event::RxDone => {
            info!("Received message from the network server");
            Action::ReadDownlink
        }
        Event::JoinFailure => {
            warn!("Over-the-air activation failed, check credentials");
            Action::NoUpdate
        }
        Event::Other(code) => {
            debug!("Unhandled stack event: {}", code);
            Action::NoUpdate
        }
    }
}

#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug)]
pub enum Error<E> {
    /// The stack rejected a bootstrap call.
    Stack(E),
}

/// The single timer deadline the run loop may be waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deadline {
    Unarmed,
    /// The `tick`-th periodic transmission, due `tick * TX_INTERVAL_MS`
    /// milliseconds after the connect. Keeping the count rather than a
    /// relative delay keeps the cadence drift-free when events interleave.
    Periodic(u32),
    /// A deferred uplink, due [`RETRY_DELAY_MS`] after the deferral.
    Retry,
}

/// The analog sensor node.
///
/// A node is bound to the following types:
/// - S: the vendor LoRaWAN stack, reduced to the [`Stack`] seam
/// - T: an asynchronous timer implementation
/// - A: the analog input being reported
/// - L: the indicator LED output pin
pub struct SensorNode<S, T, A, L>
where
    S: Stack,
    T: Timer,
    A: AnalogSource,
    L: OutputPin,
{
    stack: S,
    timer: T,
    sensor: A,
    led: L,
    config: Config,
    payload: Payload<TX_BUFFER_LEN>,
    rx_buffer: [u8; RX_BUFFER_LEN],
    deadline: Deadline,
}

impl<S, T, A, L> SensorNode<S, T, A, L>
where
    S: Stack,
    T: Timer,
    A: AnalogSource,
    L: OutputPin,
{
    pub fn new(stack: S, timer: T, sensor: A, led: L, config: Config) -> Self {
        Self {
            stack,
            timer,
            sensor,
            led,
            config,
            payload: Payload::new(),
            rx_buffer: [0; RX_BUFFER_LEN],
            deadline: Deadline::Unarmed,
        }
    }

    pub fn get_stack(&mut self) -> &mut S {
        &mut self.stack
    }

    /// Samples the sensor, updates the LED, encodes the measurement and
    /// offers it to the stack as a confirmed uplink.
    ///
    /// A deferred send (the stack reported it would block) is retried
    /// [`RETRY_DELAY_MS`] later, but only under duty-cycle limits; on the
    /// fixed cadence the next tick covers it. Send errors other than
    /// deferrals are logged and dropped, the schedule carries on.
    fn send_uplink(&mut self) {
        let measurement = Measurement::from_sample(self.sensor.read_sample());
        info!("Measured voltage: {} V", measurement.volts());

        if measurement.over_threshold() {
            self.led.set_high().ok();
        } else {
            self.led.set_low().ok();
        }

        self.payload.clear();
        if let Err(e) = self.payload.add_analog_input(ANALOG_CHANNEL, measurement.volts()) {
            error!("Payload encoding failed: {:?}", e);
            return;
        }
        debug!("Uplink payload: {}", Hex(self.payload.as_bytes()));

        match self.stack.send(self.config.app_port, self.payload.as_bytes(), true) {
            Ok(len) => {
                info!("{} bytes scheduled for transmission", len);
                self.payload.clear();
            }
            Err(nb::Error::WouldBlock) => {
                warn!("Send deferred, transceiver busy or duty-cycle restricted");
                if self.config.duty_cycle {
                    self.timer.reset();
                    self.deadline = Deadline::Retry;
                }
            }
            Err(nb::Error::Other(e)) => {
                error!("Send failed: {:?}", e);
            }
        }
    }

    /// Drains the pending downlink into the receive buffer and logs it. The
    /// buffer is zeroed again once the data has been reported; a failed
    /// receive leaves it untouched.
    fn read_downlink(&mut self) {
        match self.stack.receive(&mut self.rx_buffer) {
            Ok(rx) => {
                let len = rx.length.min(self.rx_buffer.len());
                info!("RX data on port {} ({} bytes): {}", rx.port, len, Hex(&self.rx_buffer[..len]));
                debug!("RX flags: {}", rx.flags);
                self.rx_buffer.fill(0);
            }
            Err(e) => {
                error!("Receive failed: {:?}", e);
            }
        }
    }

    fn handle_event(&mut self, event: Event) -> Action {
        let action = dispatch(event, self.config.duty_cycle);
        match action {
            Action::SendNow => self.send_uplink(),
            Action::StartPeriodic => {
                self.timer.reset();
                self.deadline = Deadline::Periodic(1);
            }
            Action::ReadDownlink => self.read_downlink(),
            Action::Stop | Action::NoUpdate => {}
        }
        action
    }

    /// Brings up the stack and runs the node until the session ends.
    ///
    /// The bootstrap initializes the stack, requests
    /// [`CONFIRMED_MSG_RETRIES`] retransmissions for confirmed uplinks,
    /// enables ADR and starts the join; any rejection aborts with
    /// [`Error::Stack`]. After that the loop waits on stack events, racing
    /// them against the armed timer deadline (periodic tick or deferral
    /// retry) when one exists. Returns `Ok(())` once the stack reports
    /// [`Event::Disconnected`].
    pub async fn run(&mut self) -> Result<(), Error<S::Error>> {
        if let Err(e) = self.stack.initialize() {
            error!("Initialization failed: {:?}", e);
            return Err(Error::Stack(e));
        }
        info!("LoRaWAN stack initialized");

        if let Err(e) = self.stack.set_confirmed_msg_retries(CONFIRMED_MSG_RETRIES) {
            error!("Setting confirmed message retries failed: {:?}", e);
            return Err(Error::Stack(e));
        }
        info!("Confirmed message retries: {}", CONFIRMED_MSG_RETRIES);

        if let Err(e) = self.stack.enable_adaptive_datarate() {
            error!("Enabling adaptive data rate failed: {:?}", e);
            return Err(Error::Stack(e));
        }
        info!("Adaptive data rate enabled");

        match self.stack.connect() {
            Ok(ConnectStatus::InProgress) => info!("Connection in progress"),
            Ok(ConnectStatus::Connected) => info!("Already connected"),
            Err(e) => {
                error!("Connection failed: {:?}", e);
                return Err(Error::Stack(e));
            }
        }

        loop {
            let due = match self.deadline {
                Deadline::Unarmed => None,
                Deadline::Periodic(tick) => Some(u64::from(tick) * u64::from(TX_INTERVAL_MS)),
                Deadline::Retry => Some(u64::from(RETRY_DELAY_MS)),
            };

            let event = {
                let Self { stack, timer, .. } = self;
                let event_fut = stack.recv_event();
                pin_mut!(event_fut);
                match due {
                    None => Some(event_fut.await),
                    Some(millis) => {
                        let timeout_fut = timer.at(millis);
                        pin_mut!(timeout_fut);
                        match select(event_fut, timeout_fut).await {
                            Either::Left((event, _)) => Some(event),
                            Either::Right(_) => None,
                        }
                    }
                }
            };

            match event {
                Some(event) => {
                    if let Action::Stop = self.handle_event(event) {
                        break;
                    }
                }
                None => match core::mem::replace(&mut self.deadline, Deadline::Unarmed) {
                    Deadline::Periodic(tick) => {
                        // Re-arm first so the cadence is independent of the
                        // send outcome.
                        self.deadline = Deadline::Periodic(tick + 1);
                        self.send_uplink();
                    }
                    Deadline::Retry => self.send_uplink(),
                    Deadline::Unarmed => {}
                },
            }
        }
        Ok(())
    }
}
