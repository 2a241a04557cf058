#![cfg_attr(not(test), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Application core for a LoRaWAN analog sensor node.
//!
//! This crate contains the orchestration layer of a single-board sensor
//! device: it configures an external LoRaWAN stack, samples one analog input,
//! encodes the reading as a Cayenne LPP analog-input entry and schedules it
//! for uplink, and drains received downlinks to the debug console. The MAC,
//! radio and regulatory logic live entirely behind the [`stack::Stack`]
//! trait; this crate only reacts to the events that stack emits.
//!
//! ## Feature flags
#![doc = document_features::document_features!(feature_label = r#"<span class="stab portability"><code>{feature}</code></span>"#)]

mod fmt;

pub mod lpp;
pub mod node;
pub mod sensor;
pub mod stack;

#[cfg(feature = "embassy-time")]
mod embassy_time;
#[cfg(feature = "embassy-time")]
#[cfg_attr(docsrs, doc(cfg(feature = "embassy-time")))]
pub use embassy_time::EmbassyTimer;

pub use node::{Config, SensorNode};
pub use stack::{ConnectStatus, Event, Stack, Timer};

/// Formats a byte slice as space-separated lowercase hex, for console output
/// of raw payloads.
pub struct Hex<'a>(pub &'a [u8]);

impl core::fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(feature = "defmt-03")]
impl defmt::Format for Hex<'_> {
    fn format(&self, f: defmt::Formatter) {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                defmt::write!(f, " ");
            }
            defmt::write!(f, "{:02x}", byte);
        }
    }
}
