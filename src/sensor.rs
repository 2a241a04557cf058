//! Analog input sampling and the voltage interpretation applied to it.

/// Reference voltage of the ADC. A normalized full-scale sample maps to this
/// many volts.
pub const FULL_SCALE_VOLTS: f32 = 3.3;

/// Voltage above which the indicator LED is driven high.
pub const LED_THRESHOLD_VOLTS: f32 = 0.5;

/// A source of normalized analog samples in `0.0..=1.0`, where `1.0` is the
/// ADC reference voltage.
pub trait AnalogSource {
    fn read_sample(&mut self) -> f32;
}

/// A single voltage measurement derived from an analog sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Measurement {
    volts: f32,
}

impl Measurement {
    /// Scales a normalized sample to volts.
    pub fn from_sample(sample: f32) -> Self {
        Self { volts: sample * FULL_SCALE_VOLTS }
    }

    pub fn from_volts(volts: f32) -> Self {
        Self { volts }
    }

    pub fn volts(&self) -> f32 {
        self.volts
    }

    /// Whether the measurement should light the indicator LED. The threshold
    /// itself does not: only strictly greater readings count.
    pub fn over_threshold(&self) -> bool {
        self.volts > LED_THRESHOLD_VOLTS
    }
}
