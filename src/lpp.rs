//! Cayenne Low Power Payload (LPP) encoding for the uplink buffer.
//!
//! Only the record type the node emits is implemented. Each analog input
//! record is four bytes on the wire: channel, the type marker `0x02`, and the
//! value as a big-endian `i16` at 0.01 resolution.

/// LPP data type marker for an analog input record.
pub const LPP_ANALOG_INPUT: u8 = 0x02;

const ANALOG_INPUT_SIZE: usize = 4;

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error {
    /// The record does not fit in the remaining buffer space.
    BufferFull,
}

/// A fixed-capacity LPP payload under construction.
///
/// Clearing zeroes the whole backing buffer rather than just truncating, so a
/// reused payload never carries bytes from a previous cycle.
#[derive(Debug)]
pub struct Payload<const N: usize> {
    data: [u8; N],
    len: usize,
}

impl<const N: usize> Payload<N> {
    pub fn new() -> Self {
        Self { data: [0; N], len: 0 }
    }

    /// Zeroes the buffer and resets the length.
    pub fn clear(&mut self) {
        self.data = [0; N];
        self.len = 0;
    }

    /// Appends an analog input record for `channel`. The value is scaled by
    /// 100 and truncated toward zero, so `1.98` encodes as `198`.
    pub fn add_analog_input(&mut self, channel: u8, value: f32) -> Result<&mut Self, Error> {
        if self.len + ANALOG_INPUT_SIZE > N {
            return Err(Error::BufferFull);
        }
        let scaled = (value * 100.0) as i16;
        self.data[self.len] = channel;
        self.data[self.len + 1] = LPP_ANALOG_INPUT;
        self.data[self.len + 2..self.len + 4].copy_from_slice(&scaled.to_be_bytes());
        self.len += ANALOG_INPUT_SIZE;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The encoded records written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    #[cfg(test)]
    pub(crate) fn storage(&self) -> &[u8; N] {
        &self.data
    }
}

impl<const N: usize> Default for Payload<N> {
    fn default() -> Self {
        Self::new()
    }
}
