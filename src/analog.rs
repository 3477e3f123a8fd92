//! Analog input channels.

/// Largest value any channel reports. Readings are normalised to 16 bits
/// whatever the converter's native resolution.
pub const FULL_SCALE: u16 = u16::MAX;

/// One analog input, read on demand.
pub trait AnalogInput {
    /// Error returned by the underlying converter.
    type Error: core::fmt::Debug;

    /// Take one instantaneous reading in `0..=FULL_SCALE`.
    fn read_u16(&mut self) -> Result<u16, Self::Error>;
}

impl<T: AnalogInput + ?Sized> AnalogInput for &mut T {
    type Error = T::Error;

    fn read_u16(&mut self) -> Result<u16, Self::Error> {
        T::read_u16(self)
    }
}

/// Widen a 12-bit conversion result to [`FULL_SCALE`] by bit replication,
/// so `0x000` maps to `0` and `0xFFF` maps to `0xFFFF`.
#[inline]
pub const fn widen_12bit(raw: u16) -> u16 {
    let raw = raw & 0x0FFF;
    (raw << 4) | (raw >> 8)
}
