//! Error kinds surfaced by the monitor.

use core::fmt;

/// Peripheral a fault came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Acoustic sensor input
    Acoustic,
    /// Temperature sensor input
    Temperature,
    /// Panel voltage divider input
    Panel,
    /// Infrared emitter output
    Emitter,
}

impl Channel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Acoustic => "acoustic",
            Self::Temperature => "temperature",
            Self::Panel => "panel",
            Self::Emitter => "emitter",
        }
    }
}

/// A peripheral read or write failed. Fatal to the current cycle only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelFault {
    pub channel: Channel,
}

impl ChannelFault {
    pub const fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

impl fmt::Display for ChannelFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} channel fault", self.channel.as_str())
    }
}

/// A compiled-in constant breaks a precondition. Checked once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Acoustic window length is zero
    EmptyWindow,
    /// Sample rate is zero
    ZeroSampleRate,
    /// Sample rate above 1 MHz truncates the period to zero
    SampleRateTooHigh,
    /// An averaging reader is asked for zero samples
    ZeroAveragingSamples,
    /// ADC full scale or reference voltage is not a positive finite number
    InvalidAdcScale,
    /// Divider ratio is not a positive finite number
    InvalidDividerRatio,
    /// Temperature slope is zero or not finite
    InvalidTemperatureSlope,
    /// Emitter carrier frequency is zero
    ZeroCarrierFrequency,
    /// Emitter pulse duration is zero
    ZeroPulseDuration,
    /// The emitter was built with a pulse length other than the configured one
    EmitterMismatch,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::EmptyWindow => "acoustic window length must be non-zero",
            Self::ZeroSampleRate => "sample rate must be non-zero",
            Self::SampleRateTooHigh => "sample rate must not exceed 1 MHz",
            Self::ZeroAveragingSamples => "averaging sample count must be non-zero",
            Self::InvalidAdcScale => "ADC full scale and reference voltage must be positive",
            Self::InvalidDividerRatio => "divider ratio must be positive",
            Self::InvalidTemperatureSlope => "temperature slope must be non-zero",
            Self::ZeroCarrierFrequency => "carrier frequency must be non-zero",
            Self::ZeroPulseDuration => "pulse duration must be non-zero",
            Self::EmitterMismatch => "emitter pulse length differs from the configuration",
        };
        f.write_str(msg)
    }
}
