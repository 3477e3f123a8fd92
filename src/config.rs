//! Compiled-in configuration.
//!
//! Every tunable lives here as a `pub const`. [`MonitorConfig`] bundles them
//! and provides one profile per deployment: the full sound + temperature
//! alert monitor, and the two bench probes that only print readings.

use crate::alert::{
    ReportPolicy,
    ThresholdConfig,
};
use crate::calibration::{
    AdcScale,
    Averaging,
    DividerModel,
    TemperatureModel,
};
use crate::emitter::EmitterConfig;
use crate::error::ConfigError;

// ── Acoustic capture ────────────────────────────────────────────────────────

/// Acoustic sample rate (8 kHz).
pub const SAMPLE_RATE_HZ: u32 = 8_000;

/// Samples per loudness window (~128 ms at 8 kHz).
pub const WINDOW_LEN: usize = 1024;

// ── Thresholds ──────────────────────────────────────────────────────────────

/// Alert when loudness is at or above this level.
pub const LOUDNESS_THRESHOLD_DBFS: f32 = -4.0;

/// Alert when temperature is at or above this level.
pub const TEMPERATURE_THRESHOLD_C: f32 = 30.0;

// ── ADC and calibration ─────────────────────────────────────────────────────

/// ADC reference voltage.
pub const REFERENCE_VOLTS: f32 = 3.3;

/// External divider between the panel and the ADC pin.
pub const DIVIDER_RATIO: f32 = 5.0;

pub const TEMP_REFERENCE_C: f32 = 27.0;
pub const TEMP_VOLTS_AT_REFERENCE: f32 = 0.706;
pub const TEMP_SLOPE_V_PER_C: f32 = 0.001721;

pub const TEMPERATURE_SAMPLES: u16 = 32;
pub const PANEL_SAMPLES: u16 = 64;

/// Spacing between averaged reads.
pub const AVERAGING_SPACING_US: u32 = 200;

// ── Emitter ─────────────────────────────────────────────────────────────────

/// IR carrier (38 kHz, standard for consumer IR receivers).
pub const CARRIER_HZ: u32 = 38_000;

/// How long one alert pulse is held.
pub const PULSE_MS: u32 = 1_000;

// ── Loop pacing ─────────────────────────────────────────────────────────────

/// Pause between cycles.
pub const SETTLE_MS: u32 = 50;

/// Full monitor configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorConfig {
    pub sample_rate_hz: u32,
    pub thresholds: ThresholdConfig,
    pub report: ReportPolicy,
    pub adc: AdcScale,
    pub temperature: TemperatureModel,
    pub temperature_averaging: Averaging,
    pub divider: DividerModel,
    pub panel_averaging: Averaging,
    pub emitter: EmitterConfig,
    pub settle_ms: u32,
}

impl MonitorConfig {
    /// Sound and temperature alerting with an IR pulse. Readings are only
    /// printed when an alert fires.
    pub const fn combined() -> Self {
        Self {
            sample_rate_hz: SAMPLE_RATE_HZ,
            thresholds: ThresholdConfig::new(LOUDNESS_THRESHOLD_DBFS, TEMPERATURE_THRESHOLD_C),
            report: ReportPolicy::OnAlert,
            adc: AdcScale::new(crate::analog::FULL_SCALE as f32, REFERENCE_VOLTS),
            temperature: TemperatureModel::new(
                TEMP_REFERENCE_C,
                TEMP_VOLTS_AT_REFERENCE,
                TEMP_SLOPE_V_PER_C,
            ),
            temperature_averaging: Averaging::new(TEMPERATURE_SAMPLES, AVERAGING_SPACING_US),
            divider: DividerModel::new(DIVIDER_RATIO),
            panel_averaging: Averaging::new(PANEL_SAMPLES, AVERAGING_SPACING_US),
            emitter: EmitterConfig::new(CARRIER_HZ, PULSE_MS),
            settle_ms: SETTLE_MS,
        }
    }

    /// Bench probe for the temperature sensor: no triggers, one reading per
    /// second.
    pub const fn temperature_probe() -> Self {
        let mut config = Self::combined();
        config.thresholds = ThresholdConfig::DISABLED;
        config.report = ReportPolicy::EveryCycle;
        config.settle_ms = 1_000;
        config
    }

    /// Bench probe for the panel divider: no triggers, two readings per
    /// second.
    pub const fn panel_probe() -> Self {
        let mut config = Self::combined();
        config.thresholds = ThresholdConfig::DISABLED;
        config.report = ReportPolicy::EveryCycle;
        config.settle_ms = 500;
        config
    }

    /// Nominal acoustic sample period, truncated to whole microseconds.
    /// Zero when the rate is zero or above 1 MHz; [`validate`](Self::validate)
    /// rejects both.
    pub const fn period_us(&self) -> u32 {
        match 1_000_000u32.checked_div(self.sample_rate_hz) {
            Some(period) => period,
            None => 0,
        }
    }

    /// Check every precondition the monitor relies on.
    pub fn validate(&self, window_len: usize) -> Result<(), ConfigError> {
        if window_len == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.period_us() == 0 {
            return Err(ConfigError::SampleRateTooHigh);
        }
        if self.temperature_averaging.samples == 0 || self.panel_averaging.samples == 0 {
            return Err(ConfigError::ZeroAveragingSamples);
        }
        if !is_positive(self.adc.full_scale) || !is_positive(self.adc.reference_volts) {
            return Err(ConfigError::InvalidAdcScale);
        }
        if !is_positive(self.divider.ratio) {
            return Err(ConfigError::InvalidDividerRatio);
        }
        let slope = self.temperature.slope_v_per_c;
        if slope == 0.0 || !slope.is_finite() {
            return Err(ConfigError::InvalidTemperatureSlope);
        }
        if self.emitter.carrier_hz == 0 {
            return Err(ConfigError::ZeroCarrierFrequency);
        }
        if self.emitter.pulse_ms == 0 {
            return Err(ConfigError::ZeroPulseDuration);
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::combined()
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}
