//! Threshold decision, diagnostic report and IR actuation.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::SetDutyCycle;

use crate::emitter::IrEmitter;

/// Trigger levels. A `None` threshold never fires.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ThresholdConfig {
    pub loudness_dbfs: Option<f32>,
    pub temperature_c: Option<f32>,
}

impl ThresholdConfig {
    pub const DISABLED: Self = Self {
        loudness_dbfs: None,
        temperature_c: None,
    };

    pub const fn new(loudness_dbfs: f32, temperature_c: f32) -> Self {
        Self {
            loudness_dbfs: Some(loudness_dbfs),
            temperature_c: Some(temperature_c),
        }
    }
}

/// Everything measured in one cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadingSnapshot {
    pub loudness_dbfs: f32,
    pub temperature_c: f32,
    /// Panel voltage before the divider.
    pub sensed_volts: f32,
    /// Voltage on the ADC pin.
    pub volts_at_adc: f32,
    /// Averaged raw panel count, 16-bit full scale.
    pub panel_raw: f32,
}

/// Which inputs crossed their threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Trigger {
    pub loudness: bool,
    pub temperature: bool,
}

impl Trigger {
    pub const fn any(&self) -> bool {
        self.loudness || self.temperature
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertOutcome {
    Quiet,
    Alerted(Trigger),
}

/// When to print readings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportPolicy {
    /// Only when an alert fires.
    OnAlert,
    /// Every cycle; alert cycles are still marked as alerts.
    EveryCycle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    Alert,
    Reading,
}

/// Human-readable diagnostic report. Always carries the full snapshot.
/// Reading reports also show the raw panel count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Report {
    pub kind: ReportKind,
    pub snapshot: ReadingSnapshot,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.snapshot;
        match self.kind {
            ReportKind::Alert => writeln!(f, "ALERT:")?,
            ReportKind::Reading => writeln!(f, "READING:")?,
        }
        writeln!(f, "  Sound: {:6.1} dBFS", s.loudness_dbfs)?;
        writeln!(f, "  Temp : {:6.2} °C", s.temperature_c)?;
        write!(
            f,
            "  Panel: {:6.3} V (at ADC: {:6.3} V)",
            s.sensed_volts, s.volts_at_adc
        )?;
        if self.kind == ReportKind::Reading {
            write!(f, "\n  Raw  : {:6}", s.panel_raw as u32)?;
        }
        Ok(())
    }
}

/// Destination for diagnostic reports.
pub trait ReportSink {
    fn report(&mut self, report: &Report);
}

impl<T: ReportSink + ?Sized> ReportSink for &mut T {
    fn report(&mut self, report: &Report) {
        T::report(self, report)
    }
}

/// Inclusive threshold test on loudness OR temperature. Panel voltage is
/// never considered.
pub fn decide(snapshot: &ReadingSnapshot, thresholds: &ThresholdConfig) -> Trigger {
    Trigger {
        loudness: thresholds
            .loudness_dbfs
            .is_some_and(|limit| snapshot.loudness_dbfs >= limit),
        temperature: thresholds
            .temperature_c
            .is_some_and(|limit| snapshot.temperature_c >= limit),
    }
}

/// Decide, and on alert report the full snapshot then pulse the emitter.
///
/// A quiet decision has no side effects.
pub fn evaluate_and_act<P, D, S>(
    snapshot: &ReadingSnapshot,
    thresholds: &ThresholdConfig,
    emitter: &mut IrEmitter<P>,
    delay: &mut D,
    sink: &mut S,
) -> Result<AlertOutcome, P::Error>
where
    P: SetDutyCycle,
    D: DelayNs,
    S: ReportSink,
{
    let trigger = decide(snapshot, thresholds);
    if !trigger.any() {
        return Ok(AlertOutcome::Quiet);
    }

    sink.report(&Report {
        kind: ReportKind::Alert,
        snapshot: *snapshot,
    });
    emitter.pulse(delay)?;
    Ok(AlertOutcome::Alerted(trigger))
}
