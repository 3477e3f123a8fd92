//! Averaged quasi-DC readings and their linear calibrations.
//!
//! Both slow channels share one averaging primitive and one raw → volts
//! conversion. The temperature sensor then applies an offset/slope model; the
//! panel input undoes an external resistive divider.

use embedded_hal::delay::DelayNs;

use crate::analog::AnalogInput;

/// How many reads to average and how far apart to space them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Averaging {
    pub samples: u16,
    /// Pause after each read; zero reads back to back.
    pub spacing_us: u32,
}

impl Averaging {
    pub const fn new(samples: u16, spacing_us: u32) -> Self {
        Self {
            samples,
            spacing_us,
        }
    }
}

/// Read `samples` values from `channel` and return their mean.
///
/// Spacing is a plain delay, not a deadline: the signal is slow enough that
/// jitter does not matter. Zero samples yields `0.0`.
pub fn average_raw<A, D>(
    channel: &mut A,
    delay: &mut D,
    samples: u16,
    inter_sample_delay_us: u32,
) -> Result<f32, A::Error>
where
    A: AnalogInput,
    D: DelayNs,
{
    if samples == 0 {
        return Ok(0.0);
    }

    let mut total: u32 = 0;
    for _ in 0..samples {
        total += u32::from(channel.read_u16()?);
        if inter_sample_delay_us != 0 {
            delay.delay_us(inter_sample_delay_us);
        }
    }
    Ok(total as f32 / f32::from(samples))
}

/// `(raw_average / full_scale) * reference_voltage`
#[inline]
pub fn to_volts(raw_average: f32, full_scale: f32, reference_voltage: f32) -> f32 {
    (raw_average / full_scale) * reference_voltage
}

/// Converter span shared by every analog input.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcScale {
    pub full_scale: f32,
    pub reference_volts: f32,
}

impl AdcScale {
    pub const fn new(full_scale: f32, reference_volts: f32) -> Self {
        Self {
            full_scale,
            reference_volts,
        }
    }

    #[inline]
    pub fn volts(&self, raw_average: f32) -> f32 {
        to_volts(raw_average, self.full_scale, self.reference_volts)
    }

    /// Raw reading that corresponds to `volts` at the pin.
    pub fn raw_for(&self, volts: f32) -> f32 {
        volts / self.reference_volts * self.full_scale
    }
}

/// Linear temperature sensor: voltage falls by `slope_v_per_c` per degree
/// above `reference_c`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TemperatureModel {
    pub reference_c: f32,
    pub volts_at_reference: f32,
    pub slope_v_per_c: f32,
}

impl TemperatureModel {
    /// Typical RP2040 on-die sensor values. Used as placeholder defaults for
    /// the board's external sensor.
    pub const RP2040_TYPICAL: Self = Self::new(27.0, 0.706, 0.001721);

    pub const fn new(reference_c: f32, volts_at_reference: f32, slope_v_per_c: f32) -> Self {
        Self {
            reference_c,
            volts_at_reference,
            slope_v_per_c,
        }
    }

    #[inline]
    pub fn celsius(&self, volts: f32) -> f32 {
        self.reference_c - (volts - self.volts_at_reference) / self.slope_v_per_c
    }
}

/// External divider in front of the panel input.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DividerModel {
    /// Source volts per pin volt.
    pub ratio: f32,
}

impl DividerModel {
    pub const fn new(ratio: f32) -> Self {
        Self { ratio }
    }

    #[inline]
    pub fn source_volts(&self, volts_at_adc: f32) -> f32 {
        volts_at_adc * self.ratio
    }
}

/// One averaged panel measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelReading {
    pub raw_average: f32,
    /// Voltage on the pin, after the divider.
    pub volts_at_adc: f32,
    /// Estimated voltage before the divider.
    pub sensed_volts: f32,
}

impl PanelReading {
    pub fn from_raw(raw_average: f32, adc: &AdcScale, divider: &DividerModel) -> Self {
        let volts_at_adc = adc.volts(raw_average);
        Self {
            raw_average,
            volts_at_adc,
            sensed_volts: divider.source_volts(volts_at_adc),
        }
    }
}

/// Temperature in °C from an already averaged raw reading.
pub fn temperature_from_raw(raw_average: f32, adc: &AdcScale, model: &TemperatureModel) -> f32 {
    model.celsius(adc.volts(raw_average))
}

/// Averaged temperature reading in °C.
pub fn read_temp_c<A, D>(
    channel: &mut A,
    delay: &mut D,
    averaging: Averaging,
    adc: &AdcScale,
    model: &TemperatureModel,
) -> Result<f32, A::Error>
where
    A: AnalogInput,
    D: DelayNs,
{
    let raw = average_raw(channel, delay, averaging.samples, averaging.spacing_us)?;
    Ok(temperature_from_raw(raw, adc, model))
}

/// Averaged panel reading, both before and after the divider.
pub fn read_panel<A, D>(
    channel: &mut A,
    delay: &mut D,
    averaging: Averaging,
    adc: &AdcScale,
    divider: &DividerModel,
) -> Result<PanelReading, A::Error>
where
    A: AnalogInput,
    D: DelayNs,
{
    let raw = average_raw(channel, delay, averaging.samples, averaging.spacing_us)?;
    Ok(PanelReading::from_raw(raw, adc, divider))
}
