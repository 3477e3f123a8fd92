//! ADC1 inputs for the three analog sensors.
//!
//! All three pins sit on ADC1, which converts one channel at a time. The
//! converter lives in a `static` `RefCell` and each input borrows it only for
//! the duration of a single conversion. The ESP32-S3 converts to 12 bits;
//! results are widened to 16-bit full scale before they leave this module.
//!
//! The temperature input on GPIO7 is an external analog sensor. Its
//! calibration in [`crate::config`] reuses the RP2040 on-die figures
//! (27 °C at 0.706 V, 1.721 mV/°C) as placeholders until the fitted part is
//! characterized.

use core::cell::RefCell;

use esp_hal::{
    Blocking,
    analog::adc::{
        Adc,
        AdcChannel,
        AdcConfig,
        AdcPin,
        Attenuation,
    },
    peripherals::{
        ADC1,
        GPIO5,
        GPIO6,
        GPIO7,
    },
};

use crate::{
    SensorResources,
    analog::{
        AnalogInput,
        widen_12bit,
    },
    monitor::Sensors,
};

type SharedAdc = RefCell<Adc<'static, ADC1<'static>, Blocking>>;

/// Why a conversion did not produce a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum AdcError {
    /// Another input is holding the converter
    Busy,
    /// The driver rejected the conversion
    Conversion,
}

/// One ADC1 pin, sharing the converter with its siblings.
pub struct AdcInput<PIN> {
    adc: &'static SharedAdc,
    pin: AdcPin<PIN, ADC1<'static>>,
}

impl<PIN: AdcChannel> AnalogInput for AdcInput<PIN> {
    type Error = AdcError;

    fn read_u16(&mut self) -> Result<u16, AdcError> {
        let mut adc = self.adc.try_borrow_mut().map_err(|_| AdcError::Busy)?;
        let raw = nb::block!(adc.read_oneshot(&mut self.pin)).map_err(|()| AdcError::Conversion)?;
        Ok(widen_12bit(raw))
    }
}

/// The sensors as wired on the board.
pub type BoardSensors = Sensors<
    AdcInput<GPIO6<'static>>,
    AdcInput<GPIO7<'static>>,
    AdcInput<GPIO5<'static>>,
>;

impl From<SensorResources<'static>> for BoardSensors {
    fn from(res: SensorResources<'static>) -> Self {
        // 11 dB attenuation covers roughly the full 0..3.3 V rail.
        let mut config = AdcConfig::new();
        let sound = config.enable_pin(res.sound, Attenuation::_11dB);
        let temperature = config.enable_pin(res.temperature, Attenuation::_11dB);
        let panel = config.enable_pin(res.panel, Attenuation::_11dB);

        let adc: &'static SharedAdc =
            crate::mk_static!(SharedAdc, RefCell::new(Adc::new(res.adc, config)));

        Self {
            acoustic: AdcInput { adc, pin: sound },
            temperature: AdcInput {
                adc,
                pin: temperature,
            },
            panel: AdcInput { adc, pin: panel },
        }
    }
}
