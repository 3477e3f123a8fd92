//! Infrared emitter pulse.
//!
//! The emitter is any PWM output already running at the IR carrier. A pulse
//! is 50 % duty for a fixed time, then fully off. Nothing else may run while
//! it is lit. A failed write leaves the emitter marked lit until an off write
//! succeeds.

use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::SetDutyCycle;

/// Carrier and pulse length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EmitterConfig {
    pub carrier_hz: u32,
    pub pulse_ms: u32,
}

impl EmitterConfig {
    pub const fn new(carrier_hz: u32, pulse_ms: u32) -> Self {
        Self {
            carrier_hz,
            pulse_ms,
        }
    }
}

/// IR emitter on a duty-cycle controlled output.
pub struct IrEmitter<P> {
    pwm: P,
    pulse_ms: u32,
    lit: bool,
}

impl<P: SetDutyCycle> IrEmitter<P> {
    /// Take ownership of the output and make sure it starts dark.
    pub fn new(mut pwm: P, config: &EmitterConfig) -> Result<Self, P::Error> {
        pwm.set_duty_cycle_fully_off()?;
        Ok(Self {
            pwm,
            pulse_ms: config.pulse_ms,
            lit: false,
        })
    }

    /// Emit one pulse. Blocks for the whole pulse length.
    ///
    /// The closing off write is retried once. If the output still cannot be
    /// turned off, the error is returned and [`is_lit`](Self::is_lit) stays
    /// set.
    pub fn pulse<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), P::Error> {
        self.lit = true;
        if let Err(e) = self.pwm.set_duty_cycle_fraction(1, 2) {
            let _ = self.force_off();
            return Err(e);
        }
        delay.delay_ms(self.pulse_ms);
        if self.force_off().is_err() {
            warn!("emitter off write failed, retrying");
            return self.force_off();
        }
        Ok(())
    }

    /// Drive the output fully off.
    pub fn force_off(&mut self) -> Result<(), P::Error> {
        self.pwm.set_duty_cycle_fully_off()?;
        self.lit = false;
        Ok(())
    }

    /// Whether the output may still be emitting.
    pub const fn is_lit(&self) -> bool {
        self.lit
    }

    pub const fn pulse_ms(&self) -> u32 {
        self.pulse_ms
    }

    pub const fn output(&self) -> &P {
        &self.pwm
    }

    pub fn release(self) -> P {
        self.pwm
    }
}
