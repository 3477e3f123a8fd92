//! IR LED driven by an LEDC channel at the carrier frequency.
//!
//! Duty is exposed through embedded-hal's `SetDutyCycle` in whole percent, so
//! "50 %" lands exactly on the LEDC's native `set_duty(50)`.

use embedded_hal::pwm::{
    ErrorKind,
    ErrorType,
    SetDutyCycle,
};
use esp_hal::{
    gpio::DriveMode,
    ledc::{
        LSGlobalClkSource,
        Ledc,
        LowSpeed,
        channel::{
            self,
            ChannelIFace,
        },
        timer::{
            self,
            TimerIFace,
            config::Duty,
        },
    },
    time::Rate,
};

use crate::{
    IrResources,
    emitter::EmitterConfig,
};

/// The LEDC rejected a duty update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub struct IrFault;

impl embedded_hal::pwm::Error for IrFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Carrier-modulated IR LED.
pub struct IrBlaster {
    channel: channel::Channel<'static, LowSpeed>,
}

impl IrBlaster {
    /// Configure LEDC timer 0 at the carrier and channel 0 on the IR pin,
    /// starting dark.
    pub fn new(res: IrResources<'static>, config: &EmitterConfig) -> Self {
        let ledc = crate::mk_static!(Ledc<'static>, Ledc::new(res.ledc));
        ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);

        let carrier = crate::mk_static!(
            timer::Timer<'static, LowSpeed>,
            ledc.timer::<LowSpeed>(timer::Number::Timer0)
        );
        carrier
            .configure(timer::config::Config {
                duty: Duty::Duty8Bit,
                clock_source: timer::LSClockSource::APBClk,
                frequency: Rate::from_hz(config.carrier_hz),
            })
            .unwrap();

        let mut channel = ledc.channel(channel::Number::Channel0, res.led);
        channel
            .configure(channel::config::Config {
                timer: &*carrier,
                duty_pct: 0,
                drive_mode: DriveMode::PushPull,
            })
            .unwrap();

        defmt::info!("IR carrier at {} Hz", config.carrier_hz);
        Self { channel }
    }
}

impl ErrorType for IrBlaster {
    type Error = IrFault;
}

impl SetDutyCycle for IrBlaster {
    fn max_duty_cycle(&self) -> u16 {
        100
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), IrFault> {
        let pct = duty.min(100) as u8;
        self.channel.set_duty(pct).map_err(|_| IrFault)
    }
}
