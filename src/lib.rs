//! # acoustic-sentinel
//!
//! Standalone sound and temperature monitor with an infrared alert output.
//!
//! Every cycle the monitor:
//! - **Samples** the acoustic sensor at a fixed rate into one window
//! - **Estimates** loudness in dBFS and reads the temperature and panel
//!   voltage sensors through their linear calibrations
//! - **Decides** whether loudness or temperature crossed its threshold
//! - **Alerts** by printing the full reading and holding a 38 kHz IR pulse
//!
//! The signal path is plain `no_std` code over small traits
//! ([`AnalogInput`], [`Monotonic`], and embedded-hal's `DelayNs` and
//! `SetDutyCycle`). The `board` feature adds the ESP32-S3 wiring.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! let peripherals = acoustic_sentinel::init();
//! let resources = acoustic_sentinel::split_resources!(peripherals);
//!
//! let config = MonitorConfig::combined();
//! let sensors: BoardSensors = resources.sensors.into();
//! let emitter = IrEmitter::new(IrBlaster::new(resources.ir, &config.emitter), &config.emitter)?;
//! let mut monitor: BoardMonitor = Monitor::new(sensors, emitter, EmbassyClock, Delay, config)?;
//!
//! loop {
//!     let _ = monitor.step(&mut Console);
//! }
//! ```

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod alert;
pub mod analog;
pub mod calibration;
pub mod clock;
pub mod config;
pub mod emitter;
pub mod error;
pub mod loudness;
pub mod monitor;
pub mod sampler;

#[cfg(feature = "board")]
mod console;
#[cfg(feature = "board")]
mod ir_blaster;
#[cfg(feature = "board")]
pub mod sensors;

pub use alert::{
    AlertOutcome,
    ReadingSnapshot,
    Report,
    ReportKind,
    ReportPolicy,
    ReportSink,
    ThresholdConfig,
    Trigger,
    decide,
    evaluate_and_act,
};
pub use analog::{
    AnalogInput,
    FULL_SCALE,
};
pub use calibration::{
    AdcScale,
    Averaging,
    DividerModel,
    PanelReading,
    TemperatureModel,
    average_raw,
    read_panel,
    read_temp_c,
    to_volts,
};
pub use clock::Monotonic;
pub use config::MonitorConfig;
pub use emitter::{
    EmitterConfig,
    IrEmitter,
};
pub use error::{
    Channel,
    ChannelFault,
    ConfigError,
};
pub use loudness::{
    SILENCE_FLOOR_DBFS,
    estimate_dbfs,
};
pub use monitor::{
    CyclePhase,
    CycleReport,
    Monitor,
    Sensors,
};
pub use sampler::{
    CaptureTiming,
    SampleWindow,
    SamplingSchedule,
    capture,
};

#[cfg(feature = "board")]
pub use board::*;

#[cfg(feature = "board")]
mod board {
    pub use crate::clock::EmbassyClock;
    pub use crate::console::Console;
    pub use crate::ir_blaster::{
        IrBlaster,
        IrFault,
    };
    pub use crate::sensors::{
        AdcError,
        AdcInput,
        BoardSensors,
    };

    use esp_hal::{
        assign_resources,
        clock::CpuClock,
    };

    /// StaticCell helper — allocates a value into a `static` exactly once.
    #[macro_export]
    macro_rules! mk_static {
        ($t:ty, $val:expr) => {{
            static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
            #[deny(unused_attributes)]
            let x = STATIC_CELL.uninit().write($val);
            x
        }};
    }

    /// The monitor as wired on the board.
    pub type BoardMonitor = crate::Monitor<
        AdcInput<esp_hal::peripherals::GPIO6<'static>>,
        AdcInput<esp_hal::peripherals::GPIO7<'static>>,
        AdcInput<esp_hal::peripherals::GPIO5<'static>>,
        IrBlaster,
        EmbassyClock,
        embassy_time::Delay,
        { crate::config::WINDOW_LEN },
    >;

    // ── Pin / peripheral assignments ────────────────────────────────────────

    assign_resources! {
        pub Resources<'d> {
            sensors: SensorResources<'d> {
                sound: GPIO6,
                panel: GPIO5,
                temperature: GPIO7,
                adc: ADC1,
            },
            ir: IrResources<'d> {
                led: GPIO2,
                ledc: LEDC,
            },
        }
    }

    /// Initialise the chip and return the raw peripheral set.
    ///
    /// Call this once at the top of `main`, then use [`split_resources!`] to
    /// break the peripherals into typed resource groups.
    #[must_use]
    pub fn init() -> esp_hal::peripherals::Peripherals {
        let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
        esp_hal::init(config)
    }

    impl From<esp_hal::peripherals::Peripherals> for Resources<'_> {
        fn from(peripherals: esp_hal::peripherals::Peripherals) -> Self {
            split_resources!(peripherals)
        }
    }
}
