//! Firmware entry: wire the board and run the monitor forever.

#![no_std]
#![no_main]

#[allow(clippy::wildcard_imports)]
use acoustic_sentinel::*;
use defmt::info;
use embassy_executor::Spawner;
use embassy_time::Delay;
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;
use esp_println as _;

extern crate alloc;

esp_bootloader_esp_idf::esp_app_desc!();

/// Which deployment this image runs. The bench probes reuse the same
/// pipeline with triggers disabled.
const PROFILE: MonitorConfig = MonitorConfig::combined();

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    let peripherals = acoustic_sentinel::init();
    let resources = split_resources!(peripherals);

    esp_alloc::heap_allocator!(size: 32 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let sensors: BoardSensors = resources.sensors.into();
    let emitter = IrEmitter::new(IrBlaster::new(resources.ir, &PROFILE.emitter), &PROFILE.emitter)
        .expect("IR emitter did not start dark");

    // A bad constant is a build mistake; refuse to run rather than loop on it.
    let mut monitor: BoardMonitor = match Monitor::new(sensors, emitter, EmbassyClock, Delay, PROFILE) {
        Ok(monitor) => monitor,
        Err(e) => panic!("invalid configuration: {}", e),
    };

    info!("monitoring");
    let mut console = Console;
    loop {
        // Faults are logged by the monitor; the next cycle simply retries.
        let _ = monitor.step(&mut console);
    }
}
