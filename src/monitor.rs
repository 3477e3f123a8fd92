//! One monitoring cycle, start to finish.
//!
//! ```text
//! Idle → Sampling → Estimating → Deciding → [Alerting → Actuating] → Idle
//! ```
//!
//! Each stage consumes the complete output of the previous one. A channel
//! fault anywhere aborts the cycle without a partial snapshot or report.

use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::SetDutyCycle;

use crate::alert::{
    AlertOutcome,
    ReadingSnapshot,
    Report,
    ReportKind,
    ReportPolicy,
    ReportSink,
    evaluate_and_act,
};
use crate::analog::AnalogInput;
use crate::calibration::{
    read_panel,
    read_temp_c,
};
use crate::clock::Monotonic;
use crate::config::MonitorConfig;
use crate::emitter::IrEmitter;
use crate::error::{
    Channel,
    ChannelFault,
    ConfigError,
};
use crate::loudness::estimate_dbfs;
use crate::sampler::{
    CaptureTiming,
    capture,
};

/// Where the monitor currently is within a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CyclePhase {
    Idle,
    Sampling,
    Estimating,
    Deciding,
    Alerting,
    Actuating,
}

/// The three analog inputs, owned for the lifetime of the monitor.
pub struct Sensors<A, T, V> {
    pub acoustic: A,
    pub temperature: T,
    pub panel: V,
}

/// Result of a completed cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    pub snapshot: ReadingSnapshot,
    pub outcome: AlertOutcome,
    pub capture: CaptureTiming,
}

/// Sound, temperature and panel monitor with an IR alert output.
///
/// `N` is the acoustic window length.
pub struct Monitor<A, T, V, P, C, D, const N: usize> {
    sensors: Sensors<A, T, V>,
    emitter: IrEmitter<P>,
    clock: C,
    delay: D,
    config: MonitorConfig,
    phase: CyclePhase,
    cycles: u32,
}

impl<A, T, V, P, C, D, const N: usize> Monitor<A, T, V, P, C, D, N>
where
    A: AnalogInput,
    T: AnalogInput,
    V: AnalogInput,
    P: SetDutyCycle,
    C: Monotonic,
    D: DelayNs,
{
    /// Validate `config` and take ownership of the peripherals. The emitter
    /// must have been built from `config.emitter`.
    pub fn new(
        sensors: Sensors<A, T, V>,
        emitter: IrEmitter<P>,
        clock: C,
        delay: D,
        config: MonitorConfig,
    ) -> Result<Self, ConfigError> {
        config.validate(N)?;
        if emitter.pulse_ms() != config.emitter.pulse_ms {
            return Err(ConfigError::EmitterMismatch);
        }
        info!(
            "monitor ready: window={} period={}us pulse={}ms",
            N,
            config.period_us(),
            emitter.pulse_ms()
        );
        Ok(Self {
            sensors,
            emitter,
            clock,
            delay,
            config,
            phase: CyclePhase::Idle,
            cycles: 0,
        })
    }

    pub const fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Completed cycles so far.
    pub const fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Run one cycle: capture, estimate, decide and, if needed, alert.
    ///
    /// Returns to [`CyclePhase::Idle`] whether it succeeds or faults.
    pub fn run_cycle<S: ReportSink>(&mut self, sink: &mut S) -> Result<CycleReport, ChannelFault> {
        let result = self.cycle(sink);
        self.phase = CyclePhase::Idle;
        match &result {
            Ok(_) => self.cycles = self.cycles.wrapping_add(1),
            Err(fault) => warn!("cycle aborted: {}", fault.channel),
        }
        result
    }

    /// The inter-cycle pause.
    pub fn settle(&mut self) {
        self.delay.delay_ms(self.config.settle_ms);
    }

    /// One cycle followed by the settle delay. The delay also follows an
    /// aborted cycle so a faulty channel is not hammered.
    pub fn step<S: ReportSink>(&mut self, sink: &mut S) -> Result<CycleReport, ChannelFault> {
        let result = self.run_cycle(sink);
        self.settle();
        result
    }

    fn cycle<S: ReportSink>(&mut self, sink: &mut S) -> Result<CycleReport, ChannelFault> {
        // A previous pulse may have failed to switch off.
        if self.emitter.is_lit() {
            self.emitter
                .force_off()
                .map_err(|_| ChannelFault::new(Channel::Emitter))?;
        }

        self.phase = CyclePhase::Sampling;
        let window = capture::<N, _, _>(
            &mut self.sensors.acoustic,
            &mut self.clock,
            self.config.period_us(),
        )
        .map_err(|_| ChannelFault::new(Channel::Acoustic))?;
        let timing = window.timing();
        if timing.late_samples > 0 {
            debug!(
                "capture overran {} deadlines in {}us",
                timing.late_samples, timing.elapsed_us
            );
        }

        self.phase = CyclePhase::Estimating;
        let loudness_dbfs = estimate_dbfs(window);
        let temperature_c = read_temp_c(
            &mut self.sensors.temperature,
            &mut self.delay,
            self.config.temperature_averaging,
            &self.config.adc,
            &self.config.temperature,
        )
        .map_err(|_| ChannelFault::new(Channel::Temperature))?;
        let panel = read_panel(
            &mut self.sensors.panel,
            &mut self.delay,
            self.config.panel_averaging,
            &self.config.adc,
            &self.config.divider,
        )
        .map_err(|_| ChannelFault::new(Channel::Panel))?;

        let snapshot = ReadingSnapshot {
            loudness_dbfs,
            temperature_c,
            sensed_volts: panel.sensed_volts,
            volts_at_adc: panel.volts_at_adc,
            panel_raw: panel.raw_average,
        };

        self.phase = CyclePhase::Deciding;
        let mut observed = PhaseSink {
            inner: &mut *sink,
            phase: &mut self.phase,
        };
        let outcome = evaluate_and_act(
            &snapshot,
            &self.config.thresholds,
            &mut self.emitter,
            &mut self.delay,
            &mut observed,
        )
        .map_err(|_| ChannelFault::new(Channel::Emitter))?;

        match outcome {
            AlertOutcome::Alerted(trigger) => info!(
                "alert: loudness={} temperature={}",
                trigger.loudness, trigger.temperature
            ),
            AlertOutcome::Quiet if self.config.report == ReportPolicy::EveryCycle => {
                sink.report(&Report {
                    kind: ReportKind::Reading,
                    snapshot,
                });
            }
            AlertOutcome::Quiet => {}
        }

        Ok(CycleReport {
            snapshot,
            outcome,
            capture: timing,
        })
    }
}

/// Marks the alert report and the pulse that follows it as separate phases.
struct PhaseSink<'a, S> {
    inner: &'a mut S,
    phase: &'a mut CyclePhase,
}

impl<S: ReportSink> ReportSink for PhaseSink<'_, S> {
    fn report(&mut self, report: &Report) {
        *self.phase = CyclePhase::Alerting;
        self.inner.report(report);
        *self.phase = CyclePhase::Actuating;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WINDOW_LEN;
    use crate::emitter::EmitterConfig;
    use crate::loudness::SILENCE_FLOOR_DBFS;
    use core::cell::Cell;
    use embedded_hal::pwm::{
        ErrorKind,
        ErrorType,
    };
    use std::rc::Rc;

    struct Constant(u16);

    impl AnalogInput for Constant {
        type Error = ();
        fn read_u16(&mut self) -> Result<u16, ()> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl AnalogInput for Broken {
        type Error = ();
        fn read_u16(&mut self) -> Result<u16, ()> {
            Err(())
        }
    }

    /// Clock and delay share one simulated timeline.
    #[derive(Clone, Default)]
    struct Timeline(Rc<Cell<u64>>);

    impl Monotonic for Timeline {
        fn now_us(&mut self) -> u32 {
            let now = self.0.get();
            self.0.set(now + 1);
            now as u32
        }
    }

    impl DelayNs for Timeline {
        fn delay_ns(&mut self, ns: u32) {
            self.0.set(self.0.get() + u64::from(ns).div_ceil(1_000));
        }
    }

    #[derive(Default)]
    struct Pwm(Vec<u16>);

    impl ErrorType for Pwm {
        type Error = core::convert::Infallible;
    }

    impl SetDutyCycle for Pwm {
        fn max_duty_cycle(&self) -> u16 {
            100
        }
        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            self.0.push(duty);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Sink(Vec<Report>);

    impl ReportSink for Sink {
        fn report(&mut self, report: &Report) {
            self.0.push(*report);
        }
    }

    /// Raw panel value for 1.65 V at the pin.
    const MID_SCALE: u16 = 32_768;

    fn monitor<A: AnalogInput>(
        acoustic: A,
        temperature_raw: u16,
        config: MonitorConfig,
    ) -> Monitor<A, Constant, Constant, Pwm, Timeline, Timeline, WINDOW_LEN> {
        let timeline = Timeline::default();
        let emitter = IrEmitter::new(Pwm::default(), &config.emitter).unwrap();
        Monitor::new(
            Sensors {
                acoustic,
                temperature: Constant(temperature_raw),
                panel: Constant(MID_SCALE),
            },
            emitter,
            timeline.clone(),
            timeline,
            config,
        )
        .unwrap()
    }

    /// Raw temperature reading for roughly `celsius`.
    fn raw_for_celsius(config: &MonitorConfig, celsius: f32) -> u16 {
        let t = &config.temperature;
        let volts = t.volts_at_reference - (celsius - t.reference_c) * t.slope_v_per_c;
        config.adc.raw_for(volts).round() as u16
    }

    #[test]
    fn rejects_invalid_configuration() {
        let mut config = MonitorConfig::combined();
        config.sample_rate_hz = 0;
        let timeline = Timeline::default();
        let result = Monitor::<_, _, _, _, _, _, WINDOW_LEN>::new(
            Sensors {
                acoustic: Constant(0),
                temperature: Constant(0),
                panel: Constant(0),
            },
            IrEmitter::new(Pwm::default(), &EmitterConfig::new(38_000, 1_000)).unwrap(),
            timeline.clone(),
            timeline,
            config,
        );
        assert_eq!(result.err(), Some(ConfigError::ZeroSampleRate));
    }

    #[test]
    fn quiet_cycle_reports_nothing() {
        let config = MonitorConfig::combined();
        let raw = raw_for_celsius(&config, 20.0);
        let mut monitor = monitor(Constant(MID_SCALE), raw, config);
        let mut sink = Sink::default();

        let report = monitor.run_cycle(&mut sink).unwrap();

        assert_eq!(report.outcome, AlertOutcome::Quiet);
        assert_eq!(report.snapshot.loudness_dbfs, SILENCE_FLOOR_DBFS);
        assert!((report.snapshot.temperature_c - 20.0).abs() < 0.05);
        assert!(sink.0.is_empty());
        assert_eq!(monitor.phase(), CyclePhase::Idle);
        assert_eq!(monitor.cycles(), 1);
    }

    #[test]
    fn hot_cycle_alerts_and_pulses() {
        let config = MonitorConfig::combined();
        let raw = raw_for_celsius(&config, 35.0);
        let mut monitor = monitor(Constant(MID_SCALE), raw, config);
        let mut sink = Sink::default();

        let report = monitor.run_cycle(&mut sink).unwrap();

        assert!(matches!(report.outcome, AlertOutcome::Alerted(t) if t.temperature && !t.loudness));
        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.0[0].kind, ReportKind::Alert);
        assert_eq!(monitor.emitter.output().0.as_slice(), &[0, 50, 0]);
    }

    #[test]
    fn probe_profile_reports_every_cycle_without_pulsing() {
        let config = MonitorConfig::panel_probe();
        let raw = raw_for_celsius(&config, 80.0);
        let mut monitor = monitor(Constant(MID_SCALE), raw, config);
        let mut sink = Sink::default();

        monitor.step(&mut sink).unwrap();
        monitor.step(&mut sink).unwrap();

        assert_eq!(sink.0.len(), 2);
        assert!(sink.0.iter().all(|r| r.kind == ReportKind::Reading));
        assert!((sink.0[0].snapshot.volts_at_adc - 1.65).abs() < 1e-3);
        assert!((sink.0[0].snapshot.sensed_volts - 8.25).abs() < 1e-2);
        assert_eq!(sink.0[0].snapshot.panel_raw, f32::from(MID_SCALE));
        assert!(sink.0[0].to_string().ends_with("Raw  :  32768"));
        assert_eq!(monitor.emitter.output().0.as_slice(), &[0]);
    }

    #[test]
    fn channel_fault_aborts_without_report() {
        let config = MonitorConfig::combined();
        let raw = raw_for_celsius(&config, 90.0);
        let mut monitor = monitor(Broken, raw, config);
        let mut sink = Sink::default();

        let fault = monitor.step(&mut sink).unwrap_err();

        assert_eq!(fault, ChannelFault::new(Channel::Acoustic));
        assert!(sink.0.is_empty());
        assert_eq!(monitor.emitter.output().0.as_slice(), &[0]);
        assert_eq!(monitor.phase(), CyclePhase::Idle);
        assert_eq!(monitor.cycles(), 0);
    }

    #[test]
    fn rejects_emitter_built_for_another_pulse_length() {
        let timeline = Timeline::default();
        let result = Monitor::<_, _, _, _, _, _, WINDOW_LEN>::new(
            Sensors {
                acoustic: Constant(0),
                temperature: Constant(0),
                panel: Constant(0),
            },
            IrEmitter::new(Pwm::default(), &EmitterConfig::new(38_000, 0)).unwrap(),
            timeline.clone(),
            timeline,
            MonitorConfig::combined(),
        );
        assert_eq!(result.err(), Some(ConfigError::EmitterMismatch));
    }

    /// Output whose off writes fail while `failing_offs` is non-zero.
    struct StuckPwm {
        duty: Rc<Cell<u16>>,
        failing_offs: Rc<Cell<u8>>,
    }

    impl ErrorType for StuckPwm {
        type Error = ErrorKind;
    }

    impl SetDutyCycle for StuckPwm {
        fn max_duty_cycle(&self) -> u16 {
            100
        }
        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            let pending = self.failing_offs.get();
            if duty == 0 && pending > 0 {
                self.failing_offs.set(pending - 1);
                return Err(ErrorKind::Other);
            }
            self.duty.set(duty);
            Ok(())
        }
    }

    /// Acoustic input that counts reads taken while the emitter is on.
    struct Watched {
        duty: Rc<Cell<u16>>,
        lit_reads: Rc<Cell<u32>>,
    }

    impl AnalogInput for Watched {
        type Error = ();
        fn read_u16(&mut self) -> Result<u16, ()> {
            if self.duty.get() != 0 {
                self.lit_reads.set(self.lit_reads.get() + 1);
            }
            Ok(MID_SCALE)
        }
    }

    #[test]
    fn stuck_emitter_is_forced_dark_before_next_capture() {
        let config = MonitorConfig::combined();
        let duty = Rc::new(Cell::new(0));
        let failing_offs = Rc::new(Cell::new(0));
        let lit_reads = Rc::new(Cell::new(0));
        let emitter = IrEmitter::new(
            StuckPwm {
                duty: duty.clone(),
                failing_offs: failing_offs.clone(),
            },
            &config.emitter,
        )
        .unwrap();
        let timeline = Timeline::default();
        let mut monitor: Monitor<_, _, _, _, _, _, 64> = Monitor::new(
            Sensors {
                acoustic: Watched {
                    duty: duty.clone(),
                    lit_reads: lit_reads.clone(),
                },
                temperature: Constant(raw_for_celsius(&config, 35.0)),
                panel: Constant(MID_SCALE),
            },
            emitter,
            timeline.clone(),
            timeline,
            config,
        )
        .unwrap();
        let mut sink = Sink::default();

        // Both the off write and its retry fail.
        failing_offs.set(2);
        let fault = monitor.step(&mut sink).unwrap_err();
        assert_eq!(fault, ChannelFault::new(Channel::Emitter));
        assert_eq!(duty.get(), 50);

        let report = monitor.step(&mut sink).unwrap();
        assert!(matches!(report.outcome, AlertOutcome::Alerted(_)));
        assert_eq!(lit_reads.get(), 0);
        assert_eq!(duty.get(), 0);
        assert!(!monitor.emitter.is_lit());
    }

    #[test]
    fn emitter_that_stays_stuck_blocks_sampling() {
        let config = MonitorConfig::combined();
        let duty = Rc::new(Cell::new(0));
        let failing_offs = Rc::new(Cell::new(0));
        let lit_reads = Rc::new(Cell::new(0));
        let emitter = IrEmitter::new(
            StuckPwm {
                duty: duty.clone(),
                failing_offs: failing_offs.clone(),
            },
            &config.emitter,
        )
        .unwrap();
        let timeline = Timeline::default();
        let mut monitor: Monitor<_, _, _, _, _, _, 64> = Monitor::new(
            Sensors {
                acoustic: Watched {
                    duty,
                    lit_reads: lit_reads.clone(),
                },
                temperature: Constant(raw_for_celsius(&config, 35.0)),
                panel: Constant(MID_SCALE),
            },
            emitter,
            timeline.clone(),
            timeline,
            config,
        )
        .unwrap();
        let mut sink = Sink::default();

        failing_offs.set(3);
        assert!(monitor.step(&mut sink).is_err());
        let fault = monitor.step(&mut sink).unwrap_err();

        assert_eq!(fault, ChannelFault::new(Channel::Emitter));
        assert_eq!(lit_reads.get(), 0);
        assert_eq!(sink.0.len(), 1);
        assert_eq!(monitor.cycles(), 0);
    }
}
