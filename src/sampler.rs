//! Deadline-paced waveform capture.
//!
//! Each sample gets its own deadline, advanced from a running cursor by one
//! nominal period. The read happens first and the spin-wait second, so a slow
//! read only eats into its own slot and the schedule never slides.

use crate::analog::AnalogInput;
use crate::clock::{
    Monotonic,
    ticks_add,
    ticks_diff,
};

/// How one capture kept to its schedule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CaptureTiming {
    /// Wall time from schedule origin to the end of the last pacing wait.
    pub elapsed_us: u32,
    /// Samples whose read finished after their own deadline.
    pub late_samples: u16,
}

/// A contiguous, evenly paced acoustic window of exactly `N` samples.
///
/// Neither `Copy` nor `Clone`: a window is produced by one
/// [`capture`] and consumed by one loudness estimate.
#[derive(Debug)]
pub struct SampleWindow<const N: usize> {
    samples: [u16; N],
    timing: CaptureTiming,
}

impl<const N: usize> SampleWindow<N> {
    /// Wrap samples that were acquired elsewhere (replay, tests).
    pub const fn from_samples(samples: [u16; N]) -> Self {
        Self {
            samples,
            timing: CaptureTiming {
                elapsed_us: 0,
                late_samples: 0,
            },
        }
    }

    pub const fn samples(&self) -> &[u16; N] {
        &self.samples
    }

    pub const fn timing(&self) -> CaptureTiming {
        self.timing
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}

/// Nominal period plus the running deadline cursor for one capture.
#[derive(Clone, Copy, Debug)]
pub struct SamplingSchedule {
    period_us: u32,
    origin: u32,
    deadline: u32,
}

impl SamplingSchedule {
    pub const fn new(origin: u32, period_us: u32) -> Self {
        Self {
            period_us,
            origin,
            deadline: origin,
        }
    }

    /// Advance the cursor by one period and return the new deadline.
    #[inline]
    pub fn advance(&mut self) -> u32 {
        self.deadline = ticks_add(self.deadline, self.period_us);
        self.deadline
    }

    pub const fn deadline(&self) -> u32 {
        self.deadline
    }

    pub const fn origin(&self) -> u32 {
        self.origin
    }
}

/// Acquire `N` samples from `channel`, one every `period_us`.
///
/// Blocks for roughly `N * period_us`. Any read error aborts immediately;
/// the partial window is dropped.
pub fn capture<const N: usize, A, C>(
    channel: &mut A,
    clock: &mut C,
    period_us: u32,
) -> Result<SampleWindow<N>, A::Error>
where
    A: AnalogInput,
    C: Monotonic,
{
    let mut samples = [0u16; N];
    let mut late_samples: u16 = 0;
    let mut schedule = SamplingSchedule::new(clock.now_us(), period_us);

    for slot in samples.iter_mut() {
        let deadline = schedule.advance();
        *slot = channel.read_u16()?;

        if ticks_diff(deadline, clock.now_us()) < 0 {
            late_samples = late_samples.saturating_add(1);
        }
        while ticks_diff(deadline, clock.now_us()) > 0 {
            core::hint::spin_loop();
        }
    }

    let elapsed_us = clock.now_us().wrapping_sub(schedule.origin());
    Ok(SampleWindow {
        samples,
        timing: CaptureTiming {
            elapsed_us,
            late_samples,
        },
    })
}
