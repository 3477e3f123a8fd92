//! Monotonic microsecond timebase.
//!
//! Ticks are a free-running `u32` that wraps roughly every 71 minutes. All
//! comparisons go through [`ticks_diff`] so a deadline that lies across the
//! wrap is still seen as "in the future".

/// A free-running microsecond counter.
pub trait Monotonic {
    /// Current tick value in microseconds. Wraps at `u32::MAX`.
    fn now_us(&mut self) -> u32;
}

impl<T: Monotonic + ?Sized> Monotonic for &mut T {
    fn now_us(&mut self) -> u32 {
        T::now_us(self)
    }
}

/// `ticks + delta_us`, wrapping.
#[inline]
pub const fn ticks_add(ticks: u32, delta_us: u32) -> u32 {
    ticks.wrapping_add(delta_us)
}

/// Signed distance from `earlier` to `later` in microseconds.
///
/// Positive when `later` is still ahead of `earlier`. Valid as long as the
/// two points are less than half the counter range (~35 min) apart.
#[inline]
pub const fn ticks_diff(later: u32, earlier: u32) -> i32 {
    later.wrapping_sub(earlier) as i32
}

/// Wall-clock Embassy timebase, used on the board.
#[cfg(feature = "board")]
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbassyClock;

#[cfg(feature = "board")]
impl Monotonic for EmbassyClock {
    #[inline]
    fn now_us(&mut self) -> u32 {
        embassy_time::Instant::now().as_micros() as u32
    }
}
