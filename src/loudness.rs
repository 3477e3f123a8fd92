//! Loudness in dBFS.
//!
//! 0 dBFS is a sine that swings the converter rail to rail. The DC bias of
//! the microphone front end is removed by subtracting the window mean before
//! the RMS is taken.

use crate::analog::FULL_SCALE;
use crate::sampler::SampleWindow;

/// Reported for a window with no AC content at all, and the lower clamp for
/// anything quieter.
pub const SILENCE_FLOOR_DBFS: f32 = -120.0;

/// RMS of a full-scale sine centred on mid-scale.
pub const FULL_SCALE_SINE_RMS: f32 = (FULL_SCALE as f32 / 2.0) / core::f32::consts::SQRT_2;

/// Zero-centred RMS of a raw window.
pub fn ac_rms(samples: &[u16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let count = samples.len() as f32;
    let sum: u64 = samples.iter().map(|&s| u64::from(s)).sum();
    let mean = sum as f32 / count;

    let energy: f32 = samples
        .iter()
        .map(|&s| {
            let v = f32::from(s) - mean;
            v * v
        })
        .sum();

    libm::sqrtf(energy / count)
}

/// Convert an RMS amplitude to dBFS, clamped at [`SILENCE_FLOOR_DBFS`].
pub fn rms_to_dbfs(rms: f32) -> f32 {
    if rms <= 0.0 {
        return SILENCE_FLOOR_DBFS;
    }
    let dbfs = 20.0 * libm::log10f(rms / FULL_SCALE_SINE_RMS);
    if dbfs < SILENCE_FLOOR_DBFS {
        SILENCE_FLOOR_DBFS
    } else {
        dbfs
    }
}

/// Loudness of one captured window. Consumes the window.
pub fn estimate_dbfs<const N: usize>(window: SampleWindow<N>) -> f32 {
    rms_to_dbfs(ac_rms(window.samples()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 1024;
    const RATE_HZ: f32 = 8_000.0;

    /// Sine at `amplitude` (fraction of half-scale) around mid-scale.
    fn sine_window(tone_hz: f32, amplitude: f32) -> SampleWindow<N> {
        let mid = FULL_SCALE as f32 / 2.0;
        let mut samples = [0u16; N];
        for (i, s) in samples.iter_mut().enumerate() {
            let phase = 2.0 * core::f32::consts::PI * tone_hz * i as f32 / RATE_HZ;
            let v = mid + amplitude * mid * phase.sin();
            *s = v.round().clamp(0.0, FULL_SCALE as f32) as u16;
        }
        SampleWindow::from_samples(samples)
    }

    #[test]
    fn flat_window_hits_silence_floor() {
        for level in [0u16, 1, 32_768, FULL_SCALE] {
            let window = SampleWindow::from_samples([level; N]);
            assert_eq!(estimate_dbfs(window), SILENCE_FLOOR_DBFS);
        }
    }

    #[test]
    fn full_scale_sine_is_zero_dbfs() {
        let dbfs = estimate_dbfs(sine_window(1_000.0, 1.0));
        assert!(dbfs.abs() < 0.05, "{dbfs}");
    }

    #[test]
    fn half_scale_sine_is_minus_six_dbfs() {
        let dbfs = estimate_dbfs(sine_window(1_000.0, 0.5));
        assert!((dbfs - (-6.0206)).abs() < 0.05, "{dbfs}");
    }

    #[test]
    fn dc_offset_does_not_change_loudness() {
        let centred = sine_window(500.0, 0.25);
        let mut shifted = *centred.samples();
        for s in shifted.iter_mut() {
            *s += 4_000;
        }
        let a = estimate_dbfs(centred);
        let b = estimate_dbfs(SampleWindow::from_samples(shifted));
        assert!((a - b).abs() < 0.01, "{a} vs {b}");
    }

    #[test]
    fn near_silence_is_clamped_to_floor() {
        assert_eq!(rms_to_dbfs(1e-6), SILENCE_FLOOR_DBFS);
        assert_eq!(rms_to_dbfs(0.0), SILENCE_FLOOR_DBFS);
        // One LSB of AC content is still well above the floor.
        assert!(rms_to_dbfs(1.0) > SILENCE_FLOOR_DBFS);
    }

    #[test]
    fn two_sample_square_wave_is_full_scale_plus_three_db() {
        // A rail-to-rail square wave has sqrt(2) more RMS than a sine.
        let window = SampleWindow::from_samples([0, FULL_SCALE]);
        let dbfs = estimate_dbfs(window);
        assert!((dbfs - 3.0103).abs() < 0.01, "{dbfs}");
    }
}
