// src/audio/correlate.rs
//! FFT-accelerated valid-mode cross-correlation
//!
//! Computes `c[k] = sum_j target[k + j] * pattern[j]` for every offset `k`
//! where the pattern fits entirely inside the target
//! (`0..=target.len() - pattern.len()`).
//!
//! The target is processed in overlap-save blocks: each block of
//! `fft_size` samples is multiplied in the frequency domain with the
//! conjugated pattern spectrum, and only the first
//! `fft_size - pattern.len() + 1` lags of the inverse transform (the ones
//! free of circular wrap-around) are kept. Memory stays bounded by the
//! block size no matter how long the recording is, and the cost is
//! O(n log m) instead of O(n * m).

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Smallest FFT block used for the overlap-save pass
const MIN_BLOCK: usize = 1 << 16;

/// Valid-mode cross-correlation of `target` against `pattern`
///
/// Arithmetic runs in `f64`; the result is stored as `f32` to keep the
/// per-offset sequence of a multi-hour recording affordable.
///
/// Returns an empty vector when the pattern is empty or longer than the
/// target.
///
/// # Example
/// ```
/// use jingle_trim::audio::cross_correlate_valid;
///
/// let target = [0.0, 0.0, 1.0, 2.0, 0.0];
/// let pattern = [1.0, 2.0];
///
/// let corr = cross_correlate_valid(&target, &pattern);
/// assert_eq!(corr.len(), 4);
/// assert!((corr[2] - 5.0).abs() < 1e-4);
/// ```
pub fn cross_correlate_valid(target: &[f32], pattern: &[f32]) -> Vec<f32> {
    let n = target.len();
    let m = pattern.len();
    if m == 0 || n < m {
        return Vec::new();
    }

    let out_len = n - m + 1;
    let fft_size = (4 * m)
        .next_power_of_two()
        .max(MIN_BLOCK)
        .min(n.next_power_of_two());
    let step = fft_size - m + 1;

    tracing::debug!(
        "Correlating {} samples against {}-sample pattern: fft_size={}, blocks={}",
        n,
        m,
        fft_size,
        out_len.div_ceil(step)
    );

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_size);
    let inverse = planner.plan_fft_inverse(fft_size);
    let mut scratch = vec![
        Complex::new(0.0, 0.0);
        forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len())
    ];

    // Conjugated pattern spectrum, shared by every block
    let mut pattern_spectrum: Vec<Complex<f64>> = pattern
        .iter()
        .map(|&x| Complex::new(x as f64, 0.0))
        .collect();
    pattern_spectrum.resize(fft_size, Complex::new(0.0, 0.0));
    forward.process_with_scratch(&mut pattern_spectrum, &mut scratch);
    for bin in &mut pattern_spectrum {
        *bin = bin.conj();
    }

    let scale = 1.0 / fft_size as f64;
    let mut output = Vec::with_capacity(out_len);
    let mut block = vec![Complex::new(0.0, 0.0); fft_size];

    let mut pos = 0;
    while pos < out_len {
        let end = (pos + fft_size).min(n);
        for (slot, &x) in block.iter_mut().zip(&target[pos..end]) {
            *slot = Complex::new(x as f64, 0.0);
        }
        for slot in &mut block[end - pos..] {
            *slot = Complex::new(0.0, 0.0);
        }

        forward.process_with_scratch(&mut block, &mut scratch);
        for (bin, p) in block.iter_mut().zip(&pattern_spectrum) {
            *bin *= *p;
        }
        inverse.process_with_scratch(&mut block, &mut scratch);

        let count = step.min(out_len - pos);
        output.extend(block[..count].iter().map(|c| (c.re * scale) as f32));
        pos += step;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn correlate_direct(target: &[f32], pattern: &[f32]) -> Vec<f64> {
        (0..=target.len() - pattern.len())
            .map(|k| {
                pattern
                    .iter()
                    .enumerate()
                    .map(|(j, &p)| target[k + j] as f64 * p as f64)
                    .sum()
            })
            .collect()
    }

    fn noise(len: usize, seed: u64) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    #[test]
    fn test_matches_direct_correlation() {
        let target = noise(3000, 1);
        let pattern = noise(257, 2);

        let fast = cross_correlate_valid(&target, &pattern);
        let direct = correlate_direct(&target, &pattern);

        assert_eq!(fast.len(), direct.len());
        for (k, (&f, &d)) in fast.iter().zip(direct.iter()).enumerate() {
            assert!((f as f64 - d).abs() < 1e-3, "Lag {}: fft {} vs direct {}", k, f, d);
        }
    }

    #[test]
    fn test_multiple_blocks_match_direct() {
        // Long enough that the target spans several overlap-save blocks
        let target = noise(MIN_BLOCK * 3 + 123, 3);
        let pattern = noise(100, 4);

        let fast = cross_correlate_valid(&target, &pattern);
        let direct = correlate_direct(&target, &pattern);

        assert_eq!(fast.len(), target.len() - pattern.len() + 1);
        for k in (0..direct.len()).step_by(997).chain(direct.len() - 50..direct.len()) {
            assert!(
                (fast[k] as f64 - direct[k]).abs() < 1e-3,
                "Lag {}: fft {} vs direct {}",
                k,
                fast[k],
                direct[k]
            );
        }
    }

    #[test]
    fn test_equal_lengths_give_single_lag() {
        let signal = noise(500, 5);
        let corr = cross_correlate_valid(&signal, &signal);

        let energy: f64 = signal.iter().map(|&x| x as f64 * x as f64).sum();
        assert_eq!(corr.len(), 1);
        assert!((corr[0] as f64 - energy).abs() < 1e-2);
    }

    #[test]
    fn test_short_target_or_empty_pattern() {
        assert!(cross_correlate_valid(&[1.0, 2.0], &[1.0, 2.0, 3.0]).is_empty());
        assert!(cross_correlate_valid(&[1.0, 2.0], &[]).is_empty());
        assert!(cross_correlate_valid(&[], &[1.0]).is_empty());
    }

    #[test]
    fn test_silent_target_is_all_zero() {
        let corr = cross_correlate_valid(&vec![0.0; 4096], &noise(64, 6));
        assert!(corr.iter().all(|&c| c == 0.0));
    }
}
