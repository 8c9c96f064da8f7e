//! Frequency grids and response evaluation
//!
//! Responses are sampled on a logarithmic grid so a plot covers the audio
//! band with even visual density per octave. Evaluation produces every
//! derived curve in one pass: complex response, linear and dB magnitude,
//! wrapped phase in radians and degrees, a NaN-masked display copy,
//! unwrapped phase, and the group- and phase-delay curves.
//!
//! Summation of responses happens on the **complex** values and only then
//! converts to dB, so coherent signals add amplitudes (two identical
//! filters sum to +6.02 dB) and an inverted copy cancels to `-inf` dB.

use serde::{Deserialize, Serialize};

use crate::cascade::SosCascade;
use crate::phase::{
    group_delay_ms, mask_discontinuities, phase_delay_ms, unwrap_rad, wrap_rad,
};
use crate::types::{linear_to_db, Complex};

/// Number of grid points used by the default analysis grid.
pub const DEFAULT_GRID_POINTS: usize = 5000;

/// A strictly increasing set of analysis frequencies in Hz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyGrid {
    frequencies_hz: Vec<f64>,
}

impl FrequencyGrid {
    /// Log-spaced grid from `start_hz` to `stop_hz` inclusive.
    ///
    /// Both endpoints must be positive with `start < stop`; `points` of 0
    /// or 1 degenerates to the start frequency alone.
    pub fn log_spaced(start_hz: f64, stop_hz: f64, points: usize) -> Self {
        debug_assert!(start_hz > 0.0 && stop_hz > start_hz);
        if points <= 1 {
            return Self {
                frequencies_hz: vec![start_hz],
            };
        }
        let log_start = start_hz.log10();
        let step = (stop_hz.log10() - log_start) / (points - 1) as f64;
        let frequencies_hz = (0..points)
            .map(|i| 10.0_f64.powf(log_start + step * i as f64))
            .collect();
        Self { frequencies_hz }
    }

    /// Default analysis grid: 1 Hz up to the Nyquist frequency,
    /// [`DEFAULT_GRID_POINTS`] points.
    pub fn default_audio(sample_rate_hz: f64) -> Self {
        Self::log_spaced(1.0, sample_rate_hz / 2.0, DEFAULT_GRID_POINTS)
    }

    pub fn frequencies_hz(&self) -> &[f64] {
        &self.frequencies_hz
    }

    pub fn len(&self) -> usize {
        self.frequencies_hz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies_hz.is_empty()
    }
}

/// Every curve derived from one evaluation of a transfer function.
///
/// All per-frequency vectors have the grid's length; `group_delay_ms` has
/// one fewer point (forward differences). Serializable for snapshotting,
/// though the NaN markers in `phase_deg_masked` need a format that can
/// represent them (JSON cannot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyResponse {
    /// The analysis frequencies, copied from the grid.
    pub frequencies_hz: Vec<f64>,
    /// Raw complex response `H(e^{jw})` per frequency.
    pub complex: Vec<Complex>,
    /// `|H|`, linear.
    pub magnitude: Vec<f64>,
    /// `20*log10(|H|)`; `-inf` where the response is exactly zero.
    pub magnitude_db: Vec<f64>,
    /// Wrapped phase in radians, `[-pi, pi)`.
    pub phase_rad: Vec<f64>,
    /// Wrapped phase in degrees, `[-180, 180)`.
    pub phase_deg: Vec<f64>,
    /// Display copy of `phase_deg` with wrap jumps blanked to NaN.
    pub phase_deg_masked: Vec<f64>,
    /// Unwrapped phase in radians.
    pub phase_unwrapped_rad: Vec<f64>,
    /// Group delay in milliseconds, one point per grid interval.
    pub group_delay_ms: Vec<f64>,
    /// Phase delay in milliseconds; NaN at non-positive frequencies.
    pub phase_delay_ms: Vec<f64>,
}

impl FrequencyResponse {
    /// Derive all curves from raw complex samples.
    pub fn from_complex(frequencies_hz: Vec<f64>, complex: Vec<Complex>) -> Self {
        debug_assert_eq!(frequencies_hz.len(), complex.len());
        let magnitude: Vec<f64> = complex.iter().map(|h| h.norm()).collect();
        let magnitude_db = magnitude.iter().map(|&m| linear_to_db(m)).collect();
        let phase_rad: Vec<f64> = complex.iter().map(|h| wrap_rad(h.arg())).collect();
        let phase_deg: Vec<f64> = phase_rad.iter().map(|p| p.to_degrees()).collect();
        let phase_deg_masked = mask_discontinuities(&phase_deg);
        let phase_unwrapped_rad = unwrap_rad(&phase_rad);
        let group_delay = group_delay_ms(&frequencies_hz, &phase_unwrapped_rad);
        let phase_delay = phase_delay_ms(&frequencies_hz, &phase_unwrapped_rad);
        Self {
            frequencies_hz,
            complex,
            magnitude,
            magnitude_db,
            phase_rad,
            phase_deg,
            phase_deg_masked,
            phase_unwrapped_rad,
            group_delay_ms: group_delay,
            phase_delay_ms: phase_delay,
        }
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.frequencies_hz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies_hz.is_empty()
    }

    /// Phasor sum of several responses evaluated on the same grid.
    ///
    /// Summing magnitudes (or worse, dB values) would ignore phase and
    /// over-report every crossover; the complex sum is the physically
    /// meaningful parallel combination.
    ///
    /// # Panics
    ///
    /// Panics if the responses were evaluated on different grids.
    pub fn sum(responses: &[&FrequencyResponse]) -> Self {
        assert!(!responses.is_empty(), "summing zero responses");
        let first = responses[0];
        for r in &responses[1..] {
            assert_eq!(
                r.frequencies_hz, first.frequencies_hz,
                "summed responses must share one grid"
            );
        }
        let complex: Vec<Complex> = (0..first.len())
            .map(|i| {
                responses
                    .iter()
                    .fold(Complex::new(0.0, 0.0), |acc, r| acc + r.complex[i])
            })
            .collect();
        Self::from_complex(first.frequencies_hz.clone(), complex)
    }
}

/// Evaluate a cascade's transfer function over a grid.
pub fn evaluate(
    cascade: &SosCascade,
    grid: &FrequencyGrid,
    sample_rate_hz: f64,
) -> FrequencyResponse {
    let frequencies = grid.frequencies_hz().to_vec();
    let complex = frequencies
        .iter()
        .map(|&f| cascade.response_at(f, sample_rate_hz))
        .collect();
    FrequencyResponse::from_complex(frequencies, complex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::SosSection;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_log_grid_endpoints_and_monotonicity() {
        let grid = FrequencyGrid::log_spaced(1.0, 24000.0, 5000);
        let f = grid.frequencies_hz();
        assert_eq!(f.len(), 5000);
        assert_relative_eq!(f[0], 1.0, max_relative = 1e-12);
        assert_relative_eq!(f[4999], 24000.0, max_relative = 1e-9);
        assert!(f.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_log_grid_constant_ratio() {
        let grid = FrequencyGrid::log_spaced(10.0, 10000.0, 4);
        let f = grid.frequencies_hz();
        assert_relative_eq!(f[1] / f[0], 10.0, max_relative = 1e-9);
        assert_relative_eq!(f[2] / f[1], 10.0, max_relative = 1e-9);
    }

    #[test]
    fn test_degenerate_grid() {
        let grid = FrequencyGrid::log_spaced(100.0, 200.0, 1);
        assert_eq!(grid.frequencies_hz(), &[100.0]);
    }

    #[test]
    fn test_all_curves_share_grid_length() {
        let cascade = SosCascade::new(vec![SosSection::new(
            [0.5, 0.2, 0.1],
            [1.0, -0.4, 0.05],
        )]);
        let grid = FrequencyGrid::log_spaced(1.0, 24000.0, 256);
        let r = evaluate(&cascade, &grid, 48000.0);

        assert_eq!(r.len(), 256);
        assert_eq!(r.complex.len(), 256);
        assert_eq!(r.magnitude.len(), 256);
        assert_eq!(r.magnitude_db.len(), 256);
        assert_eq!(r.phase_rad.len(), 256);
        assert_eq!(r.phase_deg.len(), 256);
        assert_eq!(r.phase_deg_masked.len(), 256);
        assert_eq!(r.phase_unwrapped_rad.len(), 256);
        assert_eq!(r.group_delay_ms.len(), 255);
        assert_eq!(r.phase_delay_ms.len(), 256);
    }

    #[test]
    fn test_identity_cascade_is_flat() {
        let grid = FrequencyGrid::log_spaced(1.0, 24000.0, 64);
        let r = evaluate(&SosCascade::identity(), &grid, 48000.0);
        for (db, phase) in r.magnitude_db.iter().zip(&r.phase_deg) {
            assert_abs_diff_eq!(*db, 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(*phase, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_coherent_sum_doubles_amplitude() {
        let cascade = SosCascade::new(vec![SosSection::new(
            [0.3, 0.1, 0.0],
            [1.0, -0.2, 0.0],
        )]);
        let grid = FrequencyGrid::log_spaced(1.0, 24000.0, 128);
        let r = evaluate(&cascade, &grid, 48000.0);
        let sum = FrequencyResponse::sum(&[&r, &r]);
        for (s, m) in sum.magnitude_db.iter().zip(&r.magnitude_db) {
            assert_abs_diff_eq!(s - m, 20.0 * 2.0_f64.log10(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_inverted_sum_cancels_exactly() {
        let cascade = SosCascade::new(vec![SosSection::new(
            [0.9, -0.3, 0.2],
            [1.0, -0.5, 0.1],
        )]);
        let mut flipped = cascade.clone();
        flipped.apply_phase_flip();

        let grid = FrequencyGrid::log_spaced(1.0, 24000.0, 128);
        let a = evaluate(&cascade, &grid, 48000.0);
        let b = evaluate(&flipped, &grid, 48000.0);
        let sum = FrequencyResponse::sum(&[&a, &b]);
        for db in &sum.magnitude_db {
            assert!(db.is_infinite() && db.is_sign_negative(), "got {}", db);
        }
    }

    #[test]
    #[should_panic(expected = "share one grid")]
    fn test_sum_rejects_mismatched_grids() {
        let cascade = SosCascade::identity();
        let a = evaluate(&cascade, &FrequencyGrid::log_spaced(1.0, 24000.0, 16), 48000.0);
        let b = evaluate(&cascade, &FrequencyGrid::log_spaced(1.0, 24000.0, 17), 48000.0);
        let _ = FrequencyResponse::sum(&[&a, &b]);
    }
}
