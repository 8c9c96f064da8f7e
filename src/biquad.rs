//! Cookbook biquad coefficient derivation
//!
//! Closed-form section derivation for the biquad filter kinds, following
//! the Audio EQ Cookbook formulas. All kinds share the intermediate
//! quantities
//!
//! ```text
//! w0    = 2*pi*f0/fs
//! alpha = sin(w0) / (2*Q)
//! A     = 10^(gain_db/40)        (peak and shelves only)
//! ```
//!
//! The allpass kind supports arbitrary order through order-folding: a
//! first-order base section derived from `tan(pi*f0/fs)` and a
//! second-order alpha-based base section are combined so that the folded
//! cascade has exactly the requested order. Peak and shelf kinds bake the
//! requested gain into their coefficients; the engine skips the separate
//! gain stage for them.
//!
//! [`design_cascade`] is the single dispatch point from a
//! [`FilterSpec`] to a [`SosCascade`]; classical kinds are routed to the
//! [`design`](crate::design) module.

use crate::cascade::{SosCascade, SosSection};
use crate::design;
use crate::spec::{BiquadKind, FilterKind, FilterSpec};
use crate::types::FilterResult;

/// Derive the section cascade for a spec, dispatching on its kind.
///
/// Deterministic: identical specs produce bit-identical coefficients.
pub fn design_cascade(spec: &FilterSpec) -> FilterResult<SosCascade> {
    match spec.kind() {
        FilterKind::Biquad(kind) => Ok(biquad_cascade(kind, spec)),
        FilterKind::Classical { family, band } => design::classical_cascade(family, band, spec),
    }
}

fn biquad_cascade(kind: BiquadKind, spec: &FilterSpec) -> SosCascade {
    let w0 = spec.w0();
    let alpha = w0.sin() / (2.0 * spec.q());

    match kind {
        BiquadKind::Lowpass => SosCascade::new(vec![lowpass_section(w0, alpha)]),
        BiquadKind::Highpass => SosCascade::new(vec![highpass_section(w0, alpha)]),
        BiquadKind::Allpass => allpass_cascade(
            spec.order(),
            spec.frequency_hz(),
            spec.sample_rate_hz(),
            w0,
            alpha,
        ),
        BiquadKind::Peak => {
            let a_mid = 10.0_f64.powf(spec.gain_db() / 40.0);
            SosCascade::new(vec![peak_section(w0, alpha, a_mid)])
        }
        BiquadKind::LowShelf => {
            let a_mid = 10.0_f64.powf(spec.gain_db() / 40.0);
            SosCascade::new(vec![low_shelf_section(w0, alpha, a_mid)])
        }
        BiquadKind::HighShelf => {
            let a_mid = 10.0_f64.powf(spec.gain_db() / 40.0);
            SosCascade::new(vec![high_shelf_section(w0, alpha, a_mid)])
        }
    }
}

fn lowpass_section(w0: f64, alpha: f64) -> SosSection {
    let cos_w0 = w0.cos();
    SosSection::new(
        [(1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0],
        [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
    )
}

fn highpass_section(w0: f64, alpha: f64) -> SosSection {
    let cos_w0 = w0.cos();
    SosSection::new(
        [(1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0],
        [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
    )
}

/// First-order allpass base. The break frequency (90 degrees of phase lag)
/// sits at `f0`.
fn allpass_first_order(frequency_hz: f64, sample_rate_hz: f64) -> SosSection {
    let t = (std::f64::consts::PI * frequency_hz / sample_rate_hz).tan();
    let c = (t - 1.0) / (t + 1.0);
    SosSection::new([c, 1.0, 0.0], [1.0, c, 0.0])
}

/// Second-order allpass base: numerator is the mirrored denominator, so the
/// magnitude is exactly unity at every frequency.
fn allpass_second_order(w0: f64, alpha: f64) -> SosSection {
    let cos_w0 = w0.cos();
    SosSection::new(
        [1.0 - alpha, -2.0 * cos_w0, 1.0 + alpha],
        [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
    )
}

/// Fold the allpass bases into a cascade of exactly `order` total order.
///
/// - order 1 or 2: the matching base section alone
/// - odd order N >= 3: first-order base + (N-1)/2 second-order sections
/// - even order N >= 4: second-order base + (N-2)/2 more second-order
///   sections
fn allpass_cascade(
    order: u32,
    frequency_hz: f64,
    sample_rate_hz: f64,
    w0: f64,
    alpha: f64,
) -> SosCascade {
    debug_assert!(order >= 1, "order is clamped to >= 1 by FilterSpec");

    let first = allpass_first_order(frequency_hz, sample_rate_hz);
    let second = allpass_second_order(w0, alpha);

    match order {
        1 => SosCascade::new(vec![first]),
        2 => SosCascade::new(vec![second]),
        n if n % 2 == 1 => {
            let mut cascade = SosCascade::new(vec![first]);
            for _ in 0..(n - 1) / 2 {
                cascade.push(second);
            }
            cascade
        }
        n => {
            let mut cascade = SosCascade::new(vec![second]);
            for _ in 0..(n - 2) / 2 {
                cascade.push(second);
            }
            cascade
        }
    }
}

fn peak_section(w0: f64, alpha: f64, a_mid: f64) -> SosSection {
    let cos_w0 = w0.cos();
    SosSection::new(
        [
            1.0 + alpha * a_mid,
            -2.0 * cos_w0,
            1.0 - alpha * a_mid,
        ],
        [
            1.0 + alpha / a_mid,
            -2.0 * cos_w0,
            1.0 - alpha / a_mid,
        ],
    )
}

fn low_shelf_section(w0: f64, alpha: f64, a_mid: f64) -> SosSection {
    let cos_w0 = w0.cos();
    let sqrt_a = a_mid.sqrt();
    SosSection::new(
        [
            a_mid * (a_mid + 1.0 - (a_mid - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha),
            2.0 * a_mid * (a_mid - 1.0 - (a_mid + 1.0) * cos_w0),
            a_mid * (a_mid + 1.0 - (a_mid - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha),
        ],
        [
            a_mid + 1.0 + (a_mid - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha,
            -2.0 * (a_mid - 1.0 + (a_mid + 1.0) * cos_w0),
            a_mid + 1.0 + (a_mid - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha,
        ],
    )
}

fn high_shelf_section(w0: f64, alpha: f64, a_mid: f64) -> SosSection {
    let cos_w0 = w0.cos();
    let sqrt_a = a_mid.sqrt();
    SosSection::new(
        [
            a_mid * (a_mid + 1.0 + (a_mid - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha),
            -2.0 * a_mid * (a_mid - 1.0 + (a_mid + 1.0) * cos_w0),
            a_mid * (a_mid + 1.0 + (a_mid - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha),
        ],
        [
            a_mid + 1.0 - (a_mid - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha,
            2.0 * (a_mid - 1.0 - (a_mid + 1.0) * cos_w0),
            a_mid + 1.0 - (a_mid - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha,
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::FilterKind;
    use crate::types::linear_to_db;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn spec_with(kind: FilterKind) -> FilterSpec {
        FilterSpec::new(kind)
    }

    #[test]
    fn test_highpass_minus_three_db_at_f0() {
        // f0 = 1 kHz, Q = 0.71, fs = 48 kHz: |H(f0)| = Q, about -3 dB
        let spec = spec_with(FilterKind::Biquad(BiquadKind::Highpass));
        let cascade = design_cascade(&spec).unwrap();
        let mag_db = linear_to_db(cascade.response_at(1000.0, 48000.0).norm());
        assert_abs_diff_eq!(mag_db, -3.01, epsilon = 0.1);
    }

    #[test]
    fn test_highpass_flat_toward_nyquist() {
        let spec = spec_with(FilterKind::Biquad(BiquadKind::Highpass));
        let cascade = design_cascade(&spec).unwrap();
        let mag_db = linear_to_db(cascade.response_at(23900.0, 48000.0).norm());
        assert!(mag_db.abs() < 0.05, "expected ~0 dB near fs/2, got {}", mag_db);
    }

    #[test]
    fn test_lowpass_unity_at_dc() {
        let spec = spec_with(FilterKind::Biquad(BiquadKind::Lowpass));
        let cascade = design_cascade(&spec).unwrap();
        let mag = cascade.response_at(1.0, 48000.0).norm();
        assert_relative_eq!(mag, 1.0, max_relative = 1e-4);
    }

    #[test]
    fn test_allpass_unity_magnitude_all_orders() {
        for order in 1..=10 {
            for q in [0.3, 0.71, 4.0] {
                let mut spec = spec_with(FilterKind::Biquad(BiquadKind::Allpass));
                spec.set_order(order).unwrap();
                spec.set_q(q).unwrap();
                let cascade = design_cascade(&spec).unwrap();
                for f in [20.0, 500.0, 1000.0, 8000.0, 20000.0] {
                    let mag = cascade.response_at(f, 48000.0).norm();
                    assert_relative_eq!(mag, 1.0, max_relative = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_allpass_folded_section_counts() {
        let mut spec = spec_with(FilterKind::Biquad(BiquadKind::Allpass));

        spec.set_order(1).unwrap();
        assert_eq!(design_cascade(&spec).unwrap().len(), 1);
        spec.set_order(2).unwrap();
        assert_eq!(design_cascade(&spec).unwrap().len(), 1);
        // order 7 = first-order base + 3 second-order sections
        spec.set_order(7).unwrap();
        assert_eq!(design_cascade(&spec).unwrap().len(), 4);
        // order 8 = 4 second-order sections
        spec.set_order(8).unwrap();
        assert_eq!(design_cascade(&spec).unwrap().len(), 4);
    }

    #[test]
    fn test_first_order_allpass_quadrature_at_f0() {
        let mut spec = spec_with(FilterKind::Biquad(BiquadKind::Allpass));
        spec.set_order(1).unwrap();
        let cascade = design_cascade(&spec).unwrap();
        let h = cascade.response_at(1000.0, 48000.0);
        let phase_deg = h.im.atan2(h.re).to_degrees();
        assert_abs_diff_eq!(phase_deg, -90.0, epsilon = 1e-6);
    }

    #[test]
    fn test_peak_gain_at_center() {
        let mut spec = spec_with(FilterKind::Biquad(BiquadKind::Peak));
        spec.set_gain_db(6.0).unwrap();
        let cascade = design_cascade(&spec).unwrap();
        let mag_db = linear_to_db(cascade.response_at(1000.0, 48000.0).norm());
        assert_abs_diff_eq!(mag_db, 6.0, epsilon = 1e-6);
    }

    #[test]
    fn test_shelves_reach_full_gain() {
        let mut spec = spec_with(FilterKind::Biquad(BiquadKind::LowShelf));
        spec.set_gain_db(-9.0).unwrap();
        let cascade = design_cascade(&spec).unwrap();
        // well below the corner the low shelf applies its full gain
        let mag_db = linear_to_db(cascade.response_at(5.0, 48000.0).norm());
        assert_abs_diff_eq!(mag_db, -9.0, epsilon = 0.05);

        let mut spec = spec_with(FilterKind::Biquad(BiquadKind::HighShelf));
        spec.set_gain_db(4.5).unwrap();
        let cascade = design_cascade(&spec).unwrap();
        let mag_db = linear_to_db(cascade.response_at(23000.0, 48000.0).norm());
        assert_abs_diff_eq!(mag_db, 4.5, epsilon = 0.05);
    }

    #[test]
    fn test_design_is_deterministic() {
        let mut spec = spec_with(FilterKind::Biquad(BiquadKind::Allpass));
        spec.set_order(5).unwrap();
        spec.set_q(1.3).unwrap();
        let a = design_cascade(&spec).unwrap();
        let b = design_cascade(&spec).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_biquad_kinds_are_stable() {
        for kind in [
            BiquadKind::Highpass,
            BiquadKind::Lowpass,
            BiquadKind::Allpass,
            BiquadKind::Peak,
            BiquadKind::LowShelf,
            BiquadKind::HighShelf,
        ] {
            let mut spec = spec_with(FilterKind::Biquad(kind));
            spec.set_gain_db(7.0).unwrap();
            let cascade = design_cascade(&spec).unwrap();
            assert!(cascade.is_stable(), "{:?} produced an unstable cascade", kind);
        }
    }
}
