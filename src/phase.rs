//! Phase wrapping, unwrapping, masking, and delay curves
//!
//! Phase comes out of `atan2` wrapped to `(-pi, pi]`; everything here is a
//! pure function from one slice to a fresh `Vec`. The canonical phase array
//! computed by a response evaluation is never mutated: masking returns a
//! copy with NaN holes, so toggling a display option cannot corrupt later
//! group-delay math.
//!
//! Conventions:
//!
//! - wrapped phase lives in `[-180, 180)` degrees / `[-pi, pi)` radians
//! - unwrapped phase removes every jump larger than half a turn
//! - group delay is the negative derivative of unwrapped phase versus
//!   angular frequency, reported in milliseconds
//! - phase delay is `-phi/w`, undefined (NaN) at non-positive frequencies

use std::f64::consts::PI;

/// Wrap a phase in degrees into `[-180, 180)`.
pub fn wrap_deg(phase_deg: f64) -> f64 {
    let mut w = (phase_deg + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can return the modulus itself for tiny negative inputs
    if w >= 180.0 {
        w -= 360.0;
    }
    w
}

/// Wrap a phase in radians into `[-pi, pi)`.
pub fn wrap_rad(phase_rad: f64) -> f64 {
    let mut w = (phase_rad + PI).rem_euclid(2.0 * PI) - PI;
    if w >= PI {
        w -= 2.0 * PI;
    }
    w
}

/// Unwrap a wrapped phase curve (radians) by removing 2*pi jumps.
///
/// Whenever consecutive samples differ by more than pi, a multiple of
/// 2*pi is added to the remainder of the curve so it continues smoothly.
pub fn unwrap_rad(phase_rad: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(phase_rad.len());
    let mut offset = 0.0;
    let mut prev = match phase_rad.first() {
        Some(&p) => p,
        None => return out,
    };
    out.push(prev);
    for &p in &phase_rad[1..] {
        let mut delta = p - prev;
        while delta > PI {
            delta -= 2.0 * PI;
            offset -= 2.0 * PI;
        }
        while delta < -PI {
            delta += 2.0 * PI;
            offset += 2.0 * PI;
        }
        out.push(p + offset);
        prev = p;
    }
    out
}

/// Copy a wrapped-degree phase curve, blanking wrap discontinuities
/// with NaN so a line plot does not draw vertical jumps.
///
/// Adjacent samples whose signs form the pattern (-1, +1) or (+1, -1)
/// mark a wrap; both samples of the pair become NaN in the returned
/// copy. The input slice is untouched.
pub fn mask_discontinuities(phase_deg: &[f64]) -> Vec<f64> {
    let mut out = phase_deg.to_vec();
    for i in 1..phase_deg.len() {
        let (a, b) = (sign_of(phase_deg[i - 1]), sign_of(phase_deg[i]));
        if a * b == -1 {
            out[i - 1] = f64::NAN;
            out[i] = f64::NAN;
        }
    }
    out
}

fn sign_of(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Group delay in milliseconds from an unwrapped phase curve (radians).
///
/// `tau_g = -d(phi)/d(w)`, approximated by forward differences; the result
/// has one fewer point than the input. Paired with `frequencies_hz`, plot
/// it against either endpoint of each interval.
pub fn group_delay_ms(frequencies_hz: &[f64], unwrapped_phase_rad: &[f64]) -> Vec<f64> {
    debug_assert_eq!(frequencies_hz.len(), unwrapped_phase_rad.len());
    let n = frequencies_hz.len().saturating_sub(1);
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let dw = 2.0 * PI * (frequencies_hz[i + 1] - frequencies_hz[i]);
        let dphi = unwrapped_phase_rad[i + 1] - unwrapped_phase_rad[i];
        out.push(-1000.0 * dphi / dw);
    }
    out
}

/// Phase delay in milliseconds, `tau_p = -phi/w`, from unwrapped phase.
///
/// Non-positive frequencies yield NaN rather than an infinity that would
/// dominate a plot's autoscale.
pub fn phase_delay_ms(frequencies_hz: &[f64], unwrapped_phase_rad: &[f64]) -> Vec<f64> {
    debug_assert_eq!(frequencies_hz.len(), unwrapped_phase_rad.len());
    frequencies_hz
        .iter()
        .zip(unwrapped_phase_rad)
        .map(|(&f, &phi)| {
            if f > 0.0 {
                -1000.0 * phi / (2.0 * PI * f)
            } else {
                f64::NAN
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_wrap_deg_range() {
        assert_abs_diff_eq!(wrap_deg(190.0), -170.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_deg(-190.0), 170.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_deg(360.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_deg(180.0), -180.0, epsilon = 1e-12);
        for p in [-725.0, -180.0, -0.001, 0.0, 45.0, 179.9, 1234.5] {
            let w = wrap_deg(p);
            assert!((-180.0..180.0).contains(&w), "wrap_deg({}) = {}", p, w);
        }
    }

    #[test]
    fn test_wrap_is_idempotent() {
        for p in [-500.0, -179.0, 0.0, 90.0, 400.0] {
            let once = wrap_deg(p);
            assert_abs_diff_eq!(wrap_deg(once), once, epsilon = 1e-9);
        }
        for p in [-7.0, -1.0, 0.5, 3.0, 9.42] {
            let once = wrap_rad(p);
            assert_abs_diff_eq!(wrap_rad(once), once, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_unwrap_linear_ramp() {
        // A -0.1 rad/sample ramp wrapped, then unwrapped, must match.
        let true_phase: Vec<f64> = (0..200).map(|i| -0.1 * i as f64).collect();
        let wrapped: Vec<f64> = true_phase.iter().map(|&p| wrap_rad(p)).collect();
        let unwrapped = unwrap_rad(&wrapped);
        for (u, t) in unwrapped.iter().zip(&true_phase) {
            assert_abs_diff_eq!(u, t, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_unwrap_empty_and_single() {
        assert!(unwrap_rad(&[]).is_empty());
        assert_eq!(unwrap_rad(&[1.5]), vec![1.5]);
    }

    #[test]
    fn test_mask_blanks_both_sides_of_a_wrap() {
        let phase = [170.0, 179.0, -179.0, -170.0, -10.0, 0.0, 15.0];
        let masked = mask_discontinuities(&phase);
        assert!(masked[1].is_nan());
        assert!(masked[2].is_nan());
        assert_eq!(masked[0], 170.0);
        assert_eq!(masked[3], -170.0);
        // A crossing through exactly zero is not a (-1, +1) pair
        assert_eq!(masked[5], 0.0);
        assert_eq!(masked[6], 15.0);
        // Input untouched
        assert_eq!(phase[2], -179.0);
    }

    #[test]
    fn test_group_delay_of_linear_phase() {
        // phi = -w * tau with tau = 1 ms
        let tau_s = 0.001;
        let freqs: Vec<f64> = (1..100).map(|i| i as f64 * 10.0).collect();
        let phase: Vec<f64> = freqs.iter().map(|&f| -2.0 * PI * f * tau_s).collect();
        let gd = group_delay_ms(&freqs, &phase);
        assert_eq!(gd.len(), freqs.len() - 1);
        for g in gd {
            assert_abs_diff_eq!(g, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_phase_delay_of_linear_phase() {
        let tau_s = 0.002;
        let freqs = [0.0, 100.0, 1000.0];
        let phase: Vec<f64> = freqs.iter().map(|&f| -2.0 * PI * f * tau_s).collect();
        let pd = phase_delay_ms(&freqs, &phase);
        assert!(pd[0].is_nan());
        assert_abs_diff_eq!(pd[1], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pd[2], 2.0, epsilon = 1e-9);
    }
}
