//! Classical filter approximations
//!
//! Standard analog-prototype designs digitized with the bilinear transform:
//!
//! - **Butterworth**: maximally flat passband, monotonic rolloff
//! - **Chebyshev Type I**: equiripple passband, steeper rolloff
//! - **Chebyshev Type II**: equiripple stopband, flat passband
//! - **Bessel**: maximally flat group delay
//!
//! The pipeline is the textbook one: place the prototype poles (and, for
//! Chebyshev II, zeros) in the s-plane, scale by the prewarped cutoff, then
//! map each conjugate pair to one digital second-order section and each
//! real pole to a first-order section.
//!
//! Prototypes are stored as upper-half-plane conjugate representatives plus
//! an optional real pole, so odd orders produce the expected single
//! first-order section instead of a spurious extra biquad.
//!
//! Elliptic designs are not derived here; requesting one reports a
//! [`FilterError::Design`] that the engine propagates unchanged.

use std::f64::consts::PI;

use crate::cascade::{SosCascade, SosSection};
use crate::spec::{Band, ClassicalFamily, FilterSpec};
use crate::types::{Complex, FilterError, FilterResult};

/// Analog prototype: conjugate-pair representatives (upper half-plane)
/// plus at most one real pole.
struct Prototype {
    pairs: Vec<Complex>,
    real: Option<f64>,
}

/// Design the section cascade for a classical family from a spec.
///
/// Cutoff is `spec.frequency_hz()`; Chebyshev II interprets
/// `frequency + transition_band` as the stopband edge.
pub fn classical_cascade(
    family: ClassicalFamily,
    band: Band,
    spec: &FilterSpec,
) -> FilterResult<SosCascade> {
    let order = spec.order() as usize;
    let fs = spec.sample_rate_hz();
    let cutoff = spec.frequency_hz();

    match family {
        ClassicalFamily::Butterworth => {
            let proto = butterworth_prototype(order);
            Ok(bilinear_cascade(&proto, prewarp(cutoff, fs), fs, band))
        }
        ClassicalFamily::Chebyshev1 => {
            let ripple = spec.passband_ripple_db();
            if ripple <= 0.0 {
                return Err(FilterError::Design(
                    "Chebyshev I requires a passband ripple above 0 dB".into(),
                ));
            }
            let proto = chebyshev1_prototype(order, ripple);
            Ok(bilinear_cascade(&proto, prewarp(cutoff, fs), fs, band))
        }
        ClassicalFamily::Chebyshev2 => {
            if band == Band::Highpass {
                return Err(FilterError::Design(
                    "Chebyshev II is only provided as a lowpass design".into(),
                ));
            }
            let atten = spec.stopband_atten_db();
            if atten <= 0.0 {
                return Err(FilterError::Design(
                    "Chebyshev II requires a stopband attenuation above 0 dB".into(),
                ));
            }
            let edge = cutoff + spec.transition_band_hz();
            if edge >= fs / 2.0 {
                return Err(FilterError::Design(format!(
                    "stopband edge {} Hz is at or beyond fs/2",
                    edge
                )));
            }
            Ok(chebyshev2_lowpass(order, atten, prewarp(edge, fs), fs))
        }
        ClassicalFamily::Bessel => {
            let proto = bessel_prototype(order);
            Ok(bilinear_cascade(&proto, prewarp(cutoff, fs), fs, band))
        }
        ClassicalFamily::Elliptic => Err(FilterError::Design(
            "elliptic design requires an external coefficient library".into(),
        )),
    }
}

/// Pre-warp an analog cutoff so the bilinear transform maps it exactly.
fn prewarp(freq_hz: f64, sample_rate_hz: f64) -> f64 {
    2.0 * sample_rate_hz * (PI * freq_hz / sample_rate_hz).tan()
}

/// Butterworth poles lie on the unit circle in the left half-plane.
fn butterworth_prototype(order: usize) -> Prototype {
    let mut pairs = Vec::with_capacity(order / 2);
    for k in 0..order / 2 {
        let theta = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
        pairs.push(Complex::new(theta.cos(), theta.sin()));
    }
    let real = (order % 2 == 1).then_some(-1.0);
    Prototype { pairs, real }
}

/// Chebyshev I poles sit on an ellipse controlled by the ripple factor.
fn chebyshev1_prototype(order: usize, ripple_db: f64) -> Prototype {
    let epsilon = (10.0_f64.powf(ripple_db / 10.0) - 1.0).sqrt();
    let a = (1.0 / epsilon).asinh() / order as f64;
    let (sinh_a, cosh_a) = (a.sinh(), a.cosh());

    let mut pairs = Vec::with_capacity(order / 2);
    let mut real = None;
    for k in 0..order {
        let m = 2 * k + 1;
        let theta = PI * m as f64 / (2 * order) as f64;
        if m == order {
            real = Some(-sinh_a);
        } else if m < order {
            pairs.push(Complex::new(-sinh_a * theta.sin(), cosh_a * theta.cos()));
        }
    }
    Prototype { pairs, real }
}

/// Tabulated Bessel prototype poles for orders 1-10; higher orders fall
/// back to the Butterworth placement.
fn bessel_prototype(order: usize) -> Prototype {
    const PAIRS: [&[(f64, f64)]; 10] = [
        &[],
        &[(-1.1030, 0.6368)],
        &[(-1.0509, 0.9991)],
        &[(-0.9953, 1.2571), (-1.3707, 0.4103)],
        &[(-0.9576, 1.4711), (-1.3806, 0.7179)],
        &[(-0.9307, 1.6618), (-1.3819, 0.9715), (-1.5714, 0.3213)],
        &[(-0.9104, 1.8364), (-1.3790, 1.1915), (-1.6130, 0.5896)],
        &[
            (-0.8955, 1.9983),
            (-1.3738, 1.3884),
            (-1.6370, 0.8224),
            (-1.7574, 0.2728),
        ],
        &[
            (-0.8843, 2.1509),
            (-1.3675, 1.5677),
            (-1.6523, 1.0313),
            (-1.8071, 0.5126),
        ],
        &[
            (-0.8758, 2.2962),
            (-1.3607, 1.7335),
            (-1.6618, 1.2211),
            (-1.8431, 0.7273),
            (-1.9302, 0.2413),
        ],
    ];
    const REALS: [Option<f64>; 10] = [
        Some(-1.0),
        None,
        Some(-1.3270),
        None,
        Some(-1.5025),
        None,
        Some(-1.6853),
        None,
        Some(-1.8566),
        None,
    ];

    if order == 0 || order > 10 {
        return butterworth_prototype(order);
    }
    Prototype {
        pairs: PAIRS[order - 1]
            .iter()
            .map(|&(re, im)| Complex::new(re, im))
            .collect(),
        real: REALS[order - 1],
    }
}

/// Map a prototype to digital sections via the bilinear transform.
///
/// Lowpass scales each pole by the prewarped cutoff; highpass applies the
/// lowpass-to-highpass transform `s -> wc/s` first, which for unit-circle
/// (Butterworth) prototypes reduces to the familiar mirrored placement.
fn bilinear_cascade(proto: &Prototype, wc: f64, sample_rate_hz: f64, band: Band) -> SosCascade {
    let k = 2.0 * sample_rate_hz;
    let mut sections = Vec::with_capacity(proto.pairs.len() + 1);

    for &p in &proto.pairs {
        let section = match band {
            Band::Lowpass => lowpass_pair_section(p * wc, k),
            Band::Highpass => highpass_pair_section(wc / p, k),
        };
        sections.push(section);
    }
    if let Some(r) = proto.real {
        let section = match band {
            Band::Lowpass => lowpass_real_section(r * wc, k),
            Band::Highpass => highpass_real_section(wc / r, k),
        };
        sections.push(section);
    }
    SosCascade::new(sections)
}

/// Conjugate pole pair, lowpass: `H(s) = |p|^2 / (s^2 - 2*re(p)*s + |p|^2)`.
fn lowpass_pair_section(p: Complex, k: f64) -> SosSection {
    let m = p.norm_sqr();
    let k2 = k * k;
    let d = k2 - 2.0 * k * p.re + m;
    SosSection::new(
        [m / d, 2.0 * m / d, m / d],
        [1.0, 2.0 * (m - k2) / d, (k2 + 2.0 * k * p.re + m) / d],
    )
}

/// Conjugate pole pair, highpass: `H(s) = s^2 / (s^2 - 2*re(q)*s + |q|^2)`.
fn highpass_pair_section(q: Complex, k: f64) -> SosSection {
    let m = q.norm_sqr();
    let k2 = k * k;
    let d = k2 - 2.0 * k * q.re + m;
    SosSection::new(
        [k2 / d, -2.0 * k2 / d, k2 / d],
        [1.0, 2.0 * (m - k2) / d, (k2 + 2.0 * k * q.re + m) / d],
    )
}

/// Real pole, lowpass: `H(s) = -p / (s - p)`, unity at DC.
fn lowpass_real_section(p: f64, k: f64) -> SosSection {
    let alpha = k - p;
    SosSection::new(
        [-p / alpha, -p / alpha, 0.0],
        [1.0, -(k + p) / alpha, 0.0],
    )
}

/// Real pole, highpass: `H(s) = s / (s - q)`, unity at infinity.
fn highpass_real_section(q: f64, k: f64) -> SosSection {
    let alpha = k - q;
    SosSection::new([k / alpha, -k / alpha, 0.0], [1.0, -(k + q) / alpha, 0.0])
}

/// Chebyshev II lowpass: inverted Chebyshev poles paired with
/// imaginary-axis zeros, each section normalized to unity at DC.
fn chebyshev2_lowpass(order: usize, stopband_db: f64, ws: f64, sample_rate_hz: f64) -> SosCascade {
    let epsilon = 1.0 / (10.0_f64.powf(stopband_db / 10.0) - 1.0).sqrt();
    let a = (1.0 / epsilon).asinh() / order as f64;
    let (sinh_a, cosh_a) = (a.sinh(), a.cosh());

    let k = 2.0 * sample_rate_hz;
    let k2 = k * k;
    let mut sections = Vec::with_capacity(order / 2 + 1);

    for i in 0..order {
        let m = 2 * i + 1;
        let theta = PI * m as f64 / (2 * order) as f64;
        if m == order {
            // Real pole has no matching finite zero.
            let p1 = -sinh_a;
            sections.push(lowpass_real_section(ws / p1, k));
        } else if m < order {
            let p1 = Complex::new(-sinh_a * theta.sin(), cosh_a * theta.cos());
            let p = ws / p1;
            let wz = ws / theta.cos();

            // H(s) = g*(s^2 + wz^2)/(s^2 - 2*re(p)*s + |p|^2), g = |p|^2/wz^2
            let pm = p.norm_sqr();
            let wz2 = wz * wz;
            let g = pm / wz2;
            let d = k2 - 2.0 * k * p.re + pm;
            sections.push(SosSection::new(
                [
                    g * (k2 + wz2) / d,
                    2.0 * g * (wz2 - k2) / d,
                    g * (k2 + wz2) / d,
                ],
                [1.0, 2.0 * (pm - k2) / d, (k2 + 2.0 * k * p.re + pm) / d],
            ));
        }
    }
    SosCascade::new(sections)
}
