//! Pole and zero extraction from section cascades
//!
//! Each second-order section contributes up to two zeros (roots of `b(z)`)
//! and up to two poles (roots of `a(z)`), found per-section so that no
//! high-order polynomial is ever expanded. Viewed in positive powers of z,
//! `H(z) = (b0*z^2 + b1*z + b2) / (a0*z^2 + a1*z + a2)`; a section whose
//! polynomials share a factor of z (a first-order section, or the identity)
//! has that common origin pair cancelled so the plot shows only structural
//! roots. A pure delay keeps its pole at the origin.
//!
//! The overall scalar gain accumulates the ratio of leading coefficients,
//! keeping `H(z) = gain * prod(z - z_k) / prod(z - p_k)` consistent with
//! the cascade it came from.

use serde::{Deserialize, Serialize};

use crate::cascade::SosCascade;
use crate::types::Complex;

/// Coefficients this small are treated as structurally zero when deciding
/// a polynomial's degree.
const DEGREE_EPS: f64 = 1e-12;

/// Zeros, poles, and scalar gain of a cascade in the z-plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoleZeroSet {
    pub zeros: Vec<Complex>,
    pub poles: Vec<Complex>,
    pub gain: f64,
}

impl PoleZeroSet {
    /// An empty set with unity gain, used for sums and other responses
    /// that have no single rational transfer function on record.
    pub fn empty() -> Self {
        Self {
            zeros: Vec::new(),
            poles: Vec::new(),
            gain: 1.0,
        }
    }

    /// Extract roots section by section.
    pub fn from_cascade(cascade: &SosCascade) -> Self {
        let mut zeros = Vec::new();
        let mut poles = Vec::new();
        let mut gain = 1.0;

        for section in cascade.sections() {
            let (b_lead, mut z) = polynomial_roots(&section.b);
            let (a_lead, mut p) = polynomial_roots(&section.a);
            cancel_origin_pairs(&mut z, &mut p);
            zeros.append(&mut z);
            poles.append(&mut p);
            gain *= b_lead / a_lead;
        }
        Self { zeros, poles, gain }
    }

    /// True when every pole lies strictly inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.poles.iter().all(|p| p.norm_sqr() < 1.0)
    }
}

/// Remove matched zero/pole pairs at the origin, one pair at a time.
/// These come from the z^2 common factor of sections whose true order is
/// below two and carry no information about the response.
fn cancel_origin_pairs(zeros: &mut Vec<Complex>, poles: &mut Vec<Complex>) {
    loop {
        let zi = zeros.iter().position(|z| z.norm_sqr() < DEGREE_EPS);
        let pi = poles.iter().position(|p| p.norm_sqr() < DEGREE_EPS);
        match (zi, pi) {
            (Some(zi), Some(pi)) => {
                zeros.swap_remove(zi);
                poles.swap_remove(pi);
            }
            _ => return,
        }
    }
}

/// Roots of `c[0] + c[1]*z^-1 + c[2]*z^-2` in the z-plane, plus the
/// leading coefficient after degree reduction.
///
/// Leading near-zero coefficients are trimmed first; trailing zeros
/// surface as roots at the origin, to be cancelled against the other
/// polynomial of the same section.
fn polynomial_roots(c: &[f64; 3]) -> (f64, Vec<Complex>) {
    if c[0].abs() > DEGREE_EPS {
        (c[0], quadratic_roots(c[0], c[1], c[2]))
    } else if c[1].abs() > DEGREE_EPS {
        // z^-1 * (c1 + c2*z^-1): one finite root
        (c[1], vec![Complex::new(-c[2] / c[1], 0.0)])
    } else {
        // Constant; contributes no roots
        (if c[2].abs() > DEGREE_EPS { c[2] } else { 1.0 }, Vec::new())
    }
}

fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<Complex> {
    let disc = b * b - 4.0 * a * c;
    if disc >= 0.0 {
        let sq = disc.sqrt();
        vec![
            Complex::new((-b + sq) / (2.0 * a), 0.0),
            Complex::new((-b - sq) / (2.0 * a), 0.0),
        ]
    } else {
        let sq = (-disc).sqrt();
        let re = -b / (2.0 * a);
        let im = sq / (2.0 * a);
        vec![Complex::new(re, im), Complex::new(re, -im)]
    }
}
