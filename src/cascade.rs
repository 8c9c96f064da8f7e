//! Second-order sections and series cascades
//!
//! A composite filter is represented as an ordered list of second-order
//! sections (SOS). The transfer function of the cascade is the product of
//! each section's `b(z)/a(z)`:
//!
//! ```text
//!          b0 + b1*z^-1 + b2*z^-2
//! H_k(z) = ----------------------      H(z) = H_0(z) * H_1(z) * ...
//!          a0 + a1*z^-1 + a2*z^-2
//! ```
//!
//! Cascading second-order sections instead of expanding one high-order
//! polynomial keeps the coefficients numerically well conditioned.
//!
//! Gain and phase inversion act on the first section's numerator; integer
//! delay appends trivial one-sample-delay sections. Engines never re-apply
//! these adjustments to an already adjusted cascade — they rebuild from the
//! [`FilterSpec`](crate::spec::FilterSpec) on every compute.

use std::f64::consts::PI;

use crate::types::{db_to_linear, Complex};

/// A single biquadratic filter section with explicit `a0`.
///
/// `a0` is kept rather than normalized away so that cookbook coefficients
/// can be stored exactly as derived; evaluation divides by the full
/// denominator polynomial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SosSection {
    /// Numerator coefficients `[b0, b1, b2]`.
    pub b: [f64; 3],
    /// Denominator coefficients `[a0, a1, a2]`.
    pub a: [f64; 3],
}

impl SosSection {
    pub fn new(b: [f64; 3], a: [f64; 3]) -> Self {
        Self { b, a }
    }

    /// Pass-through section, `H(z) = 1`.
    pub fn identity() -> Self {
        Self::new([1.0, 0.0, 0.0], [1.0, 0.0, 0.0])
    }

    /// One-sample delay section, `H(z) = z^-1`.
    pub fn unit_delay() -> Self {
        Self::new([0.0, 1.0, 0.0], [1.0, 0.0, 0.0])
    }

    /// Evaluate this section's transfer function at `z = e^{j*2*pi*f/fs}`.
    pub fn response_at(&self, freq_hz: f64, sample_rate_hz: f64) -> Complex {
        let omega = 2.0 * PI * freq_hz / sample_rate_hz;
        let z_inv = Complex::new(omega.cos(), -omega.sin());
        let z_inv2 = z_inv * z_inv;

        let num = self.b[0] + self.b[1] * z_inv + self.b[2] * z_inv2;
        let den = self.a[0] + self.a[1] * z_inv + self.a[2] * z_inv2;
        num / den
    }

    /// Check that both poles lie inside the unit circle.
    ///
    /// With the denominator normalized to `1 + a1*z^-1 + a2*z^-2`,
    /// stability requires `|a2| < 1` and `|a1| < 1 + a2`.
    pub fn is_stable(&self) -> bool {
        let a1 = self.a[1] / self.a[0];
        let a2 = self.a[2] / self.a[0];
        a2.abs() < 1.0 && a1.abs() < 1.0 + a2
    }
}

/// An ordered product of second-order sections modelling a series
/// connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SosCascade {
    sections: Vec<SosSection>,
}

impl SosCascade {
    pub fn new(sections: Vec<SosSection>) -> Self {
        Self { sections }
    }

    /// Single pass-through section.
    pub fn identity() -> Self {
        Self::new(vec![SosSection::identity()])
    }

    pub fn sections(&self) -> &[SosSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn push(&mut self, section: SosSection) {
        self.sections.push(section);
    }

    /// Series connection: the result's transfer function is
    /// `self * other`. Associative section-for-section.
    pub fn concatenate(&self, other: &SosCascade) -> SosCascade {
        let mut sections = Vec::with_capacity(self.len() + other.len());
        sections.extend_from_slice(&self.sections);
        sections.extend_from_slice(&other.sections);
        SosCascade::new(sections)
    }

    /// Scale the first section's numerator by `10^(gain_db/20)`.
    ///
    /// Kinds whose coefficients already bake the gain in (peak, shelves)
    /// must not pass through here; the engine checks
    /// [`FilterKind::has_baked_gain`](crate::spec::FilterKind::has_baked_gain).
    pub fn apply_gain(&mut self, gain_db: f64) {
        let gain = db_to_linear(gain_db);
        if let Some(first) = self.sections.first_mut() {
            for b in &mut first.b {
                *b *= gain;
            }
        }
    }

    /// Negate the first section's numerator, inverting the output polarity.
    /// An involution: two flips restore the original response.
    pub fn apply_phase_flip(&mut self) {
        if let Some(first) = self.sections.first_mut() {
            for b in &mut first.b {
                *b = -*b;
            }
        }
    }

    /// Append `n` one-sample-delay sections. `n = 0` is a no-op.
    pub fn apply_delay(&mut self, n: usize) {
        for _ in 0..n {
            self.sections.push(SosSection::unit_delay());
        }
    }

    /// Evaluate the cascade's transfer function at one frequency.
    ///
    /// Frequencies at or above fs/2 are evaluated as-is (aliased); whether
    /// to shade or clip them is a rendering concern.
    pub fn response_at(&self, freq_hz: f64, sample_rate_hz: f64) -> Complex {
        self.sections
            .iter()
            .fold(Complex::new(1.0, 0.0), |acc, section| {
                acc * section.response_at(freq_hz, sample_rate_hz)
            })
    }

    /// True when every section is stable.
    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(|s| s.is_stable())
    }
}
