//! Core types for filter design and response analysis
//!
//! This module defines the fundamental types shared across the crate:
//! the complex-number alias used for frequency responses and pole/zero
//! locations, the central error type, and decibel conversion helpers.
//!
//! ## Decibel conventions
//!
//! Two conversions appear throughout filter design and are easy to mix up:
//!
//! - **Amplitude** (gain stages, magnitude response): `lin = 10^(dB/20)`
//! - **Shelf/peak midpoint**: the cookbook formulas use `A = 10^(dB/40)`
//!   so that the shelf midpoint lands at half the requested gain
//!
//! Only the amplitude pair lives here; the `A` form is internal to the
//! cookbook derivations.

use num_complex::Complex64;

/// Type alias for complex numbers using f64 precision.
pub type Complex = Complex64;

/// Result type for filter design and analysis operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while configuring or designing a filter.
///
/// `Validation` is deliberately non-fatal: the offending field has already
/// been clamped to a documented default when the error is returned, so a
/// subsequent `compute()` always produces a plottable result. Whether to
/// surface the message to the user is the caller's decision.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    /// A parameter was outside its legal domain and has been reset to its
    /// documented default.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable description of the violated constraint.
        message: String,
    },

    /// A filter-kind name supplied by the caller was not recognized.
    /// The previous kind (and any cascade derived from it) is left untouched.
    #[error("unknown filter kind: {0:?}")]
    UnknownKind(String),

    /// The classical coefficient routine rejected the parameter combination.
    #[error("filter design failed: {0}")]
    Design(String),
}

/// Convert a gain in dB to a linear amplitude factor.
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert a linear amplitude to dB. Zero maps to `-inf`.
#[inline]
pub fn linear_to_db(lin: f64) -> f64 {
    20.0 * lin.log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_roundtrip() {
        for db in [-60.0, -6.0, 0.0, 3.0, 20.0] {
            assert!((linear_to_db(db_to_linear(db)) - db).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_amplitude_is_minus_infinity() {
        assert!(linear_to_db(0.0).is_infinite());
        assert!(linear_to_db(0.0).is_sign_negative());
    }

    #[test]
    fn test_validation_error_message() {
        let err = FilterError::Validation {
            field: "q",
            message: "Q must be a positive value".into(),
        };
        assert!(format!("{}", err).contains("invalid q"));
    }
}
