//! Filter specification and parameter validation
//!
//! [`FilterSpec`] is the single source of truth for one composite filter:
//! every `compute()` rebuilds the section cascade from the spec rather than
//! patching a previously derived cascade, which removes any ambiguity about
//! gain or phase adjustments being applied twice.
//!
//! Setters follow a clamp-and-report contract: a value outside its legal
//! domain is replaced by a documented default **and** the setter returns a
//! [`FilterError::Validation`]. The engine keeps working with the clamped
//! value, so the caller can always plot something while deciding whether to
//! surface the message.
//!
//! | field | domain | default on invalid |
//! |---|---|---|
//! | `order` | > 0 | 1 |
//! | `frequency_hz` | 0 < f < fs/2 | 1000.0 |
//! | `gain_db` | finite | 0.0 |
//! | `q` | > 0 | 0.71 |
//! | `passband_ripple_db` | ≥ 0 | 1.0 |
//! | `stopband_atten_db` | ≥ 0 | 40.0 |
//! | `transition_band_hz` | ≥ 0 | 0.0 |
//! | `sample_rate_hz` | > 0 | 48000.0 |

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::{FilterError, FilterResult};

/// Default characteristic frequency in Hz.
pub const DEFAULT_FREQUENCY_HZ: f64 = 1000.0;
/// Default quality factor.
pub const DEFAULT_Q: f64 = 0.71;
/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 48000.0;
/// Default passband ripple for Chebyshev I designs, in dB.
pub const DEFAULT_PASSBAND_RIPPLE_DB: f64 = 1.0;
/// Default stopband attenuation for Chebyshev II designs, in dB.
pub const DEFAULT_STOPBAND_ATTEN_DB: f64 = 40.0;

/// Cookbook biquad families derived in closed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiquadKind {
    /// Second-order highpass section.
    Highpass,
    /// Second-order lowpass section.
    Lowpass,
    /// Allpass of arbitrary order (first/second-order bases, folded).
    Allpass,
    /// Peaking EQ; gain is baked into the coefficients.
    Peak,
    /// Low shelf; gain is baked into the coefficients.
    LowShelf,
    /// High shelf; gain is baked into the coefficients.
    HighShelf,
}

/// Classical analog-prototype approximations realized via the bilinear
/// transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassicalFamily {
    /// Maximally flat passband.
    Butterworth,
    /// Equiripple passband (uses `passband_ripple_db`).
    Chebyshev1,
    /// Equiripple stopband (uses `stopband_atten_db` and
    /// `transition_band_hz`).
    Chebyshev2,
    /// Maximally flat group delay.
    Bessel,
    /// Equiripple in both bands; requires an external coefficient library
    /// and is reported as a design error by this crate.
    Elliptic,
}

/// Band sense for a classical design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Lowpass,
    Highpass,
}

/// Closed set of filter kinds, each dispatching to its own coefficient
/// derivation. Invalid kind/parameter pairs are rejected at design time,
/// not silently accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterKind {
    /// Closed-form cookbook section(s).
    Biquad(BiquadKind),
    /// Analog prototype + bilinear transform.
    Classical {
        family: ClassicalFamily,
        band: Band,
    },
}

impl FilterKind {
    /// True for kinds whose coefficients already include the requested gain,
    /// so the engine must not apply a separate gain stage.
    pub fn has_baked_gain(&self) -> bool {
        matches!(
            self,
            FilterKind::Biquad(BiquadKind::Peak)
                | FilterKind::Biquad(BiquadKind::LowShelf)
                | FilterKind::Biquad(BiquadKind::HighShelf)
        )
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FilterKind::Biquad(BiquadKind::Highpass) => "highpass",
            FilterKind::Biquad(BiquadKind::Lowpass) => "lowpass",
            FilterKind::Biquad(BiquadKind::Allpass) => "allpass",
            FilterKind::Biquad(BiquadKind::Peak) => "peak",
            FilterKind::Biquad(BiquadKind::LowShelf) => "lowshelf",
            FilterKind::Biquad(BiquadKind::HighShelf) => "highshelf",
            FilterKind::Classical { family, band } => {
                let family = match family {
                    ClassicalFamily::Butterworth => "butterworth",
                    ClassicalFamily::Chebyshev1 => "chebyshev1",
                    ClassicalFamily::Chebyshev2 => "chebyshev2",
                    ClassicalFamily::Bessel => "bessel",
                    ClassicalFamily::Elliptic => "elliptic",
                };
                let band = match band {
                    Band::Lowpass => "lowpass",
                    Band::Highpass => "highpass",
                };
                return write!(f, "{}-{}", family, band);
            }
        };
        write!(f, "{}", name)
    }
}

impl FromStr for FilterKind {
    type Err = FilterError;

    fn from_str(s: &str) -> FilterResult<Self> {
        let lower = s.trim().to_lowercase();
        if let Some((family, band)) = lower.split_once('-') {
            let family = match family {
                "butterworth" => ClassicalFamily::Butterworth,
                "chebyshev1" => ClassicalFamily::Chebyshev1,
                "chebyshev2" => ClassicalFamily::Chebyshev2,
                "bessel" => ClassicalFamily::Bessel,
                "elliptic" => ClassicalFamily::Elliptic,
                _ => return Err(FilterError::UnknownKind(s.to_string())),
            };
            let band = match band {
                "lowpass" => Band::Lowpass,
                "highpass" => Band::Highpass,
                _ => return Err(FilterError::UnknownKind(s.to_string())),
            };
            return Ok(FilterKind::Classical { family, band });
        }
        match lower.as_str() {
            "highpass" => Ok(FilterKind::Biquad(BiquadKind::Highpass)),
            "lowpass" => Ok(FilterKind::Biquad(BiquadKind::Lowpass)),
            "allpass" => Ok(FilterKind::Biquad(BiquadKind::Allpass)),
            "peak" => Ok(FilterKind::Biquad(BiquadKind::Peak)),
            "lowshelf" => Ok(FilterKind::Biquad(BiquadKind::LowShelf)),
            "highshelf" => Ok(FilterKind::Biquad(BiquadKind::HighShelf)),
            _ => Err(FilterError::UnknownKind(s.to_string())),
        }
    }
}

/// Parameters describing one composite filter.
///
/// Fields are private; use the clamp-and-report setters. Identical specs
/// always produce bit-identical f64 coefficients: the derivations are pure
/// arithmetic with no randomness or global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    kind: FilterKind,
    order: u32,
    frequency_hz: f64,
    gain_db: f64,
    q: f64,
    passband_ripple_db: f64,
    stopband_atten_db: f64,
    transition_band_hz: f64,
    sample_rate_hz: f64,
    phase_flip: bool,
    delay_samples: usize,
}

impl Default for FilterSpec {
    /// Order-2 highpass biquad at 1 kHz, Q = 0.71, 48 kHz sample rate.
    fn default() -> Self {
        Self {
            kind: FilterKind::Biquad(BiquadKind::Highpass),
            order: 2,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            gain_db: 0.0,
            q: DEFAULT_Q,
            passband_ripple_db: DEFAULT_PASSBAND_RIPPLE_DB,
            stopband_atten_db: DEFAULT_STOPBAND_ATTEN_DB,
            transition_band_hz: 0.0,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            phase_flip: false,
            delay_samples: 0,
        }
    }
}

impl FilterSpec {
    /// Create a spec of the given kind with all other parameters at their
    /// defaults.
    pub fn new(kind: FilterKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Set the filter kind directly. The enum is closed, so no validation
    /// applies.
    pub fn set_kind(&mut self, kind: FilterKind) {
        self.kind = kind;
    }

    /// Set the filter kind from a UI-facing name such as `"highpass"` or
    /// `"butterworth-lowpass"`. An unrecognized name leaves the current
    /// kind untouched.
    pub fn set_kind_str(&mut self, name: &str) -> FilterResult<()> {
        self.kind = name.parse()?;
        Ok(())
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    /// Set the filter order. Zero is clamped to 1.
    pub fn set_order(&mut self, order: u32) -> FilterResult<()> {
        if order == 0 {
            self.order = 1;
            tracing::warn!(order, "order clamped to 1");
            return Err(FilterError::Validation {
                field: "order",
                message: "order must be a positive integer".into(),
            });
        }
        self.order = order;
        Ok(())
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    /// Set the characteristic frequency. Values outside `(0, fs/2)` are
    /// clamped to 1 kHz.
    pub fn set_frequency_hz(&mut self, frequency_hz: f64) -> FilterResult<()> {
        if !frequency_hz.is_finite()
            || frequency_hz <= 0.0
            || frequency_hz >= self.sample_rate_hz / 2.0
        {
            self.frequency_hz = DEFAULT_FREQUENCY_HZ;
            tracing::warn!(frequency_hz, "frequency clamped to default");
            return Err(FilterError::Validation {
                field: "frequency_hz",
                message: "frequency must be a positive value under fs/2".into(),
            });
        }
        self.frequency_hz = frequency_hz;
        Ok(())
    }

    pub fn gain_db(&self) -> f64 {
        self.gain_db
    }

    /// Set the gain in dB. Non-finite values are clamped to 0 dB.
    pub fn set_gain_db(&mut self, gain_db: f64) -> FilterResult<()> {
        if !gain_db.is_finite() {
            self.gain_db = 0.0;
            tracing::warn!(gain_db, "gain clamped to 0 dB");
            return Err(FilterError::Validation {
                field: "gain_db",
                message: "gain must be a finite value".into(),
            });
        }
        self.gain_db = gain_db;
        Ok(())
    }

    pub fn q(&self) -> f64 {
        self.q
    }

    /// Set the quality factor. Non-positive values are clamped to 0.71.
    pub fn set_q(&mut self, q: f64) -> FilterResult<()> {
        if !q.is_finite() || q <= 0.0 {
            self.q = DEFAULT_Q;
            tracing::warn!(q, "Q clamped to default");
            return Err(FilterError::Validation {
                field: "q",
                message: "Q must be a positive value".into(),
            });
        }
        self.q = q;
        Ok(())
    }

    pub fn passband_ripple_db(&self) -> f64 {
        self.passband_ripple_db
    }

    /// Set the passband ripple. Negative values are clamped to 1 dB.
    pub fn set_passband_ripple_db(&mut self, ripple_db: f64) -> FilterResult<()> {
        if !ripple_db.is_finite() || ripple_db < 0.0 {
            self.passband_ripple_db = DEFAULT_PASSBAND_RIPPLE_DB;
            tracing::warn!(ripple_db, "passband ripple clamped to default");
            return Err(FilterError::Validation {
                field: "passband_ripple_db",
                message: "passband ripple must be zero or positive".into(),
            });
        }
        self.passband_ripple_db = ripple_db;
        Ok(())
    }

    pub fn stopband_atten_db(&self) -> f64 {
        self.stopband_atten_db
    }

    /// Set the stopband attenuation. Negative values are clamped to 40 dB.
    pub fn set_stopband_atten_db(&mut self, atten_db: f64) -> FilterResult<()> {
        if !atten_db.is_finite() || atten_db < 0.0 {
            self.stopband_atten_db = DEFAULT_STOPBAND_ATTEN_DB;
            tracing::warn!(atten_db, "stopband attenuation clamped to default");
            return Err(FilterError::Validation {
                field: "stopband_atten_db",
                message: "stopband attenuation must be zero or positive".into(),
            });
        }
        self.stopband_atten_db = atten_db;
        Ok(())
    }

    pub fn transition_band_hz(&self) -> f64 {
        self.transition_band_hz
    }

    /// Set the transition band width used by Chebyshev II designs
    /// (stopband edge = frequency + transition band). Negative values are
    /// clamped to zero.
    pub fn set_transition_band_hz(&mut self, width_hz: f64) -> FilterResult<()> {
        if !width_hz.is_finite() || width_hz < 0.0 {
            self.transition_band_hz = 0.0;
            tracing::warn!(width_hz, "transition band clamped to 0 Hz");
            return Err(FilterError::Validation {
                field: "transition_band_hz",
                message: "transition band must be zero or positive".into(),
            });
        }
        self.transition_band_hz = width_hz;
        Ok(())
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Set the sample rate. Non-positive values are clamped to 48 kHz.
    pub fn set_sample_rate_hz(&mut self, sample_rate_hz: f64) -> FilterResult<()> {
        if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
            self.sample_rate_hz = DEFAULT_SAMPLE_RATE_HZ;
            tracing::warn!(sample_rate_hz, "sample rate clamped to default");
            return Err(FilterError::Validation {
                field: "sample_rate_hz",
                message: "sample rate must be a positive value".into(),
            });
        }
        self.sample_rate_hz = sample_rate_hz;
        Ok(())
    }

    pub fn phase_flip(&self) -> bool {
        self.phase_flip
    }

    pub fn set_phase_flip(&mut self, flip: bool) {
        self.phase_flip = flip;
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    pub fn set_delay_samples(&mut self, samples: usize) {
        self.delay_samples = samples;
    }

    /// Normalized angular frequency `w0 = 2*pi*f0/fs`.
    pub(crate) fn w0(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.frequency_hz / self.sample_rate_hz
    }
}
