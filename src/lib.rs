//! # Cascaded Biquad Filter Design and Analysis
//!
//! This crate is the computation core of an interactive filter design tool:
//! it turns user-facing filter parameters into cascades of second-order
//! sections (SOS) and derives everything a response plot needs.
//!
//! ## Overview
//!
//! - **Cookbook sections**: highpass, lowpass, allpass of arbitrary order,
//!   peaking EQ, low/high shelf
//! - **Classical designs**: Butterworth, Chebyshev I/II, and Bessel via
//!   analog prototypes and the bilinear transform
//! - **Composition**: series concatenation with gain, polarity inversion,
//!   and integer-sample delay; parallel phasor summation
//! - **Analysis**: complex response on a log grid, magnitude in dB, wrapped
//!   and unwrapped phase, group delay, phase delay, poles and zeros
//!
//! ## Signal flow
//!
//! ```text
//! FilterSpec → SosCascade → FrequencyResponse ─┬→ magnitude / phase / delays
//!                        └→ PoleZeroSet        └→ SumEngine (parallel, Σ complex)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use filterlab::prelude::*;
//!
//! let mut graph = EngineGraph::new(48_000.0);
//!
//! let mut spec = FilterSpec::new(FilterKind::Biquad(BiquadKind::Highpass));
//! spec.set_frequency_hz(1_000.0)?;
//! spec.set_q(0.71)?;
//! let hp = graph.add_filter(spec);
//!
//! let lp = graph.add_filter(FilterSpec::new(FilterKind::Biquad(BiquadKind::Lowpass)));
//! let crossover = graph.add_sum(vec![hp, lp]);
//!
//! let response = graph.response(crossover)?;
//! assert_eq!(response.frequencies_hz.len(), response.magnitude_db.len());
//! # Ok::<(), filterlab::FilterError>(())
//! ```

pub mod biquad;
pub mod cascade;
pub mod design;
pub mod engine;
pub mod logging;
pub mod phase;
pub mod polezero;
pub mod response;
pub mod spec;
pub mod types;

// Re-export main types
pub use cascade::{SosCascade, SosSection};
pub use engine::{CascadeEngine, EngineGraph, EngineId, FilterEngine, SumEngine};
pub use polezero::PoleZeroSet;
pub use response::{evaluate, FrequencyGrid, FrequencyResponse, DEFAULT_GRID_POINTS};
pub use spec::{Band, BiquadKind, ClassicalFamily, FilterKind, FilterSpec};
pub use types::{db_to_linear, linear_to_db, Complex, FilterError, FilterResult};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cascade::{SosCascade, SosSection};
    pub use crate::engine::{CascadeEngine, EngineGraph, EngineId, FilterEngine, SumEngine};
    pub use crate::polezero::PoleZeroSet;
    pub use crate::response::{FrequencyGrid, FrequencyResponse};
    pub use crate::spec::{Band, BiquadKind, ClassicalFamily, FilterKind, FilterSpec};
    pub use crate::types::{Complex, FilterError, FilterResult};
}
