//! Engines: cached computation units and their dependency graph
//!
//! Three engine kinds mirror the three ways a composite filter is built:
//!
//! - [`FilterEngine`] owns one [`FilterSpec`] and realizes it into a
//!   cascade, response, and pole-zero set.
//! - [`CascadeEngine`] concatenates the cascades of other engines in
//!   series, then applies its own gain, polarity, and delay.
//! - [`SumEngine`] adds the complex responses of other engines, the
//!   parallel connection. Summation is strictly phasor-wise; dB values
//!   are only derived afterwards.
//!
//! Every engine follows one rule: mutation marks it dirty, and `compute`
//! rebuilds everything from the current parameters, replacing cached
//! results wholesale. Gain, flip, and delay are therefore applied exactly
//! once per rebuild and can never stack on an already adjusted cascade.
//!
//! [`EngineGraph`] wires engines together through index-based
//! [`EngineId`]s. A node may only take inputs with smaller indices, so
//! the graph is acyclic by construction, and marking a node dirty walks
//! forward once to dirty every transitive dependent.

use tracing::debug;

use crate::biquad::design_cascade;
use crate::cascade::SosCascade;
use crate::polezero::PoleZeroSet;
use crate::response::{evaluate, FrequencyGrid, FrequencyResponse};
use crate::spec::FilterSpec;
use crate::types::{Complex, FilterError, FilterResult};

/// Index-based handle to a node in an [`EngineGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineId(usize);

impl EngineId {
    /// Position of this node in its graph.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Build the adjusted cascade a spec describes: design the sections, then
/// apply gain (unless the kind bakes it in), polarity, and delay.
fn realize_cascade(spec: &FilterSpec) -> FilterResult<SosCascade> {
    let mut cascade = design_cascade(spec)?;
    if !spec.kind().has_baked_gain() && spec.gain_db() != 0.0 {
        cascade.apply_gain(spec.gain_db());
    }
    if spec.phase_flip() {
        cascade.apply_phase_flip();
    }
    cascade.apply_delay(spec.delay_samples());
    Ok(cascade)
}

/// One filter specification realized into plottable results.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    spec: FilterSpec,
    dirty: bool,
    cascade: Option<SosCascade>,
    response: Option<FrequencyResponse>,
    pole_zero: Option<PoleZeroSet>,
}

impl FilterEngine {
    pub fn new(spec: FilterSpec) -> Self {
        Self {
            spec,
            dirty: true,
            cascade: None,
            response: None,
            pole_zero: None,
        }
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    /// Mutable access to the spec; marks the engine dirty.
    pub fn spec_mut(&mut self) -> &mut FilterSpec {
        self.dirty = true;
        &mut self.spec
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Cached cascade from the last successful compute.
    pub fn cascade(&self) -> Option<&SosCascade> {
        self.cascade.as_ref()
    }

    /// Cached response from the last successful compute.
    pub fn response(&self) -> Option<&FrequencyResponse> {
        self.response.as_ref()
    }

    /// Cached pole-zero set from the last successful compute.
    pub fn pole_zero(&self) -> Option<&PoleZeroSet> {
        self.pole_zero.as_ref()
    }

    /// Rebuild the cascade, response, and pole-zero set from the spec if
    /// dirty; otherwise return the cached response.
    ///
    /// A design failure leaves the previous results (and the dirty flag)
    /// in place, so the caller can keep displaying the last good state.
    pub fn compute(&mut self, grid: &FrequencyGrid) -> FilterResult<&FrequencyResponse> {
        let cached = if self.dirty { None } else { self.response.take() };
        let response = match cached {
            Some(response) => response,
            None => {
                let cascade = realize_cascade(&self.spec)?;
                debug!(
                    kind = %self.spec.kind(),
                    sections = cascade.len(),
                    "rebuilding filter response"
                );
                let response = evaluate(&cascade, grid, self.spec.sample_rate_hz());
                self.pole_zero = Some(PoleZeroSet::from_cascade(&cascade));
                self.cascade = Some(cascade);
                self.dirty = false;
                response
            }
        };
        Ok(self.response.insert(response))
    }
}

/// Series combination of other engines' cascades with its own gain,
/// polarity, and delay stage.
#[derive(Debug, Clone)]
pub struct CascadeEngine {
    inputs: Vec<EngineId>,
    gain_db: f64,
    phase_flip: bool,
    delay_samples: usize,
    dirty: bool,
    cascade: Option<SosCascade>,
    response: Option<FrequencyResponse>,
    pole_zero: Option<PoleZeroSet>,
}

impl CascadeEngine {
    pub fn new(inputs: Vec<EngineId>) -> Self {
        Self {
            inputs,
            gain_db: 0.0,
            phase_flip: false,
            delay_samples: 0,
            dirty: true,
            cascade: None,
            response: None,
            pole_zero: None,
        }
    }

    pub fn inputs(&self) -> &[EngineId] {
        &self.inputs
    }

    pub fn gain_db(&self) -> f64 {
        self.gain_db
    }

    /// Set the post-concatenation gain. Non-finite values are clamped to
    /// 0 dB, same contract as [`FilterSpec::set_gain_db`].
    pub fn set_gain_db(&mut self, gain_db: f64) -> FilterResult<()> {
        self.dirty = true;
        if !gain_db.is_finite() {
            self.gain_db = 0.0;
            return Err(FilterError::Validation {
                field: "gain_db",
                message: "gain must be a finite value".into(),
            });
        }
        self.gain_db = gain_db;
        Ok(())
    }

    pub fn phase_flip(&self) -> bool {
        self.phase_flip
    }

    pub fn set_phase_flip(&mut self, flip: bool) {
        self.dirty = true;
        self.phase_flip = flip;
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    pub fn set_delay_samples(&mut self, samples: usize) {
        self.dirty = true;
        self.delay_samples = samples;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn cascade(&self) -> Option<&SosCascade> {
        self.cascade.as_ref()
    }

    pub fn response(&self) -> Option<&FrequencyResponse> {
        self.response.as_ref()
    }

    pub fn pole_zero(&self) -> Option<&PoleZeroSet> {
        self.pole_zero.as_ref()
    }

    /// Concatenate the given input cascades (in input order) and rebuild
    /// all results. `input_cascades` must match [`Self::inputs`]; the
    /// graph supplies them already computed.
    pub fn compute(
        &mut self,
        input_cascades: &[&SosCascade],
        grid: &FrequencyGrid,
        sample_rate_hz: f64,
    ) -> &FrequencyResponse {
        let cached = if self.dirty { None } else { self.response.take() };
        let response = match cached {
            Some(response) => response,
            None => {
                // Seed with the identity so gain and flip always have a
                // first section to act on, even with no inputs.
                let mut cascade = SosCascade::identity();
                for input in input_cascades {
                    cascade = cascade.concatenate(input);
                }
                if self.gain_db != 0.0 {
                    cascade.apply_gain(self.gain_db);
                }
                if self.phase_flip {
                    cascade.apply_phase_flip();
                }
                cascade.apply_delay(self.delay_samples);

                debug!(
                    inputs = input_cascades.len(),
                    sections = cascade.len(),
                    "rebuilding cascade response"
                );
                let response = evaluate(&cascade, grid, sample_rate_hz);
                self.pole_zero = Some(PoleZeroSet::from_cascade(&cascade));
                self.cascade = Some(cascade);
                self.dirty = false;
                response
            }
        };
        self.response.insert(response)
    }
}

/// Parallel combination: phasor sum of other engines' responses.
#[derive(Debug, Clone)]
pub struct SumEngine {
    inputs: Vec<EngineId>,
    dirty: bool,
    response: Option<FrequencyResponse>,
    pole_zero: PoleZeroSet,
}

impl SumEngine {
    pub fn new(inputs: Vec<EngineId>) -> Self {
        Self {
            inputs,
            dirty: true,
            response: None,
            pole_zero: PoleZeroSet::empty(),
        }
    }

    pub fn inputs(&self) -> &[EngineId] {
        &self.inputs
    }

    /// Append an input. The result is valid after the next compute.
    pub fn add_engine(&mut self, id: EngineId) {
        self.inputs.push(id);
        self.dirty = true;
    }

    /// Drop the most recently added input, if any.
    pub fn remove_last_engine(&mut self) -> Option<EngineId> {
        let removed = self.inputs.pop();
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn response(&self) -> Option<&FrequencyResponse> {
        self.response.as_ref()
    }

    /// A sum of cascades is not a low-order rational function, so the
    /// pole-zero set is always empty.
    pub fn pole_zero(&self) -> &PoleZeroSet {
        &self.pole_zero
    }

    /// Sum the given input responses and re-derive every measure.
    /// With no inputs the sum is identically zero (-inf dB).
    ///
    /// # Panics
    ///
    /// Panics if the input responses do not share one grid.
    pub fn compute(
        &mut self,
        input_responses: &[&FrequencyResponse],
        grid: &FrequencyGrid,
    ) -> &FrequencyResponse {
        let cached = if self.dirty { None } else { self.response.take() };
        let response = match cached {
            Some(response) => response,
            None => {
                debug!(inputs = input_responses.len(), "rebuilding sum response");
                let response = if input_responses.is_empty() {
                    FrequencyResponse::from_complex(
                        grid.frequencies_hz().to_vec(),
                        vec![Complex::new(0.0, 0.0); grid.len()],
                    )
                } else {
                    FrequencyResponse::sum(input_responses)
                };
                self.dirty = false;
                response
            }
        };
        self.response.insert(response)
    }
}

enum EngineNode {
    Filter(FilterEngine),
    Cascade(CascadeEngine),
    Sum(SumEngine),
}

impl EngineNode {
    fn inputs(&self) -> &[EngineId] {
        match self {
            EngineNode::Filter(_) => &[],
            EngineNode::Cascade(e) => e.inputs(),
            EngineNode::Sum(e) => e.inputs(),
        }
    }

    fn is_dirty(&self) -> bool {
        match self {
            EngineNode::Filter(e) => e.is_dirty(),
            EngineNode::Cascade(e) => e.is_dirty(),
            EngineNode::Sum(e) => e.is_dirty(),
        }
    }

    fn mark_dirty(&mut self) {
        match self {
            EngineNode::Filter(e) => e.dirty = true,
            EngineNode::Cascade(e) => e.dirty = true,
            EngineNode::Sum(e) => e.dirty = true,
        }
    }

    fn cascade(&self) -> Option<&SosCascade> {
        match self {
            EngineNode::Filter(e) => e.cascade(),
            EngineNode::Cascade(e) => e.cascade(),
            EngineNode::Sum(_) => None,
        }
    }

    fn response(&self) -> Option<&FrequencyResponse> {
        match self {
            EngineNode::Filter(e) => e.response(),
            EngineNode::Cascade(e) => e.response(),
            EngineNode::Sum(e) => e.response(),
        }
    }

    fn pole_zero(&self) -> Option<&PoleZeroSet> {
        match self {
            EngineNode::Filter(e) => e.pole_zero(),
            EngineNode::Cascade(e) => e.pole_zero(),
            EngineNode::Sum(e) => Some(e.pole_zero()),
        }
    }
}

/// Explicit dependency graph of engines, acyclic by construction: a node
/// can only reference inputs added before it.
///
/// Reads recompute exactly the dirty nodes the requested result depends
/// on, in index order, and return cached data otherwise.
pub struct EngineGraph {
    nodes: Vec<EngineNode>,
    grid: FrequencyGrid,
    sample_rate_hz: f64,
}

impl EngineGraph {
    /// Graph with the default audio analysis grid for `sample_rate_hz`.
    pub fn new(sample_rate_hz: f64) -> Self {
        Self::with_grid(FrequencyGrid::default_audio(sample_rate_hz), sample_rate_hz)
    }

    pub fn with_grid(grid: FrequencyGrid, sample_rate_hz: f64) -> Self {
        Self {
            nodes: Vec::new(),
            grid,
            sample_rate_hz,
        }
    }

    pub fn grid(&self) -> &FrequencyGrid {
        &self.grid
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a filter node.
    pub fn add_filter(&mut self, spec: FilterSpec) -> EngineId {
        self.nodes.push(EngineNode::Filter(FilterEngine::new(spec)));
        EngineId(self.nodes.len() - 1)
    }

    /// Add a series-cascade node over existing cascade-bearing nodes.
    ///
    /// # Panics
    ///
    /// Panics if an input id is out of range or refers to a sum node,
    /// which has no section cascade to concatenate.
    pub fn add_cascade(&mut self, inputs: Vec<EngineId>) -> EngineId {
        for &EngineId(k) in &inputs {
            assert!(k < self.nodes.len(), "input id out of range");
            assert!(
                !matches!(self.nodes[k], EngineNode::Sum(_)),
                "cascade inputs must expose a section cascade"
            );
        }
        self.nodes.push(EngineNode::Cascade(CascadeEngine::new(inputs)));
        EngineId(self.nodes.len() - 1)
    }

    /// Add a parallel-sum node over existing nodes.
    ///
    /// # Panics
    ///
    /// Panics if an input id is out of range.
    pub fn add_sum(&mut self, inputs: Vec<EngineId>) -> EngineId {
        for &EngineId(k) in &inputs {
            assert!(k < self.nodes.len(), "input id out of range");
        }
        self.nodes.push(EngineNode::Sum(SumEngine::new(inputs)));
        EngineId(self.nodes.len() - 1)
    }

    /// Mutable access to a filter node's spec; the node and all of its
    /// transitive dependents become dirty. `None` for non-filter nodes.
    pub fn filter_spec_mut(&mut self, id: EngineId) -> Option<&mut FilterSpec> {
        self.mark_dirty(id);
        match &mut self.nodes[id.0] {
            EngineNode::Filter(engine) => Some(engine.spec_mut()),
            _ => None,
        }
    }

    /// Mutable access to a cascade node's gain/flip/delay stage; the node
    /// and its dependents become dirty. `None` for non-cascade nodes.
    pub fn cascade_engine_mut(&mut self, id: EngineId) -> Option<&mut CascadeEngine> {
        self.mark_dirty(id);
        match &mut self.nodes[id.0] {
            EngineNode::Cascade(engine) => Some(engine),
            _ => None,
        }
    }

    /// Append an input to a sum node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a sum node or `input` does not precede it
    /// (which would create a cycle).
    pub fn sum_add_input(&mut self, id: EngineId, input: EngineId) {
        assert!(input.0 < id.0, "sum inputs must precede the sum node");
        match &mut self.nodes[id.0] {
            EngineNode::Sum(engine) => engine.add_engine(input),
            _ => panic!("node is not a sum engine"),
        }
        self.mark_dirty(id);
    }

    /// Drop the most recently added input of a sum node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a sum node.
    pub fn sum_remove_last_input(&mut self, id: EngineId) -> Option<EngineId> {
        let removed = match &mut self.nodes[id.0] {
            EngineNode::Sum(engine) => engine.remove_last_engine(),
            _ => panic!("node is not a sum engine"),
        };
        if removed.is_some() {
            self.mark_dirty(id);
        }
        removed
    }

    pub fn is_dirty(&self, id: EngineId) -> bool {
        self.nodes[id.0].is_dirty()
    }

    /// Response of a node, recomputing it and any dirty dependencies.
    pub fn response(&mut self, id: EngineId) -> FilterResult<&FrequencyResponse> {
        self.compute_needed(id)?;
        match self.nodes[id.0].response() {
            Some(response) => Ok(response),
            None => unreachable!("node was computed just above"),
        }
    }

    /// Pole-zero set of a node, recomputing as needed. Sum nodes report
    /// an empty set.
    pub fn pole_zero(&mut self, id: EngineId) -> FilterResult<&PoleZeroSet> {
        self.compute_needed(id)?;
        match self.nodes[id.0].pole_zero() {
            Some(pz) => Ok(pz),
            None => unreachable!("node was computed just above"),
        }
    }

    /// Dirty `id` and every node downstream of it. One forward pass
    /// suffices because inputs always have smaller indices.
    fn mark_dirty(&mut self, id: EngineId) {
        self.nodes[id.0].mark_dirty();
        for j in id.0 + 1..self.nodes.len() {
            let depends_on_dirty = self.nodes[j]
                .inputs()
                .iter()
                .any(|&EngineId(k)| self.nodes[k].is_dirty());
            if depends_on_dirty {
                self.nodes[j].mark_dirty();
            }
        }
    }

    /// Nodes the target transitively depends on, including itself.
    fn needed_set(&self, target: EngineId) -> Vec<bool> {
        let mut needed = vec![false; self.nodes.len()];
        let mut stack = vec![target.0];
        while let Some(i) = stack.pop() {
            if needed[i] {
                continue;
            }
            needed[i] = true;
            for &EngineId(k) in self.nodes[i].inputs() {
                stack.push(k);
            }
        }
        needed
    }

    /// Compute the needed subgraph in ascending index order, so every
    /// node's inputs are ready before the node itself.
    fn compute_needed(&mut self, target: EngineId) -> FilterResult<()> {
        let needed = self.needed_set(target);
        let Self {
            nodes,
            grid,
            sample_rate_hz,
        } = self;

        for i in 0..nodes.len() {
            if !needed[i] {
                continue;
            }
            let (before, rest) = nodes.split_at_mut(i);
            match &mut rest[0] {
                EngineNode::Filter(engine) => {
                    engine.compute(grid)?;
                }
                EngineNode::Cascade(engine) => {
                    let ids = engine.inputs().to_vec();
                    let mut cascades = Vec::with_capacity(ids.len());
                    for EngineId(k) in ids {
                        match before[k].cascade() {
                            Some(cascade) => cascades.push(cascade),
                            None => unreachable!("inputs are computed before dependents"),
                        }
                    }
                    engine.compute(&cascades, grid, *sample_rate_hz);
                }
                EngineNode::Sum(engine) => {
                    let ids = engine.inputs().to_vec();
                    let mut responses = Vec::with_capacity(ids.len());
                    for EngineId(k) in ids {
                        match before[k].response() {
                            Some(response) => responses.push(response),
                            None => unreachable!("inputs are computed before dependents"),
                        }
                    }
                    engine.compute(&responses, grid);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Band, BiquadKind, ClassicalFamily, FilterKind};
    use approx::assert_abs_diff_eq;

    fn test_grid() -> FrequencyGrid {
        FrequencyGrid::log_spaced(1.0, 24000.0, 64)
    }

    fn lowpass_spec() -> FilterSpec {
        FilterSpec::new(FilterKind::Biquad(BiquadKind::Lowpass))
    }

    #[test]
    fn test_filter_engine_computes_once_until_dirty() {
        let grid = test_grid();
        let mut engine = FilterEngine::new(lowpass_spec());
        assert!(engine.is_dirty());
        engine.compute(&grid).unwrap();
        assert!(!engine.is_dirty());
        assert!(engine.cascade().is_some());
        assert!(engine.pole_zero().is_some());

        engine.spec_mut().set_frequency_hz(2000.0).unwrap();
        assert!(engine.is_dirty());
        engine.compute(&grid).unwrap();
        assert!(!engine.is_dirty());
    }

    #[test]
    fn test_filter_engine_keeps_last_good_result_on_error() {
        let grid = test_grid();
        let mut engine = FilterEngine::new(lowpass_spec());
        let before = engine.compute(&grid).unwrap().clone();

        engine.spec_mut().set_kind(FilterKind::Classical {
            family: ClassicalFamily::Elliptic,
            band: Band::Lowpass,
        });
        assert!(engine.compute(&grid).is_err());
        assert!(engine.is_dirty());
        assert_eq!(engine.response(), Some(&before));
    }

    #[test]
    fn test_filter_engine_applies_gain_flip_delay_once() {
        let grid = test_grid();
        let mut engine = FilterEngine::new(lowpass_spec());
        engine.spec_mut().set_gain_db(6.0).unwrap();
        engine.spec_mut().set_delay_samples(2);
        let gained = engine.compute(&grid).unwrap().clone();

        // A second compute of the same spec must not stack the gain.
        let mut engine2 = FilterEngine::new(engine.spec().clone());
        engine2.spec_mut().set_gain_db(6.0).unwrap();
        let again = engine2.compute(&grid).unwrap();
        for (a, b) in gained.magnitude_db.iter().zip(&again.magnitude_db) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_cascade_engine_multiplies_responses() {
        let grid = test_grid();
        let mut a = FilterEngine::new(lowpass_spec());
        let ra = a.compute(&grid).unwrap().clone();

        let mut cascade = CascadeEngine::new(Vec::new());
        let doubled = cascade
            .compute(
                &[a.cascade().unwrap(), a.cascade().unwrap()],
                &grid,
                48000.0,
            )
            .clone();
        for (d, s) in doubled.magnitude_db.iter().zip(&ra.magnitude_db) {
            assert_abs_diff_eq!(*d, 2.0 * s, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_cascade_engine_own_gain() {
        let grid = test_grid();
        let mut cascade = CascadeEngine::new(Vec::new());
        cascade.set_gain_db(6.0).unwrap();
        let response = cascade.compute(&[], &grid, 48000.0);
        for db in &response.magnitude_db {
            assert_abs_diff_eq!(*db, 6.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_sum_engine_empty_is_silence() {
        let grid = test_grid();
        let mut sum = SumEngine::new(Vec::new());
        let response = sum.compute(&[], &grid);
        for db in &response.magnitude_db {
            assert!(db.is_infinite() && db.is_sign_negative());
        }
        assert!(sum.pole_zero().zeros.is_empty());
        assert!(sum.pole_zero().poles.is_empty());
    }

    #[test]
    fn test_graph_sum_of_two_identical_filters_doubles() {
        let mut graph = EngineGraph::with_grid(test_grid(), 48000.0);
        let a = graph.add_filter(lowpass_spec());
        let b = graph.add_filter(lowpass_spec());
        let sum = graph.add_sum(vec![a, b]);

        let single = graph.response(a).unwrap().magnitude_db.clone();
        let summed = graph.response(sum).unwrap().magnitude_db.clone();
        let expected_boost = 20.0 * 2.0_f64.log10();
        for (s, m) in summed.iter().zip(&single) {
            assert_abs_diff_eq!(s - m, expected_boost, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_graph_dirtiness_propagates_to_dependents() {
        let mut graph = EngineGraph::with_grid(test_grid(), 48000.0);
        let a = graph.add_filter(lowpass_spec());
        let b = graph.add_filter(lowpass_spec());
        let cascade = graph.add_cascade(vec![a, b]);
        let sum = graph.add_sum(vec![cascade]);

        graph.response(sum).unwrap();
        assert!(!graph.is_dirty(a));
        assert!(!graph.is_dirty(cascade));
        assert!(!graph.is_dirty(sum));

        graph
            .filter_spec_mut(a)
            .unwrap()
            .set_frequency_hz(3000.0)
            .unwrap();
        assert!(graph.is_dirty(a));
        assert!(graph.is_dirty(cascade));
        assert!(graph.is_dirty(sum));
        assert!(!graph.is_dirty(b));

        let before = graph.response(cascade).unwrap().magnitude_db.clone();
        // Reading the cascade cleans it, but the sum stays dirty until read
        assert!(!graph.is_dirty(cascade));
        assert!(graph.is_dirty(sum));
        graph.response(sum).unwrap();
        assert!(!graph.is_dirty(sum));

        // Untouched sibling changes nothing for the cascade
        let after = graph.response(cascade).unwrap().magnitude_db.clone();
        assert_eq!(before, after);
    }

    #[test]
    fn test_graph_cascade_gain_stage() {
        let mut graph = EngineGraph::with_grid(test_grid(), 48000.0);
        let a = graph.add_filter(lowpass_spec());
        let cascade = graph.add_cascade(vec![a]);
        graph
            .cascade_engine_mut(cascade)
            .unwrap()
            .set_gain_db(6.0)
            .unwrap();

        let single = graph.response(a).unwrap().magnitude_db.clone();
        let boosted = graph.response(cascade).unwrap().magnitude_db.clone();
        for (b, s) in boosted.iter().zip(&single) {
            assert_abs_diff_eq!(b - s, 6.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_graph_sum_add_and_remove_inputs() {
        let mut graph = EngineGraph::with_grid(test_grid(), 48000.0);
        let a = graph.add_filter(lowpass_spec());
        let sum = graph.add_sum(vec![a]);

        let single = graph.response(sum).unwrap().magnitude_db.clone();
        graph.sum_add_input(sum, a);
        assert!(graph.is_dirty(sum));
        let doubled = graph.response(sum).unwrap().magnitude_db.clone();
        let boost = 20.0 * 2.0_f64.log10();
        for (d, s) in doubled.iter().zip(&single) {
            assert_abs_diff_eq!(d - s, boost, epsilon = 1e-9);
        }

        assert_eq!(graph.sum_remove_last_input(sum), Some(a));
        let back = graph.response(sum).unwrap().magnitude_db.clone();
        assert_eq!(back, single);
    }

    #[test]
    #[should_panic(expected = "must precede")]
    fn test_graph_rejects_forward_sum_input() {
        let mut graph = EngineGraph::with_grid(test_grid(), 48000.0);
        let a = graph.add_filter(lowpass_spec());
        let sum = graph.add_sum(Vec::new());
        graph.sum_add_input(a, sum); // wrong way around: would be a cycle
    }

    #[test]
    #[should_panic(expected = "section cascade")]
    fn test_graph_rejects_sum_as_cascade_input() {
        let mut graph = EngineGraph::with_grid(test_grid(), 48000.0);
        let a = graph.add_filter(lowpass_spec());
        let sum = graph.add_sum(vec![a]);
        graph.add_cascade(vec![sum]);
    }
}
