//! Lifts flat-buffer integrators to any state type described by a [`Descriptor`].
//!
//! Every step encodes the structured state once, lets the integrator call a
//! flat derivative (decode -> structured derivative -> encode into a fresh
//! buffer) as often as its stages require, and decodes the integrator's result.

use crate::codec::{decode_from_buffer, encode_to_buffer, Descriptor};
use crate::error::Result;
use crate::solvers::ExplicitMethod;
use crate::traits::{ExplicitSolver, FloatBuffer};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationSettings {
    pub method: ExplicitMethod,
    pub step_size: f64,
    pub steps: usize,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            method: ExplicitMethod::RungeKutta4,
            step_size: 0.01,
            steps: 1,
        }
    }
}

impl IntegrationSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.step_size.is_finite() || self.step_size == 0.0 {
            bail!("step_size must be finite and non-zero.");
        }
        if self.steps == 0 {
            bail!("steps must be greater than zero.");
        }
        Ok(())
    }
}

/// Structured-state stepper built from a descriptor and a flat integrator.
///
/// `B` selects the flat buffer representation handed to the integrator.
pub struct GenericExplicitSolver<D, S, B = Vec<f64>> {
    descriptor: D,
    solver: S,
    _buffer: PhantomData<fn() -> B>,
}

impl<D: Descriptor, S: ExplicitSolver> GenericExplicitSolver<D, S> {
    pub fn new(descriptor: D, solver: S) -> Self {
        Self {
            descriptor,
            solver,
            _buffer: PhantomData,
        }
    }
}

impl<D, S, B> GenericExplicitSolver<D, S, B>
where
    D: Descriptor,
    D::Value: Clone,
    S: ExplicitSolver,
    B: FloatBuffer,
{
    /// Switches the flat buffer representation.
    pub fn with_buffer<C: FloatBuffer>(self) -> GenericExplicitSolver<D, S, C> {
        GenericExplicitSolver {
            descriptor: self.descriptor,
            solver: self.solver,
            _buffer: PhantomData,
        }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Advances `current` by one step of `step_size`.
    ///
    /// `current` is only read: it serves as the decode template for every
    /// derivative evaluation and for the returned state.
    pub fn step<F>(&self, current: &D::Value, step_size: f64, mut derivative: F) -> Result<D::Value>
    where
        F: FnMut(D::Value) -> D::Value,
    {
        let flat: B = encode_to_buffer(&self.descriptor, current)?;
        let mut evaluations = 0usize;
        let next = self.solver.step(&flat, step_size, |candidate: &B| {
            evaluations += 1;
            let mapped = decode_from_buffer(&self.descriptor, candidate, current.clone())?;
            let derived = derivative(mapped);
            encode_to_buffer(&self.descriptor, &derived)
        })?;
        log::trace!(
            "generic step over {} floats took {} derivative evaluations",
            flat.len(),
            evaluations
        );
        decode_from_buffer(&self.descriptor, &next, current.clone())
    }

    /// Runs `steps` consecutive steps starting from `initial`.
    pub fn advance<F>(
        &self,
        initial: D::Value,
        step_size: f64,
        steps: usize,
        mut derivative: F,
    ) -> Result<D::Value>
    where
        F: FnMut(D::Value) -> D::Value,
    {
        let mut state = initial;
        for _ in 0..steps {
            state = self.step(&state, step_size, &mut derivative)?;
        }
        Ok(state)
    }

    /// Fixes the structured derivative, leaving a `(state, step_size) -> state` stepper.
    pub fn bind<F>(&self, derivative: F) -> BoundStepper<'_, D, S, B, F>
    where
        F: FnMut(D::Value) -> D::Value,
    {
        BoundStepper {
            solver: self,
            derivative,
        }
    }
}

pub struct BoundStepper<'a, D, S, B, F> {
    solver: &'a GenericExplicitSolver<D, S, B>,
    derivative: F,
}

impl<D, S, B, F> BoundStepper<'_, D, S, B, F>
where
    D: Descriptor,
    D::Value: Clone,
    S: ExplicitSolver,
    B: FloatBuffer,
    F: FnMut(D::Value) -> D::Value,
{
    pub fn step(&mut self, current: &D::Value, step_size: f64) -> Result<D::Value> {
        self.solver.step(current, step_size, &mut self.derivative)
    }
}

/// Integrates `initial` with the method, step size and step count of `settings`.
pub fn integrate<D, F>(
    descriptor: D,
    initial: D::Value,
    settings: &IntegrationSettings,
    derivative: F,
) -> anyhow::Result<D::Value>
where
    D: Descriptor,
    D::Value: Clone,
    F: FnMut(D::Value) -> D::Value,
{
    settings.validate()?;
    log::debug!(
        "integrating {} steps of {} with {}",
        settings.steps,
        settings.step_size,
        settings.method.name()
    );
    let solver = GenericExplicitSolver::new(descriptor, settings.method);
    let state = solver
        .advance(initial, settings.step_size, settings.steps, derivative)
        .with_context(|| format!("Integration with {} failed.", settings.method.name()))?;
    log::debug!("integration finished");
    Ok(state)
}
