//! Explicit Runge-Kutta integrators over flat buffers.
//!
//! See: https://en.wikipedia.org/wiki/Runge%E2%80%93Kutta_methods

use crate::buffer_ops::{add_all_to_first, add_self, scalar_multiply, scalar_multiply_self};
use crate::error::{Error, Result};
use crate::traits::{ExplicitSolver, FloatBuffer};
use serde::{Deserialize, Serialize};

const ONE_THIRD: f64 = 1.0 / 3.0;
const ONE_SIXTH: f64 = 1.0 / 6.0;

/// Calls the derivative and checks it kept the state dimension.
fn evaluate<B, F>(derivative: &mut F, state: &B) -> Result<B>
where
    B: FloatBuffer,
    F: FnMut(&B) -> Result<B>,
{
    let k = derivative(state)?;
    if k.len() != state.len() {
        return Err(Error::DimensionMismatch {
            expected: state.len(),
            actual: k.len(),
        });
    }
    Ok(k)
}

/// Forward Euler: y + h f(y).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitEuler;

impl ExplicitSolver for ExplicitEuler {
    fn step<B, F>(&self, current: &B, step_size: f64, mut derivative: F) -> Result<B>
    where
        B: FloatBuffer,
        F: FnMut(&B) -> Result<B>,
    {
        let k0 = evaluate(&mut derivative, current)?;
        add_self(scalar_multiply_self(k0, step_size), current)
    }
}

/// Second order two-stage family parameterized by the position `alpha` of the
/// second stage.
#[derive(Debug, Clone, Copy)]
pub struct SecondOrderTwoStage {
    pub alpha: f64,
}

impl SecondOrderTwoStage {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// Ralston's method, the member with minimal truncation error bound.
    pub fn ralston() -> Self {
        Self::new(2.0 / 3.0)
    }
}

impl ExplicitSolver for SecondOrderTwoStage {
    fn step<B, F>(&self, current: &B, step_size: f64, mut derivative: F) -> Result<B>
    where
        B: FloatBuffer,
        F: FnMut(&B) -> Result<B>,
    {
        let b0 = 1.0 - 0.5 / self.alpha;
        let b1 = 0.5 / self.alpha;
        let k0 = evaluate(&mut derivative, current)?;
        let k1 = evaluate(
            &mut derivative,
            &add_self(scalar_multiply(&k0, self.alpha * step_size), current)?,
        )?;
        add_all_to_first(
            scalar_multiply_self(k0, b0 * step_size),
            &[&scalar_multiply_self(k1, b1 * step_size), current],
        )
    }
}

/// Explicit midpoint: y + h f(y + h/2 f(y)).
#[derive(Debug, Clone, Copy, Default)]
pub struct Midpoint;

impl ExplicitSolver for Midpoint {
    fn step<B, F>(&self, current: &B, step_size: f64, mut derivative: F) -> Result<B>
    where
        B: FloatBuffer,
        F: FnMut(&B) -> Result<B>,
    {
        let k0 = evaluate(&mut derivative, current)?;
        let k1 = evaluate(
            &mut derivative,
            &add_self(scalar_multiply_self(k0, step_size * 0.5), current)?,
        )?;
        add_self(scalar_multiply_self(k1, step_size), current)
    }
}

/// Heun's method (explicit trapezoidal rule).
#[derive(Debug, Clone, Copy, Default)]
pub struct Heun;

impl ExplicitSolver for Heun {
    fn step<B, F>(&self, current: &B, step_size: f64, mut derivative: F) -> Result<B>
    where
        B: FloatBuffer,
        F: FnMut(&B) -> Result<B>,
    {
        let k0 = evaluate(&mut derivative, current)?;
        let k1 = evaluate(
            &mut derivative,
            &add_self(scalar_multiply(&k0, step_size), current)?,
        )?;
        add_self(
            scalar_multiply_self(add_self(k0, &k1)?, 0.5 * step_size),
            current,
        )
    }
}

/// Classic Runge-Kutta 4th Order Solver
#[derive(Debug, Clone, Copy, Default)]
pub struct RungeKutta4;

impl ExplicitSolver for RungeKutta4 {
    fn step<B, F>(&self, current: &B, step_size: f64, mut derivative: F) -> Result<B>
    where
        B: FloatBuffer,
        F: FnMut(&B) -> Result<B>,
    {
        let half_step = step_size * 0.5;
        let step_by_six = step_size * ONE_SIXTH;
        let step_by_three = step_size * ONE_THIRD;

        // k0 = f(y)
        let k0 = evaluate(&mut derivative, current)?;
        // k1 = f(y + h/2 k0)
        let k1 = evaluate(
            &mut derivative,
            &add_self(scalar_multiply(&k0, half_step), current)?,
        )?;
        // k2 = f(y + h/2 k1)
        let k2 = evaluate(
            &mut derivative,
            &add_self(scalar_multiply(&k1, half_step), current)?,
        )?;
        // k3 = f(y + h k2)
        let k3 = evaluate(
            &mut derivative,
            &add_self(scalar_multiply(&k2, step_size), current)?,
        )?;

        // y + h/6 (k0 + 2 k1 + 2 k2 + k3)
        add_all_to_first(
            scalar_multiply_self(k0, step_by_six),
            &[
                &scalar_multiply_self(k1, step_by_three),
                &scalar_multiply_self(k2, step_by_three),
                &scalar_multiply_self(k3, step_by_six),
                current,
            ],
        )
    }
}

/// Runge-Kutta 3/8 rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct RungeKuttaThreeEighths;

impl ExplicitSolver for RungeKuttaThreeEighths {
    fn step<B, F>(&self, current: &B, step_size: f64, mut derivative: F) -> Result<B>
    where
        B: FloatBuffer,
        F: FnMut(&B) -> Result<B>,
    {
        let step_over_three = step_size * ONE_THIRD;
        let k0 = evaluate(&mut derivative, current)?;
        let k1 = evaluate(
            &mut derivative,
            &add_self(scalar_multiply(&k0, step_over_three), current)?,
        )?;
        let k2 = evaluate(
            &mut derivative,
            &add_all_to_first(
                scalar_multiply(&k0, -step_over_three),
                &[&scalar_multiply(&k1, step_size), current],
            )?,
        )?;
        let k3 = evaluate(
            &mut derivative,
            &add_all_to_first(
                scalar_multiply(&k0, step_size),
                &[
                    &scalar_multiply(&k1, -step_size),
                    &scalar_multiply(&k2, step_size),
                    current,
                ],
            )?,
        )?;
        add_all_to_first(
            scalar_multiply_self(k0, step_size / 8.0),
            &[
                &scalar_multiply_self(k1, step_size * 3.0 / 8.0),
                &scalar_multiply_self(k2, step_size * 3.0 / 8.0),
                &scalar_multiply_self(k3, step_size / 8.0),
                current,
            ],
        )
    }
}

/// Named selection of the built-in integrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExplicitMethod {
    #[serde(rename = "euler")]
    Euler,
    #[serde(rename = "midpoint")]
    Midpoint,
    #[serde(rename = "heun")]
    Heun,
    #[serde(rename = "ralston")]
    Ralston,
    #[default]
    #[serde(rename = "rk4")]
    RungeKutta4,
    #[serde(rename = "rk38")]
    RungeKuttaThreeEighths,
}

impl ExplicitMethod {
    pub const ALL: [ExplicitMethod; 6] = [
        ExplicitMethod::Euler,
        ExplicitMethod::Midpoint,
        ExplicitMethod::Heun,
        ExplicitMethod::Ralston,
        ExplicitMethod::RungeKutta4,
        ExplicitMethod::RungeKuttaThreeEighths,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            ExplicitMethod::Euler => "euler",
            ExplicitMethod::Midpoint => "midpoint",
            ExplicitMethod::Heun => "heun",
            ExplicitMethod::Ralston => "ralston",
            ExplicitMethod::RungeKutta4 => "rk4",
            ExplicitMethod::RungeKuttaThreeEighths => "rk38",
        }
    }

    /// Derivative evaluations per step.
    pub fn stages(self) -> usize {
        match self {
            ExplicitMethod::Euler => 1,
            ExplicitMethod::Midpoint | ExplicitMethod::Heun | ExplicitMethod::Ralston => 2,
            ExplicitMethod::RungeKutta4 | ExplicitMethod::RungeKuttaThreeEighths => 4,
        }
    }
}

impl ExplicitSolver for ExplicitMethod {
    fn step<B, F>(&self, current: &B, step_size: f64, derivative: F) -> Result<B>
    where
        B: FloatBuffer,
        F: FnMut(&B) -> Result<B>,
    {
        match self {
            ExplicitMethod::Euler => ExplicitEuler.step(current, step_size, derivative),
            ExplicitMethod::Midpoint => Midpoint.step(current, step_size, derivative),
            ExplicitMethod::Heun => Heun.step(current, step_size, derivative),
            ExplicitMethod::Ralston => {
                SecondOrderTwoStage::ralston().step(current, step_size, derivative)
            }
            ExplicitMethod::RungeKutta4 => RungeKutta4.step(current, step_size, derivative),
            ExplicitMethod::RungeKuttaThreeEighths => {
                RungeKuttaThreeEighths.step(current, step_size, derivative)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    fn identity(current: &Vec<f64>) -> Result<Vec<f64>> {
        Ok(current.clone())
    }

    fn integrate<S: ExplicitSolver>(solver: &S, steps: usize, step_size: f64) -> f64 {
        let mut current = vec![1.0];
        for _ in 0..steps {
            current = solver
                .step(&current, step_size, identity)
                .expect("step should succeed");
        }
        current[0]
    }

    #[test]
    fn every_method_underestimates_exponential_growth() {
        let e = std::f64::consts::E;
        let tolerances = [
            (ExplicitMethod::Euler, 0.3),
            (ExplicitMethod::Heun, 0.0015),
            (ExplicitMethod::Midpoint, 0.0015),
            (ExplicitMethod::Ralston, 0.0015),
            (ExplicitMethod::RungeKutta4, 1.5e-7),
            (ExplicitMethod::RungeKuttaThreeEighths, 1.5e-7),
        ];
        for (method, max_deviation) in tolerances {
            let value = integrate(&method, 20, 0.05);
            assert!(value <= e, "{} overshoots: {value}", method.name());
            assert!(
                value >= e - max_deviation,
                "{} deviates too much: {value}",
                method.name()
            );
        }
    }

    #[test]
    fn rk4_reaches_e_in_one_hundred_steps() {
        let value = integrate(&RungeKutta4, 100, 0.01);
        assert!((value - std::f64::consts::E).abs() < 1e-8);
    }

    #[test]
    fn stage_counts_match_derivative_calls() {
        for method in ExplicitMethod::ALL {
            let mut calls = 0;
            method
                .step(&vec![1.0, 2.0], 0.1, |y: &Vec<f64>| {
                    calls += 1;
                    Ok(y.clone())
                })
                .expect("step should succeed");
            assert_eq!(calls, method.stages(), "{}", method.name());
        }
    }

    #[test]
    fn second_order_family_matches_named_methods() {
        let via_family = SecondOrderTwoStage::new(0.5)
            .step(&vec![1.0], 0.1, identity)
            .expect("step should succeed");
        let via_midpoint = Midpoint
            .step(&vec![1.0], 0.1, identity)
            .expect("step should succeed");
        assert!((via_family[0] - via_midpoint[0]).abs() < 1e-12);

        let via_family = SecondOrderTwoStage::new(1.0)
            .step(&vec![1.0], 0.1, identity)
            .expect("step should succeed");
        let via_heun = Heun
            .step(&vec![1.0], 0.1, identity)
            .expect("step should succeed");
        assert!((via_family[0] - via_heun[0]).abs() < 1e-12);
    }

    #[test]
    fn derivative_of_wrong_length_is_rejected() {
        let err = RungeKutta4
            .step(&vec![1.0, 2.0], 0.1, |_: &Vec<f64>| Ok(vec![1.0]))
            .expect_err("derivative drops a component");
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn solvers_accept_nalgebra_buffers() {
        let current = DVector::from_vec(vec![1.0, -1.0]);
        let next = Heun
            .step(&current, 0.1, |y: &DVector<f64>| Ok(y * 2.0))
            .expect("step should succeed");
        let expected = 1.0 + 0.2 + 0.02;
        assert!((next[0] - expected).abs() < 1e-12);
        assert!((next[1] + expected).abs() < 1e-12);
    }

    #[test]
    fn method_names_round_trip_through_serde() {
        for method in ExplicitMethod::ALL {
            assert_eq!(ExplicitMethod::from_name(method.name()), Some(method));
            let json = serde_json::to_string(&method).expect("serialize method");
            assert_eq!(json, format!("\"{}\"", method.name()));
        }
        assert_eq!(ExplicitMethod::from_name("tsit5"), None);
    }
}
