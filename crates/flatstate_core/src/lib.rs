pub mod buffer_ops;
pub mod codec;
pub mod error;
pub mod generic_solver;
pub mod nbody;
pub mod solvers;
/// The `flatstate_core` crate flattens structured values into ordered `f64` sequences
/// and back, so that fixed-contract explicit integrators can step any structured state.
///
/// Key components:
/// - **Traits**: `Scalar` (leaf numeric type), `FloatBuffer` (flat buffer capability),
///   `ExplicitSolver` (integrator contract).
/// - **Codec**: `Descriptor` and the primitive/array/object/value combinators.
/// - **Solvers**: Explicit Runge-Kutta family (Euler, midpoint, Heun, Ralston, RK4, 3/8 rule).
/// - **Generic solver**: adapter lifting an `ExplicitSolver` to any described state type.
pub mod traits;

pub use error::{Error, Result};
