//! WebAssembly bindings for `flatstate_core`.
//!
//! Exposes the explicit integrators over `Float64Array` state and the n-body
//! demonstration model.

mod buffer;
mod nbody;
mod solver;

pub use buffer::Float64Buffer;
pub use nbody::WasmSolarSystem;
pub use solver::WasmExplicitSolver;
