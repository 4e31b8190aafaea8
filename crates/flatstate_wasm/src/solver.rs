//! Explicit integrators callable from JavaScript.

use crate::buffer::Float64Buffer;
use flatstate_core::solvers::ExplicitMethod;
use flatstate_core::traits::ExplicitSolver;
use flatstate_core::Error;
use js_sys::{Float64Array, Function};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen]
pub struct WasmExplicitSolver {
    method: ExplicitMethod,
}

pub(crate) fn parse_method(method_name: &str) -> Result<ExplicitMethod, JsValue> {
    ExplicitMethod::from_name(method_name)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown solver: {method_name}")))
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Invokes a JS derivative on a copy of `candidate` and copies its result, so
/// neither side can observe later writes to the other's arrays.
fn call_derivative(
    derivative: &Function,
    candidate: &Float64Buffer,
) -> flatstate_core::Result<Float64Buffer> {
    let returned = derivative
        .call1(&JsValue::NULL, &candidate.detached_copy())
        .map_err(|err| Error::Derivative(describe(&err)))?;
    let array = returned
        .dyn_into::<Float64Array>()
        .map_err(|_| Error::Derivative("derivative must return a Float64Array".to_string()))?;
    Ok(Float64Buffer::new(array).detached())
}

#[wasm_bindgen]
impl WasmExplicitSolver {
    #[wasm_bindgen(constructor)]
    pub fn new(method_name: &str) -> Result<WasmExplicitSolver, JsValue> {
        console_error_panic_hook::set_once();
        Ok(WasmExplicitSolver {
            method: parse_method(method_name)?,
        })
    }

    pub fn method_name(&self) -> String {
        self.method.name().to_string()
    }

    pub fn stages(&self) -> u32 {
        self.method.stages() as u32
    }

    /// Advances `state` by one step. `derivative` maps a `Float64Array` to a
    /// `Float64Array` of the same length.
    pub fn step(
        &self,
        state: Float64Array,
        step_size: f64,
        derivative: &Function,
    ) -> Result<Float64Array, JsValue> {
        let current = Float64Buffer::new(state);
        let next = self
            .method
            .step(&current, step_size, |candidate: &Float64Buffer| {
                call_derivative(derivative, candidate)
            })
            .map_err(|e| JsValue::from_str(&format!("Step failed: {}", e)))?;
        Ok(next.into_inner())
    }
}
