//! n-body model runner exposed to JavaScript.

use crate::solver::parse_method;
use flatstate_core::generic_solver::{integrate, IntegrationSettings};
use flatstate_core::nbody::{
    derivative, solar_system_descriptor, Body, SolarSystem, SolarSystemSimulation,
};
use nalgebra::Vector3;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmSolarSystem {
    system: SolarSystem,
    simulation: SolarSystemSimulation,
}

/// Snapshot handed to the renderer after each step.
#[derive(Serialize)]
struct SolarSystemSnapshot {
    positions: Vec<f64>,
    velocities: Vec<f64>,
    celestial_energy: f64,
}

fn vector_at(values: &[f64], index: usize) -> Vector3<f64> {
    Vector3::new(values[3 * index], values[3 * index + 1], values[3 * index + 2])
}

fn flatten<'a>(vectors: impl Iterator<Item = &'a Vector3<f64>>) -> Vec<f64> {
    vectors.flat_map(|v| [v.x, v.y, v.z]).collect()
}

#[wasm_bindgen]
impl WasmSolarSystem {
    /// Bodies are given as parallel flat arrays; the last `asteroid_count`
    /// bodies are asteroids.
    #[wasm_bindgen(constructor)]
    pub fn new(
        gravity_constant: f64,
        masses: Vec<f64>,
        positions: Vec<f64>,
        velocities: Vec<f64>,
        asteroid_count: u32,
        method_name: &str,
    ) -> Result<WasmSolarSystem, JsValue> {
        console_error_panic_hook::set_once();

        let count = masses.len();
        if positions.len() != 3 * count || velocities.len() != 3 * count {
            return Err(JsValue::from_str(&format!(
                "Invalid positions.len() or velocities.len(): expected {} for {} bodies.",
                3 * count,
                count
            )));
        }
        let asteroid_count = asteroid_count as usize;
        if asteroid_count > count {
            return Err(JsValue::from_str("asteroid_count exceeds the number of bodies."));
        }

        let mut bodies: Vec<Body> = masses
            .iter()
            .enumerate()
            .map(|(i, &mass)| Body::new(mass, vector_at(&positions, i), vector_at(&velocities, i)))
            .collect();
        let asteroids = bodies.split_off(count - asteroid_count);
        let system = SolarSystem::new(gravity_constant, bodies, asteroids)
            .map_err(|e| JsValue::from_str(&format!("Invalid solar system: {}", e)))?;

        Ok(WasmSolarSystem {
            system,
            simulation: SolarSystemSimulation::new(parse_method(method_name)?),
        })
    }

    pub fn body_count(&self) -> u32 {
        (self.system.celestial_bodies.len() + self.system.asteroids.len()) as u32
    }

    pub fn step(&mut self, dt: f64) -> Result<(), JsValue> {
        self.system = self
            .simulation
            .step(&self.system, dt)
            .map_err(|e| JsValue::from_str(&format!("Step failed: {}", e)))?;
        Ok(())
    }

    /// Runs several steps configured by a serialized `IntegrationSettings`.
    pub fn advance(&mut self, settings: JsValue) -> Result<(), JsValue> {
        let settings: IntegrationSettings = from_value(settings)
            .map_err(|e| JsValue::from_str(&format!("Invalid settings: {}", e)))?;
        self.system = integrate(
            solar_system_descriptor(),
            self.system.clone(),
            &settings,
            derivative,
        )
        .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
        Ok(())
    }

    pub fn positions(&self) -> Vec<f64> {
        flatten(self.bodies().map(|b| &b.position))
    }

    pub fn velocities(&self) -> Vec<f64> {
        flatten(self.bodies().map(|b| &b.velocity))
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let snapshot = SolarSystemSnapshot {
            positions: self.positions(),
            velocities: self.velocities(),
            celestial_energy: self.system.celestial_energy(),
        };
        to_value(&snapshot).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

impl WasmSolarSystem {
    fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.system
            .celestial_bodies
            .iter()
            .chain(self.system.asteroids.iter())
    }
}
