//! Gravitational n-body model integrated through the generic explicit solver.
//!
//! Celestial bodies attract each other and the asteroids; asteroids are test
//! particles that neither attract each other nor act back on celestial bodies.
//! Masses and the gravity constant are parameters and never enter the flat state.

use crate::codec::{array, float, ObjectDescriptor, ValueDescriptor};
use crate::error::Result;
use crate::generic_solver::GenericExplicitSolver;
use crate::object_descriptor;
use crate::solvers::ExplicitMethod;
use anyhow::bail;
use nalgebra::Vector3;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub mass: f64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub force: Vector3<f64>,
}

impl Body {
    pub fn new(mass: f64, position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self {
            mass,
            position,
            velocity,
            force: Vector3::zeros(),
        }
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolarSystem {
    pub gravity_constant: f64,
    pub celestial_bodies: Vec<Body>,
    pub asteroids: Vec<Body>,
}

impl SolarSystem {
    pub fn new(
        gravity_constant: f64,
        celestial_bodies: Vec<Body>,
        asteroids: Vec<Body>,
    ) -> anyhow::Result<Self> {
        if !gravity_constant.is_finite() {
            bail!("Gravity constant must be finite.");
        }
        for (kind, bodies) in [("Celestial body", &celestial_bodies), ("Asteroid", &asteroids)] {
            for (index, body) in bodies.iter().enumerate() {
                if !(body.mass.is_finite() && body.mass > 0.0) {
                    bail!("{kind} {index} must have a positive finite mass, got {}.", body.mass);
                }
                if !(body.position.iter().all(|v| v.is_finite())
                    && body.velocity.iter().all(|v| v.is_finite()))
                {
                    bail!("{kind} {index} has a non-finite position or velocity.");
                }
            }
        }
        Ok(Self {
            gravity_constant,
            celestial_bodies,
            asteroids,
        })
    }

    pub fn for_each_body_mut(&mut self, mut action: impl FnMut(&mut Body)) {
        self.celestial_bodies.iter_mut().for_each(&mut action);
        self.asteroids.iter_mut().for_each(&mut action);
    }

    /// Kinetic plus potential energy of the celestial bodies.
    pub fn celestial_energy(&self) -> f64 {
        let bodies = &self.celestial_bodies;
        let kinetic: f64 = bodies.iter().map(Body::kinetic_energy).sum();
        let mut potential = 0.0;
        for i in 0..bodies.len() {
            for j in 0..i {
                let distance = (bodies[j].position - bodies[i].position).norm();
                potential -= self.gravity_constant * bodies[i].mass * bodies[j].mass / distance;
            }
        }
        kinetic + potential
    }

    /// Total linear momentum of the celestial bodies.
    pub fn celestial_momentum(&self) -> Vector3<f64> {
        self.celestial_bodies
            .iter()
            .fold(Vector3::zeros(), |accum, body| accum + body.velocity * body.mass)
    }
}

/// Constructor parameters of a `Vector3`.
#[derive(Debug, Default)]
pub struct Vector3Params {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// `Vector3` is rebuilt from its components rather than updated in place.
pub fn vector3_descriptor() -> ValueDescriptor<Vector3<f64>, Vector3Params> {
    ValueDescriptor::builder(|p: Vector3Params| Vector3::new(p.x, p.y, p.z))
        .property("x", float(), |v: &Vector3<f64>| v.x, |p: &mut Vector3Params, x| p.x = x)
        .property("y", float(), |v: &Vector3<f64>| v.y, |p: &mut Vector3Params, y| p.y = y)
        .property("z", float(), |v: &Vector3<f64>| v.z, |p: &mut Vector3Params, z| p.z = z)
        .build()
}

pub fn body_descriptor() -> ObjectDescriptor<Body> {
    let vector = vector3_descriptor();
    object_descriptor!(Body {
        position: vector.clone(),
        velocity: vector.clone(),
        force: vector,
    })
}

pub fn solar_system_descriptor() -> ObjectDescriptor<SolarSystem> {
    let body = body_descriptor();
    object_descriptor!(SolarSystem {
        celestial_bodies: array(body.clone()),
        asteroids: array(body),
    })
}

fn derive_position_and_velocity(body: &mut Body) {
    body.position = body.velocity;
    // a = F / m
    body.velocity = body.force / body.mass;
}

/// Time derivative of the system: positions become velocities and velocities
/// become accelerations.
pub fn derivative(mut system: SolarSystem) -> SolarSystem {
    let gravity_constant = system.gravity_constant;
    system.for_each_body_mut(|b| b.force = Vector3::zeros());

    let SolarSystem {
        celestial_bodies,
        asteroids,
        ..
    } = &mut system;
    for i in 0..celestial_bodies.len() {
        // each pair once, j < i
        for j in 0..i {
            let diff = celestial_bodies[j].position - celestial_bodies[i].position;
            let distance_square = diff.dot(&diff);
            let gravity = diff
                * (gravity_constant * celestial_bodies[i].mass * celestial_bodies[j].mass
                    / distance_square.powf(1.5));
            celestial_bodies[i].force += gravity;
            celestial_bodies[j].force -= gravity;
        }
        let body = &celestial_bodies[i];
        for asteroid in asteroids.iter_mut() {
            let diff = body.position - asteroid.position;
            let distance_square = diff.dot(&diff);
            asteroid.force +=
                diff * (gravity_constant * body.mass * asteroid.mass / distance_square.powf(1.5));
        }
    }

    system.for_each_body_mut(derive_position_and_velocity);
    system
}

/// Steps a [`SolarSystem`] with one of the built-in explicit methods.
pub struct SolarSystemSimulation {
    solver: GenericExplicitSolver<ObjectDescriptor<SolarSystem>, ExplicitMethod>,
}

impl SolarSystemSimulation {
    pub fn new(method: ExplicitMethod) -> Self {
        Self {
            solver: GenericExplicitSolver::new(solar_system_descriptor(), method),
        }
    }

    pub fn method(&self) -> ExplicitMethod {
        *self.solver.solver()
    }

    pub fn step(&self, system: &SolarSystem, dt: f64) -> Result<SolarSystem> {
        self.solver.step(system, dt, derivative)
    }
}
