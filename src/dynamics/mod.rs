//! Bodies, integration parameters, and the constraint solver.

pub mod integration_parameters;
pub mod rigid_body;
pub mod solver;

pub use integration_parameters::IntegrationParameters;
pub use rigid_body::{BodyLocation, MassProperties, RigidBody, RigidBodyHandle};
