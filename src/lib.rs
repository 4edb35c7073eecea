pub mod detectors;
pub mod error;
pub mod geom;
pub mod optics;
pub mod ray;
pub mod sim;
pub mod source;
pub mod vecutils;

// Prelude
pub use error::ConfigError;
pub use ray::{Ray, RayFactory};
pub use sim::{Report, Setup, Simulation, SimulationConfig};
