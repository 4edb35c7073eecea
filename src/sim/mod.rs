pub mod config;
pub mod handler;
pub mod report;
pub mod setup;
pub mod simulation;

pub use config::{ChildRestart, SimulationConfig};
pub use handler::{LossCounter, NoopHandler, TerminationHandler};
pub use report::Report;
pub use setup::{Capabilities, Instrument, Setup, Stage};
pub use simulation::{Simulation, SimulationProgress, SimulationStats};
