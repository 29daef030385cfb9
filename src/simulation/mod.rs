//! Wire extraction and the generation-by-generation step engine.

mod cell;
mod circuit;
mod engine;
mod grid;

pub use cell::{Charge, BACKGROUND, PEAK, QUIESCENT};
pub use circuit::{extract, Bounds, Circuit, Wire};
pub use engine::{step, Simulation, State};
pub use grid::{Point, Raster};
