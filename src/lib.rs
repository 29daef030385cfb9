//! Digital logic drawn as pixel art.
//!
//! A [`Raster`](simulation::Raster) of cell values is split into wires, and a
//! [`Simulation`](simulation::Simulation) advances the charge on those wires
//! one generation at a time. Pulses start at [`PEAK`](simulation::PEAK), decay
//! up to [`MAX_CHARGE`](config::MAX_CHARGE) and only the peak triggers a
//! quiescent neighbour, which gives directional, delay-based propagation.
//!
//! ```
//! use wired_logic::simulation::{Point, Raster, Simulation};
//!
//! let raster = Raster::from_rows(&[
//!     [2u8, 0, 1],
//!     [0, 1, 0],
//! ]);
//! let sim = Simulation::new(&raster);
//! let next = sim.step();
//! let stem = next.circuit().wire_at(Point::new(1, 1)).unwrap();
//! assert_eq!(next.charge(stem).value(), 2);
//! ```

pub mod config;
pub mod export;
pub mod simulation;
