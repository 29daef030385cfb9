use std::sync::Arc;

use crate::simulation::cell::Charge;
use crate::simulation::circuit::{extract, Circuit, Wire};
use crate::simulation::grid::Raster;

/// Charge of every wire in one generation, indexed by wire index
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
    charges: Vec<Charge>,
}

impl State {
    pub(crate) fn from_charges(charges: Vec<Charge>) -> Self {
        Self { charges }
    }

    pub fn len(&self) -> usize {
        self.charges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }

    pub fn charge(&self, index: usize) -> Charge {
        self.charges[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = Charge> + '_ {
        self.charges.iter().copied()
    }
}

/// Advance every wire by one generation.
///
/// Each transition reads only `state`; the result goes into a fresh buffer, so
/// wire order never affects the outcome.
pub fn step(circuit: &Circuit, state: &State) -> State {
    assert_eq!(
        state.len(),
        circuit.len(),
        "state has {} charges but circuit has {} wires",
        state.len(),
        circuit.len()
    );

    let charges = state
        .charges
        .iter()
        .enumerate()
        .map(|(index, &charge)| {
            let triggered = charge.is_quiescent()
                && circuit
                    .neighbors(index)
                    .iter()
                    .any(|&neighbor| state.charges[neighbor].is_peak());
            charge.next(triggered)
        })
        .collect();

    State { charges }
}

/// One generation: a shared circuit plus its current state.
///
/// Stepping never touches the receiver, so older generations stay valid for
/// diffing against newer ones.
#[derive(Clone, Debug)]
pub struct Simulation {
    circuit: Arc<Circuit>,
    state: State,
    generation: u64,
}

impl Simulation {
    /// Generation zero of the circuit drawn in `raster`
    pub fn new(raster: &Raster) -> Self {
        let (circuit, state) = extract(raster);
        Self {
            circuit: Arc::new(circuit),
            state,
            generation: 0,
        }
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Steps taken since extraction
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Charge of a wire of this circuit; panics on a wire from another circuit
    pub fn charge(&self, wire: &Wire) -> Charge {
        assert!(
            self.circuit.wires().get(wire.index()) == Some(wire),
            "wire {} does not belong to this circuit",
            wire.index()
        );
        self.state.charge(wire.index())
    }

    /// Next generation over the same circuit
    pub fn step(&self) -> Simulation {
        Simulation {
            circuit: Arc::clone(&self.circuit),
            state: step(&self.circuit, &self.state),
            generation: self.generation + 1,
        }
    }

    /// Wires whose charge differs from `previous`, which must share this circuit
    pub fn changed_wires<'a>(
        &'a self,
        previous: &'a Simulation,
    ) -> impl Iterator<Item = &'a Wire> + 'a {
        assert!(
            Arc::ptr_eq(&self.circuit, &previous.circuit),
            "generations belong to different circuits"
        );
        self.circuit
            .wires()
            .iter()
            .filter(move |wire| {
                self.state.charge(wire.index()) != previous.state.charge(wire.index())
            })
    }

    /// Paint every wire's charge onto its cells
    pub fn draw(&self, raster: &mut Raster) {
        self.check_raster(raster);
        for wire in self.circuit.wires() {
            paint(wire, self.state.charge(wire.index()), raster);
        }
    }

    /// Paint only the wires that changed since `previous`
    pub fn draw_changes(&self, previous: &Simulation, raster: &mut Raster) {
        self.check_raster(raster);
        for wire in self.changed_wires(previous) {
            paint(wire, self.state.charge(wire.index()), raster);
        }
    }

    fn check_raster(&self, raster: &Raster) {
        assert!(
            raster.width() == self.circuit.width() && raster.height() == self.circuit.height(),
            "{}x{} raster does not match {}x{} circuit",
            raster.width(),
            raster.height(),
            self.circuit.width(),
            self.circuit.height()
        );
    }
}

fn paint(wire: &Wire, charge: Charge, raster: &mut Raster) {
    for &pixel in wire.pixels() {
        raster.set(pixel, charge.value());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_CHARGE;
    use crate::simulation::cell::{PEAK, QUIESCENT};
    use crate::simulation::grid::Point;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn charge_at(sim: &Simulation, x: usize, y: usize) -> u8 {
        let wire = sim.circuit().wire_at(Point::new(x, y)).unwrap();
        sim.charge(wire).value()
    }

    #[test]
    fn test_staircase_chain_propagates() {
        // Three single-cell wires touching corner to corner
        let raster = Raster::from_rows(&[
            [2u8, 0, 0],
            [0, 1, 0],
            [0, 0, 1],
        ]);
        let sim = Simulation::new(&raster);
        assert_eq!(sim.circuit().len(), 3);

        let first = sim.step();
        assert_eq!(
            (charge_at(&first, 0, 0), charge_at(&first, 1, 1), charge_at(&first, 2, 2)),
            (3, 2, 1)
        );

        let second = first.step();
        assert_eq!(
            (charge_at(&second, 0, 0), charge_at(&second, 1, 1), charge_at(&second, 2, 2)),
            (4, 3, 2)
        );
    }

    #[test]
    fn test_contiguous_row_is_one_wire() {
        let raster = Raster::from_rows(&[[2u8, 1, 1]]);
        let sim = Simulation::new(&raster);
        assert_eq!(sim.circuit().len(), 1);
        assert_eq!(charge_at(&sim, 2, 0), PEAK);
        assert_eq!(charge_at(&sim.step(), 0, 0), 3);
    }

    #[test]
    fn test_disjoint_segments_never_charge() {
        let raster = Raster::from_rows(&[[2u8, 2, 0, 1, 1]]);
        let mut sim = Simulation::new(&raster);
        for _ in 0..50 {
            sim = sim.step();
            assert_eq!(charge_at(&sim, 3, 0), QUIESCENT);
            assert_eq!(charge_at(&sim, 4, 0), QUIESCENT);
        }
    }

    #[test]
    fn test_y_junction() {
        let raster = Raster::from_rows(&[
            [2u8, 0, 1],
            [0, 1, 0],
            [0, 1, 0],
        ]);
        let sim = Simulation::new(&raster);
        let next = sim.step();
        assert_eq!(charge_at(&next, 1, 2), PEAK);
        assert_eq!(charge_at(&next, 2, 0), QUIESCENT);
        assert_eq!(charge_at(&next, 0, 0), 3);

        // The stem's peak reaches the other branch one step later
        let after = next.step();
        assert_eq!(charge_at(&after, 2, 0), PEAK);
        // The source branch is mid-decay and is not re-armed
        assert_eq!(charge_at(&after, 0, 0), 4);
    }

    #[test]
    fn test_decay_cycle_length() {
        let raster = Raster::from_rows(&[[0u8, 2, 0]]);
        let mut sim = Simulation::new(&raster);
        for _ in 0..MAX_CHARGE - 1 {
            assert_ne!(charge_at(&sim, 1, 0), QUIESCENT);
            sim = sim.step();
        }
        assert_eq!(charge_at(&sim, 1, 0), QUIESCENT);
        assert_eq!(sim.generation(), u64::from(MAX_CHARGE - 1));
    }

    #[test]
    fn test_quiescent_fixed_point() {
        let raster = Raster::from_rows(&[
            [1u8, 0, 1, 1],
            [0, 1, 0, 0],
            [1, 0, 1, 1],
        ]);
        let sim = Simulation::new(&raster);
        let next = sim.step();
        assert_eq!(next.state(), sim.state());
        assert_eq!(next.changed_wires(&sim).count(), 0);
    }

    #[test]
    fn test_empty_step() {
        let sim = Simulation::new(&Raster::new(5, 5));
        let next = sim.step();
        assert!(next.state().is_empty());
        assert_eq!(next.generation(), 1);
    }

    #[test]
    fn test_step_deterministic_on_random_circuits() {
        let mut rng = StdRng::seed_from_u64(1234);
        for _ in 0..10 {
            let cells = (0..32 * 32)
                .map(|_| if rng.gen_bool(0.45) { rng.gen_range(1..=MAX_CHARGE) } else { 0 })
                .collect();
            let raster = Raster::from_cells(32, 32, cells);
            let (circuit, state) = extract(&raster);
            let mut current = state;
            for _ in 0..20 {
                let a = step(&circuit, &current);
                let b = step(&circuit, &current);
                assert_eq!(a, b);
                assert!(a.iter().all(|c| (QUIESCENT..=MAX_CHARGE).contains(&c.value())));
                current = a;
            }
        }
    }

    #[test]
    fn test_previous_generation_untouched() {
        let raster = Raster::from_rows(&[[2u8, 0, 0], [0, 1, 0]]);
        let sim = Simulation::new(&raster);
        let before = sim.state().clone();
        let next = sim.step();
        assert_eq!(sim.state(), &before);
        assert_eq!(sim.generation(), 0);
        assert!(std::ptr::eq(sim.circuit(), next.circuit()));
    }

    #[test]
    fn test_draw_changes_only_repaints_changed_wires() {
        let mut raster = Raster::from_rows(&[
            [2u8, 0, 0, 0],
            [0, 1, 0, 1],
        ]);
        let sim = Simulation::new(&raster);
        let next = sim.step();

        let changed: Vec<_> = next.changed_wires(&sim).map(Wire::index).collect();
        assert_eq!(changed, vec![0, 1]);

        // Mark the untouched wire so a full repaint would be visible
        raster.set(Point::new(3, 1), 5);
        next.draw_changes(&sim, &mut raster);
        assert_eq!(raster.cells(), &[3, 0, 0, 0, 0, 2, 0, 5]);

        next.draw(&mut raster);
        assert_eq!(raster.cells(), &[3, 0, 0, 0, 0, 2, 0, 1]);
    }

    #[test]
    fn test_draw_normalizes_mixed_wire() {
        let mut raster = Raster::from_rows(&[[1u8, 3, 1]]);
        Simulation::new(&raster).draw(&mut raster);
        assert_eq!(raster.cells(), &[3, 3, 3]);
    }

    #[test]
    #[should_panic(expected = "does not belong to this circuit")]
    fn test_charge_rejects_wire_from_other_circuit() {
        let a = Simulation::new(&Raster::from_rows(&[[2u8, 0, 1]]));
        let b = Simulation::new(&Raster::from_rows(&[[1u8, 0, 0], [0, 0, 1]]));
        // Index 1 exists in both circuits but covers different cells
        let foreign = b.circuit().wire_at(Point::new(2, 1)).unwrap();
        a.charge(foreign);
    }

    #[test]
    fn test_charge_accepts_cloned_wire() {
        let sim = Simulation::new(&Raster::from_rows(&[[2u8, 0, 1]]));
        let wire = sim.circuit().wire(0).clone();
        assert_eq!(sim.charge(&wire), Charge::PEAK);
    }

    #[test]
    #[should_panic(expected = "different circuits")]
    fn test_changed_wires_rejects_foreign_generation() {
        let raster = Raster::from_rows(&[[1u8]]);
        let a = Simulation::new(&raster);
        let b = Simulation::new(&raster);
        let _ = b.changed_wires(&a).count();
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn test_draw_rejects_mismatched_raster() {
        let sim = Simulation::new(&Raster::new(3, 3));
        sim.draw(&mut Raster::new(4, 3));
    }

    #[test]
    #[should_panic(expected = "charges but circuit has")]
    fn test_step_rejects_foreign_state() {
        let (circuit, _) = extract(&Raster::from_rows(&[[1u8, 0, 1]]));
        let (_, other) = extract(&Raster::from_rows(&[[1u8]]));
        step(&circuit, &other);
    }

    #[test]
    fn test_simulation_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Simulation>();
    }
}
