use std::collections::BTreeSet;

use crate::simulation::cell::{Charge, QUIESCENT};
use crate::simulation::engine::State;
use crate::simulation::grid::{Point, Raster};

/// Axis-aligned rectangle: `min` inclusive, `max` exclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn width(&self) -> usize {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> usize {
        self.max.y - self.min.y
    }

    pub fn contains(&self, point: Point) -> bool {
        (self.min.x..self.max.x).contains(&point.x) && (self.min.y..self.max.y).contains(&point.y)
    }
}

/// Maximal edge-connected set of conductive cells, one electrical unit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wire {
    index: usize,
    pixels: Vec<Point>,
    bounds: Bounds,
}

impl Wire {
    fn new(index: usize, mut pixels: Vec<Point>) -> Self {
        debug_assert!(!pixels.is_empty());
        pixels.sort_unstable_by_key(|p| (p.y, p.x));

        let mut min = pixels[0];
        let mut max = pixels[0];
        for p in &pixels {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        let bounds = Bounds {
            min,
            max: Point::new(max.x + 1, max.y + 1),
        };

        Self {
            index,
            pixels,
            bounds,
        }
    }

    /// Position in the owning circuit; not stable across rebuilds
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cells of the wire in row-major order
    pub fn pixels(&self) -> &[Point] {
        &self.pixels
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// Static topology of one raster snapshot: wires and which of them touch.
#[derive(Debug, PartialEq, Eq)]
pub struct Circuit {
    width: usize,
    height: usize,
    wires: Vec<Wire>,
    /// Sorted indices of the wires adjacent to each wire
    neighbors: Vec<Vec<usize>>,
    /// Wire index per cell, `None` for background
    labels: Vec<Option<usize>>,
}

impl Circuit {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    pub fn len(&self) -> usize {
        self.wires.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wires.is_empty()
    }

    pub fn wire(&self, index: usize) -> &Wire {
        &self.wires[index]
    }

    /// Wires adjacent to `index`, ascending
    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.neighbors[index]
    }

    pub fn is_adjacent(&self, a: usize, b: usize) -> bool {
        self.neighbors[a].binary_search(&b).is_ok()
    }

    /// Number of undirected adjacent pairs
    pub fn adjacency_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Wire covering a cell, `None` on background
    pub fn wire_at(&self, point: Point) -> Option<&Wire> {
        assert!(
            point.x < self.width && point.y < self.height,
            "point ({}, {}) outside {}x{} circuit",
            point.x,
            point.y,
            self.width,
            self.height
        );
        self.labels[point.y * self.width + point.x].map(|index| &self.wires[index])
    }
}

/// Derive the circuit and its initial state from a raster.
///
/// Wires are flood-filled over edge neighbours in row-major discovery order.
/// Distinct wires can only meet at corners (an edge contact would have merged
/// them), so adjacency is collected over the full 8-neighbourhood. A wire
/// starts with the highest value found among its cells.
pub fn extract(raster: &Raster) -> (Circuit, State) {
    let mut labels: Vec<Option<usize>> = vec![None; raster.width() * raster.height()];
    let mut wires = Vec::new();
    let mut charges = Vec::new();
    let mut stack = Vec::new();

    for origin in raster.points() {
        let slot = raster.index(origin);
        if labels[slot].is_some() || !raster.is_conductive(origin) {
            continue;
        }

        let index = wires.len();
        let mut pixels = Vec::new();
        let mut seed = QUIESCENT;
        labels[slot] = Some(index);
        stack.push(origin);

        while let Some(point) = stack.pop() {
            seed = seed.max(raster.get(point));
            pixels.push(point);
            for neighbor in raster.direct_neighbors(point) {
                let slot = raster.index(neighbor);
                if labels[slot].is_none() && raster.is_conductive(neighbor) {
                    labels[slot] = Some(index);
                    stack.push(neighbor);
                }
            }
        }

        wires.push(Wire::new(index, pixels));
        charges.push(Charge::new(seed));
    }

    let mut pairs = BTreeSet::new();
    for point in raster.points() {
        let Some(a) = labels[raster.index(point)] else {
            continue;
        };
        for neighbor in raster.touching_neighbors(point) {
            if let Some(b) = labels[raster.index(neighbor)] {
                if a != b {
                    pairs.insert((a.min(b), a.max(b)));
                }
            }
        }
    }

    let mut neighbors = vec![Vec::new(); wires.len()];
    for &(a, b) in &pairs {
        neighbors[a].push(b);
        neighbors[b].push(a);
    }
    for list in &mut neighbors {
        list.sort_unstable();
    }

    log::debug!(
        "Extracted {} wires with {} adjacencies from {}x{} raster",
        wires.len(),
        pairs.len(),
        raster.width(),
        raster.height()
    );

    let circuit = Circuit {
        width: raster.width(),
        height: raster.height(),
        wires,
        neighbors,
        labels,
    };
    (circuit, State::from_charges(charges))
}
