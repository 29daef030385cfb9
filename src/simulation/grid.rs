use crate::config::MAX_CHARGE;
use crate::simulation::cell::{BACKGROUND, QUIESCENT};

/// Grid coordinate: `x` is the column, `y` the row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Edge neighbours
const DIRECT_OFFSETS: [(isize, isize); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// Edge and corner neighbours
const TOUCHING_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Fixed-size raster of cell values in `0..=MAX_CHARGE`, stored row-major.
///
/// Every accessor panics on coordinates outside the raster: callers derive
/// coordinates from the raster's own bounds, so a miss is a bug.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    cells: Vec<u8>,
    width: usize,
    height: usize,
}

impl Raster {
    /// Create an all-background raster
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![BACKGROUND; width * height],
            width,
            height,
        }
    }

    /// Wrap existing row-major cell values
    pub fn from_cells(width: usize, height: usize, cells: Vec<u8>) -> Self {
        assert_eq!(
            cells.len(),
            width * height,
            "cell count does not match {}x{} raster",
            width,
            height
        );
        if let Some(value) = cells.iter().find(|&&value| value > MAX_CHARGE) {
            panic!("cell value {} exceeds maximum charge {}", value, MAX_CHARGE);
        }
        Self {
            cells,
            width,
            height,
        }
    }

    /// Build from equally long rows, top row first
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().len());
        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            assert_eq!(row.len(), width, "row {} has {} cells, expected {}", y, row.len(), width);
            cells.extend_from_slice(row);
        }
        Self::from_cells(width, height, cells)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major cell values
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x < self.width && point.y < self.height
    }

    /// Flat index of a point
    pub fn index(&self, point: Point) -> usize {
        assert!(
            self.contains(point),
            "point ({}, {}) outside {}x{} raster",
            point.x,
            point.y,
            self.width,
            self.height
        );
        point.y * self.width + point.x
    }

    pub fn get(&self, point: Point) -> u8 {
        self.cells[self.index(point)]
    }

    pub fn set(&mut self, point: Point, value: u8) {
        assert!(
            value <= MAX_CHARGE,
            "cell value {} exceeds maximum charge {}",
            value,
            MAX_CHARGE
        );
        let index = self.index(point);
        self.cells[index] = value;
    }

    pub fn is_conductive(&self, point: Point) -> bool {
        self.get(point) != BACKGROUND
    }

    /// Flip a cell between background and quiescent conductor
    pub fn toggle(&mut self, point: Point) {
        let value = if self.is_conductive(point) {
            BACKGROUND
        } else {
            QUIESCENT
        };
        self.set(point, value);
    }

    /// Reset every in-flight pulse to quiescent
    pub fn power_down(&mut self) {
        for cell in &mut self.cells {
            if *cell > QUIESCENT {
                *cell = QUIESCENT;
            }
        }
    }

    /// All points in row-major order
    pub fn points(&self) -> impl Iterator<Item = Point> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| Point::new(x, y)))
    }

    /// Edge neighbours of a point, clipped to the raster
    pub fn direct_neighbors(&self, point: Point) -> impl Iterator<Item = Point> + '_ {
        self.offset_neighbors(point, &DIRECT_OFFSETS)
    }

    /// Edge and corner neighbours of a point, clipped to the raster
    pub fn touching_neighbors(&self, point: Point) -> impl Iterator<Item = Point> + '_ {
        self.offset_neighbors(point, &TOUCHING_OFFSETS)
    }

    fn offset_neighbors<'a>(
        &'a self,
        point: Point,
        offsets: &'static [(isize, isize)],
    ) -> impl Iterator<Item = Point> + 'a {
        assert!(self.contains(point), "point ({}, {}) outside raster", point.x, point.y);
        offsets.iter().filter_map(move |&(dx, dy)| {
            let x = point.x.checked_add_signed(dx)?;
            let y = point.y.checked_add_signed(dy)?;
            let neighbor = Point::new(x, y);
            self.contains(neighbor).then_some(neighbor)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster = Raster::new(100, 100);
        assert_eq!(raster.cells().len(), 10000);
        assert!(raster.cells().iter().all(|&cell| cell == BACKGROUND));
    }

    #[test]
    fn test_from_rows_layout() {
        let raster = Raster::from_rows(&[[0u8, 1, 2], [3, 4, 5]]);
        assert_eq!(raster.width(), 3);
        assert_eq!(raster.height(), 2);
        assert_eq!(raster.get(Point::new(2, 0)), 2);
        assert_eq!(raster.get(Point::new(0, 1)), 3);
        assert_eq!(raster.index(Point::new(1, 1)), 4);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_out_of_range_read_panics() {
        let raster = Raster::new(4, 4);
        raster.get(Point::new(4, 0));
    }

    #[test]
    #[should_panic(expected = "exceeds maximum charge")]
    fn test_out_of_range_value_panics() {
        let mut raster = Raster::new(2, 2);
        raster.set(Point::new(0, 0), MAX_CHARGE + 1);
    }

    #[test]
    #[should_panic(expected = "row 1")]
    fn test_ragged_rows_panic() {
        let rows: [&[u8]; 2] = [&[1, 1], &[1]];
        Raster::from_rows(&rows);
    }

    #[test]
    fn test_toggle() {
        let mut raster = Raster::from_rows(&[[0u8, 1, 5]]);
        raster.toggle(Point::new(0, 0));
        raster.toggle(Point::new(1, 0));
        raster.toggle(Point::new(2, 0));
        assert_eq!(raster.cells(), &[QUIESCENT, BACKGROUND, BACKGROUND]);
    }

    #[test]
    fn test_power_down() {
        let mut raster = Raster::from_rows(&[[0u8, 1, 2, 7]]);
        raster.power_down();
        assert_eq!(raster.cells(), &[0, 1, 1, 1]);
    }

    #[test]
    fn test_direct_neighbors_clipped_at_corner() {
        let raster = Raster::new(3, 3);
        let corner: Vec<_> = raster.direct_neighbors(Point::new(0, 0)).collect();
        assert_eq!(corner, vec![Point::new(1, 0), Point::new(0, 1)]);
        assert_eq!(raster.direct_neighbors(Point::new(1, 1)).count(), 4);
    }

    #[test]
    fn test_touching_neighbors_do_not_wrap() {
        let raster = Raster::new(3, 3);
        assert_eq!(raster.touching_neighbors(Point::new(1, 1)).count(), 8);
        assert_eq!(raster.touching_neighbors(Point::new(2, 2)).count(), 3);
        assert!(raster
            .touching_neighbors(Point::new(2, 0))
            .all(|p| p.x >= 1 && p.y <= 1));
    }

    #[test]
    fn test_points_row_major() {
        let raster = Raster::new(2, 2);
        let points: Vec<_> = raster.points().collect();
        assert_eq!(
            points,
            vec![
                Point::new(0, 0),
                Point::new(1, 0),
                Point::new(0, 1),
                Point::new(1, 1)
            ]
        );
    }
}
