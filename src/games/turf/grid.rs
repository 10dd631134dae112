//! Rectangular row-major grids with quarter-turn rotation.

use super::cell::Cell;
use tracing::instrument;

/// Default board width.
pub const DEFAULT_WIDTH: usize = 8;

/// Default board height.
pub const DEFAULT_HEIGHT: usize = 8;

/// A fixed-size grid, origin top-left, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Copy + Default> Grid<T> {
    /// Creates a grid filled with `T::default()`.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }
}

impl<T: Copy> Grid<T> {
    /// Creates a grid with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            cells: vec![value; width * height],
        }
    }

    /// Builds a grid from rows. Returns `None` if the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }
        Some(Self {
            width,
            height,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Returns the cell at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: i32, y: i32) -> Option<T> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Writes `value` at `(x, y)`. Returns false (and writes nothing) outside the grid.
    pub fn set(&mut self, x: i32, y: i32, value: T) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// Iterates `(x, y, value)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, T)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, v)| ((i % width) as i32, (i / width) as i32, *v))
    }

    /// Applies `f` to every cell.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(|v| f(*v)).collect(),
        }
    }

    /// Copies the grid out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.cells
            .chunks(self.width.max(1))
            .map(<[T]>::to_vec)
            .collect()
    }

    /// Rotates `turns` quarter turns clockwise. Any integer is accepted and
    /// normalised mod 4, so negative turns rotate counter-clockwise.
    #[instrument(skip(self), fields(width = self.width, height = self.height))]
    pub fn rotate(&self, turns: i32) -> Self {
        match turns.rem_euclid(4) {
            0 => self.clone(),
            1 => self.rotate_clockwise(),
            2 => self.rotate_180(),
            _ => self.rotate_clockwise().rotate_180(),
        }
    }

    /// Half turn. Keeps the dimensions.
    pub fn rotate_180(&self) -> Self {
        let mut cells = self.cells.clone();
        cells.reverse();
        Self {
            width: self.width,
            height: self.height,
            cells,
        }
    }

    fn rotate_clockwise(&self) -> Self {
        let (w, h) = (self.height, self.width);
        let mut cells = Vec::with_capacity(self.cells.len());
        for y in 0..h {
            for x in 0..w {
                cells.push(self.cells[(self.height - 1 - x) * self.width + y]);
            }
        }
        Self {
            width: w,
            height: h,
            cells,
        }
    }
}

impl Grid<Cell> {
    /// True if `(x, y)` lies outside the grid or on an out-of-bounds cell.
    pub fn is_off_board(&self, x: i32, y: i32) -> bool {
        !matches!(self.get(x, y), Some(cell) if cell != Cell::OutOfBounds)
    }

    /// Number of non-empty cells.
    pub fn count_filled(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    /// True if any in-board neighbour of `(x, y)` (8-neighbourhood) satisfies `check`.
    pub fn any_neighbor(&self, x: i32, y: i32, check: impl Fn(Cell) -> bool) -> bool {
        (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| (dx, dy) != (0, 0))
            .filter(|&(dx, dy)| !self.is_off_board(x + dx, y + dy))
            .filter_map(|(dx, dy)| self.get(x + dx, y + dy))
            .any(check)
    }
}

/// Creates an all-empty board grid.
pub fn create_grid(width: usize, height: usize) -> Grid<Cell> {
    Grid::new(width, height)
}
