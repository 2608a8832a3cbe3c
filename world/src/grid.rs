//! Square coordinate lattice shared by every level.

use carrot_hop_core::{to_units, Coordinate, GameConfig, GridError, PathIndex};

/// Smallest increment that keeps neighbouring cells distinct after rounding.
const MIN_STEP_UNITS: i64 = 1;

/// Largest number of cells along one lattice axis.
pub const MAX_CELLS_PER_AXIS: u64 = 1_001;

/// Validated description of a square lattice centred on the origin.
///
/// Both the half-extent and the increment are held in coordinate units, so
/// every derived cell is an exact multiple of one ten-thousandth and lattice
/// construction never accumulates floating-point drift.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridModel {
    size_units: i64,
    step_units: i64,
}

impl GridModel {
    /// Validates the provided half-extent and increment, both in world units.
    pub fn new(grid_size: f64, grid_increment: f64) -> Result<Self, GridError> {
        if !grid_size.is_finite() || grid_size < 0.0 {
            return Err(GridError::InvalidSize(grid_size));
        }
        if !grid_increment.is_finite() {
            return Err(GridError::InvalidIncrement(grid_increment));
        }

        let step_units = to_units(grid_increment);
        if step_units < MIN_STEP_UNITS {
            return Err(GridError::InvalidIncrement(grid_increment));
        }

        let size_units = to_units(grid_size);
        let half = u64::try_from(size_units / step_units).unwrap_or(u64::MAX);
        let cells_per_axis = half.saturating_mul(2).saturating_add(1);
        if cells_per_axis > MAX_CELLS_PER_AXIS {
            return Err(GridError::TooLarge {
                cells_per_axis,
                limit: MAX_CELLS_PER_AXIS,
            });
        }

        Ok(Self {
            size_units,
            step_units,
        })
    }

    /// Builds the grid model described by a session configuration.
    pub fn from_config(config: &GameConfig) -> Result<Self, GridError> {
        Self::new(config.grid_size, config.grid_increment)
    }

    /// Distance between neighbouring cells in coordinate units.
    #[must_use]
    pub const fn step_units(&self) -> i64 {
        self.step_units
    }

    /// Number of cells along each axis, `2 * floor(size / increment) + 1`.
    ///
    /// Never exceeds [`MAX_CELLS_PER_AXIS`], which [`GridModel::new`] enforces.
    #[must_use]
    pub fn cells_per_axis(&self) -> usize {
        let half = self.size_units / self.step_units;
        half.checked_mul(2)
            .and_then(|cells| cells.checked_add(1))
            .and_then(|cells| usize::try_from(cells).ok())
            .unwrap_or(0)
    }

    /// Enumerates every cell, x axis outermost, starting at `-size`.
    ///
    /// The order is part of the contract: level definitions address cells by
    /// their position in this sequence.
    #[must_use]
    pub fn build_lattice(&self) -> Lattice {
        let side = self.cells_per_axis();
        let mut cells = Vec::with_capacity(side * side);
        for row in 0..side {
            let x = self.axis_value(row);
            for column in 0..side {
                cells.push(Coordinate::from_units(x, self.axis_value(column)));
            }
        }
        Lattice {
            side,
            origin_units: -self.size_units,
            step_units: self.step_units,
            cells,
        }
    }

    fn axis_value(&self, index: usize) -> i64 {
        let offset = i64::try_from(index).unwrap_or(i64::MAX);
        -self.size_units + offset.saturating_mul(self.step_units)
    }
}

/// Ordered cells of a square lattice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lattice {
    side: usize,
    origin_units: i64,
    step_units: i64,
    cells: Vec<Coordinate>,
}

impl Lattice {
    /// Number of cells along each axis.
    #[must_use]
    pub const fn side(&self) -> usize {
        self.side
    }

    /// Value of the first cell along both axes, in coordinate units.
    #[must_use]
    pub const fn origin_units(&self) -> i64 {
        self.origin_units
    }

    /// Distance between neighbouring cells in coordinate units.
    #[must_use]
    pub const fn step_units(&self) -> i64 {
        self.step_units
    }

    /// Every cell in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Coordinate] {
        &self.cells
    }

    /// Total number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the lattice holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Resolves a `(row, column)` pair, or `None` when it lies outside the lattice.
    #[must_use]
    pub fn get(&self, index: PathIndex) -> Option<Coordinate> {
        let row = usize::try_from(index.row()).ok()?;
        let column = usize::try_from(index.column()).ok()?;
        if row >= self.side || column >= self.side {
            return None;
        }
        self.cells.get(row * self.side + column).copied()
    }
}
