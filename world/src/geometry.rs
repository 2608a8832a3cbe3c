//! Path and danger cells derived from a level definition.

use std::collections::HashSet;

use carrot_hop_core::{Coordinate, GeometryView, Heading, LevelDefinition, LevelError, Pose};

use crate::grid::Lattice;

/// Geometry of a loaded level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelGeometry {
    facing: Heading,
    spawn: Coordinate,
    goal: Coordinate,
    path: Vec<Coordinate>,
    danger: HashSet<Coordinate>,
    step_units: i64,
}

impl LevelGeometry {
    /// Resolves the path of `definition` and derives its danger cells.
    ///
    /// `level` only labels errors with the catalog position of the definition.
    pub fn load(
        lattice: &Lattice,
        step_units: i64,
        level: usize,
        definition: &LevelDefinition,
    ) -> Result<Self, LevelError> {
        let path = resolve_path(lattice, level, definition)?;
        let (Some(&spawn), Some(&goal)) = (path.first(), path.last()) else {
            return Err(LevelError::EmptyPath { level });
        };
        let danger = compute_danger(lattice, &path);

        Ok(Self {
            facing: definition.facing(),
            spawn,
            goal,
            path,
            danger,
            step_units,
        })
    }

    /// Pose the token occupies before any move executes.
    #[must_use]
    pub const fn spawn_pose(&self) -> Pose {
        Pose {
            position: self.spawn,
            heading: self.facing,
        }
    }

    /// Cell the token must reach.
    #[must_use]
    pub const fn goal(&self) -> Coordinate {
        self.goal
    }

    /// Ordered path cells from spawn to goal.
    #[must_use]
    pub fn path(&self) -> &[Coordinate] {
        &self.path
    }

    /// Lattice cells that are not part of the path.
    #[must_use]
    pub fn danger(&self) -> &HashSet<Coordinate> {
        &self.danger
    }

    /// Borrows the geometry as the view consumed by the execution engine.
    #[must_use]
    pub fn view(&self) -> Option<GeometryView<'_>> {
        GeometryView::new(&self.path, &self.danger, self.facing, self.step_units)
    }
}

/// Looks up every `(row, column)` pair of the level path in the lattice.
pub fn resolve_path(
    lattice: &Lattice,
    level: usize,
    definition: &LevelDefinition,
) -> Result<Vec<Coordinate>, LevelError> {
    if definition.path().is_empty() {
        return Err(LevelError::EmptyPath { level });
    }

    definition
        .path()
        .iter()
        .enumerate()
        .map(|(step, &index)| {
            lattice.get(index).ok_or(LevelError::IndexOutOfRange {
                level,
                step,
                row: index.row(),
                column: index.column(),
                side: lattice.side(),
            })
        })
        .collect()
}

/// Lattice cells that do not appear on `path`.
#[must_use]
pub fn compute_danger(lattice: &Lattice, path: &[Coordinate]) -> HashSet<Coordinate> {
    let on_path: HashSet<Coordinate> = path.iter().copied().collect();
    lattice
        .cells()
        .iter()
        .copied()
        .filter(|cell| !on_path.contains(cell))
        .collect()
}
