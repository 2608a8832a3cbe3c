//! Static level data supplied to the session.

use serde::{Deserialize, Serialize};

use crate::Heading;

/// Position of a lattice cell expressed as a `(row, column)` pair.
///
/// Rows follow the x axis and columns the z axis, matching the row-major
/// order the lattice is built in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathIndex(u32, u32);

impl PathIndex {
    /// Creates a new lattice index pair.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self(row, column)
    }

    /// Zero-based row (x axis) of the referenced cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.0
    }

    /// Zero-based column (z axis) of the referenced cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.1
    }
}

/// Authored description of a single level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    #[serde(default)]
    name: Option<String>,
    facing: Heading,
    path: Vec<PathIndex>,
}

impl LevelDefinition {
    /// Creates a level whose token spawns facing `facing` on the first path cell.
    #[must_use]
    pub fn new(facing: Heading, path: Vec<PathIndex>) -> Self {
        Self {
            name: None,
            facing,
            path,
        }
    }

    /// Attaches a display name to the level.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display name of the level, if one was authored.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Heading the token faces when spawned.
    #[must_use]
    pub const fn facing(&self) -> Heading {
        self.facing
    }

    /// Lattice cells from spawn to goal in traversal order.
    #[must_use]
    pub fn path(&self) -> &[PathIndex] {
        &self.path
    }
}

/// Ordered collection of levels played in sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCatalog {
    levels: Vec<LevelDefinition>,
}

impl LevelCatalog {
    /// Creates a catalog from the provided levels.
    #[must_use]
    pub fn new(levels: Vec<LevelDefinition>) -> Self {
        Self { levels }
    }

    /// Levels in play order.
    #[must_use]
    pub fn levels(&self) -> &[LevelDefinition] {
        &self.levels
    }

    /// Number of levels in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Reports whether the catalog holds no levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Levels shipped with the game, authored for the default 7x7 lattice.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            LevelDefinition::new(Heading::North, indices(&[(3, 5), (3, 4), (3, 3), (3, 2)]))
                .with_name("First Hops"),
            LevelDefinition::new(Heading::North, indices(&[(3, 5), (3, 4), (4, 4), (5, 4)]))
                .with_name("Bend in the Stream"),
            LevelDefinition::new(
                Heading::East,
                indices(&[
                    (1, 1),
                    (2, 1),
                    (3, 1),
                    (3, 2),
                    (3, 3),
                    (2, 3),
                    (2, 4),
                    (2, 5),
                ]),
            )
            .with_name("Switchback"),
            LevelDefinition::new(
                Heading::West,
                indices(&[(5, 0), (4, 0), (4, 1), (4, 2), (3, 2), (2, 2), (2, 3)]),
            )
            .with_name("Stepping Stones"),
        ])
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn indices(pairs: &[(u32, u32)]) -> Vec<PathIndex> {
    pairs
        .iter()
        .map(|&(row, column)| PathIndex::new(row, column))
        .collect()
}
