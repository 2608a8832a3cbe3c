#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bootstrap system that prepares a Carrot Hop session.
//!
//! Configuration and the level catalog are read from TOML documents. Either
//! source may be omitted, in which case the built-in defaults apply.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use carrot_hop_core::{GameConfig, LevelCatalog, LevelError, Pose};
use carrot_hop_world::{query, World};
use thiserror::Error;
use tracing::info;

/// Failures raised while preparing a session.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A configuration or catalog file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A configuration or catalog file is not valid TOML for its schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: toml::de::Error,
    },
    /// The catalog describes levels that cannot be played.
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// Parses a session configuration from TOML. Missing keys take their defaults.
pub fn parse_config(source: &str) -> Result<GameConfig, toml::de::Error> {
    toml::from_str(source)
}

/// Parses a level catalog from TOML.
pub fn parse_catalog(source: &str) -> Result<LevelCatalog, toml::de::Error> {
    toml::from_str(source)
}

/// Reads the configuration at `path`, or returns the defaults when absent.
pub fn load_config(path: Option<&Path>) -> Result<GameConfig, BootstrapError> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };

    let config = parse_config(&read(path)?).map_err(|source| BootstrapError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), pacing = ?config.pacing, "configuration loaded");
    Ok(config)
}

/// Reads the level catalog at `path`, or returns the built-in levels when absent.
pub fn load_catalog(path: Option<&Path>) -> Result<LevelCatalog, BootstrapError> {
    let Some(path) = path else {
        return Ok(LevelCatalog::builtin());
    };

    let catalog = parse_catalog(&read(path)?).map_err(|source| BootstrapError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), levels = catalog.len(), "level catalog loaded");
    Ok(catalog)
}

fn read(path: &Path) -> Result<String, BootstrapError> {
    fs::read_to_string(path).map_err(|source| BootstrapError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Produces the session and the data required to greet the player.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Creates a world from the configuration and catalog at the given paths.
    pub fn create_world(
        &self,
        config_path: Option<&Path>,
        levels_path: Option<&Path>,
    ) -> Result<World, BootstrapError> {
        let config = load_config(config_path)?;
        let catalog = load_catalog(levels_path)?;
        Ok(World::new(config, catalog)?)
    }

    /// Derives the banner that should be shown when the game starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Describes the active level as `"Level n/m: name"`.
    #[must_use]
    pub fn level_title(&self, world: &World) -> String {
        let number = query::level_index(world).get() + 1;
        let count = query::level_count(world);
        match query::level_name(world) {
            Some(name) => format!("Level {number}/{count}: {name}"),
            None => format!("Level {number}/{count}"),
        }
    }

    /// Pose the token occupies when the active level starts.
    #[must_use]
    pub fn spawn_pose(&self, world: &World) -> Pose {
        query::spawn_pose(world)
    }
}
