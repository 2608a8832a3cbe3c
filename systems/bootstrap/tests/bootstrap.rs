use std::fs;

use carrot_hop_core::{GameConfig, Heading, LevelError, RunPacing, WELCOME_BANNER};
use carrot_hop_system_bootstrap::{load_catalog, load_config, parse_config, Bootstrap, BootstrapError};
use carrot_hop_world::query;
use tempfile::TempDir;

#[test]
fn missing_paths_fall_back_to_builtin_data() {
    let bootstrap = Bootstrap;

    let world = bootstrap.create_world(None, None).expect("defaults are valid");

    assert_eq!(bootstrap.welcome_banner(&world), WELCOME_BANNER);
    assert_eq!(bootstrap.level_title(&world), "Level 1/4: First Hops");
    assert_eq!(query::config(&world), &GameConfig::default());
    assert_eq!(bootstrap.spawn_pose(&world).heading, Heading::North);
}

#[test]
fn partial_config_keeps_remaining_defaults() {
    let config = parse_config("pacing = \"deferred\"\nqueue_capacity = 4\n").expect("parses");

    assert_eq!(config.pacing, RunPacing::Deferred);
    assert_eq!(config.queue_capacity, 4);
    assert_eq!(config.grid_size, GameConfig::default().grid_size);
    assert_eq!(config.step_interval_ms, GameConfig::default().step_interval_ms);
}

#[test]
fn files_on_disk_configure_the_world() {
    let temp = TempDir::new().expect("tempdir");
    let config_path = temp.path().join("config.toml");
    let levels_path = temp.path().join("levels.toml");
    fs::write(&config_path, "queue_capacity = 3\n").expect("write config");
    fs::write(
        &levels_path,
        "[[levels]]\nfacing = \"south\"\npath = [[3, 1], [3, 2]]\n",
    )
    .expect("write levels");

    let world = Bootstrap
        .create_world(Some(&config_path), Some(&levels_path))
        .expect("world builds");

    assert_eq!(query::queue_capacity(&world), 3);
    assert_eq!(query::level_count(&world), 1);
    assert_eq!(Bootstrap.level_title(&world), "Level 1/1");
}

#[test]
fn unreadable_file_reports_its_path() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("absent.toml");

    let error = load_config(Some(&missing)).expect_err("file is missing");

    assert!(matches!(&error, BootstrapError::Io { path, .. } if path == &missing));
    assert!(error.to_string().contains("absent.toml"));
}

#[test]
fn malformed_catalog_is_a_parse_error() {
    let temp = TempDir::new().expect("tempdir");
    let levels_path = temp.path().join("levels.toml");
    fs::write(&levels_path, "[[levels]]\nfacing = \"up\"\npath = []\n").expect("write levels");

    let error = load_catalog(Some(&levels_path)).expect_err("unknown facing");

    assert!(matches!(error, BootstrapError::Parse { .. }));
}

#[test]
fn unplayable_catalog_is_a_level_error() {
    let temp = TempDir::new().expect("tempdir");
    let levels_path = temp.path().join("levels.toml");
    fs::write(&levels_path, "levels = []\n").expect("write levels");

    let error = Bootstrap
        .create_world(None, Some(&levels_path))
        .expect_err("catalog is empty");

    assert!(matches!(error, BootstrapError::Level(LevelError::EmptyCatalog)));
}
