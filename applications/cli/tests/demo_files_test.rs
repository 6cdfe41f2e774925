//! The shipped demo catalog and config must stay loadable

use encore_cli::catalog::load_catalog;
use encore_cli::config::CliConfig;
use encore_cli::engine::FAIL_PREFIX;
use std::path::PathBuf;

fn demo(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demo").join(file)
}

#[test]
fn demo_catalog_loads() {
    let tracks = load_catalog(&demo("catalog.json")).unwrap();

    assert_eq!(tracks.len(), 4);
    // One entry exercises the load failure path
    assert!(tracks.iter().any(|t| t.url.starts_with(FAIL_PREFIX)));
}

#[test]
fn demo_config_is_valid() {
    let config = CliConfig::load(Some(&demo("encore.toml"))).unwrap();
    config.validate().unwrap();
    assert_eq!(config.engine.fallback_duration_secs, 20.0);
}
