// Checks that the shipped default files stay loadable.

use std::path::Path;

#[test]
fn group_defaults_are_valid_toml() {
    let content = std::fs::read_to_string("defaults/group.toml").expect("defaults/group.toml should exist");
    let parsed: Result<toml::Value, _> = toml::from_str(&content);
    assert!(parsed.is_ok(), "defaults/group.toml is not valid TOML: {:?}", parsed.err());
}

#[test]
fn balance_defaults_are_valid_toml() {
    let content =
        std::fs::read_to_string("defaults/balance.toml").expect("defaults/balance.toml should exist");
    let parsed: Result<toml::Value, _> = toml::from_str(&content);
    assert!(parsed.is_ok(), "defaults/balance.toml is not valid TOML: {:?}", parsed.err());
}

#[test]
fn sample_roster_loads() {
    let roster = squadsplit_app::roster::load_roster(Path::new("data/roster.csv")).unwrap();
    assert_eq!(roster.len(), 10);
}
